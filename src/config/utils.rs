// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation helpers.

use anyhow::Result;
use log::debug;

use super::Config;

/// Check if a string is a valid IP address
///
/// Validates that a string represents a valid IPv4 or IPv6 address,
/// or is one of the special values like "localhost" or "0.0.0.0".
///
/// # Arguments
///
/// * `addr` - The address string to validate
///
/// # Returns
///
/// `true` if the address is valid, `false` otherwise
pub fn is_valid_ip_address(addr: &str) -> bool {
    if addr.parse::<std::net::IpAddr>().is_ok() {
        return true;
    }

    // Special cases
    matches!(addr, "localhost" | "::" | "::0" | "0.0.0.0")
}

/// Validates the configuration against rules that serde deserialization cannot express.
///
/// # Arguments
///
/// * `config` - The configuration object to validate
///
/// # Returns
///
/// * `Ok(())` if all validations pass
/// * `Err(anyhow::Error)` with descriptive message if any validation fails
///
/// # Validation Rules
///
/// This function validates:
///
/// - **Port Range**: Ensures the visualization port is within a valid range (1-65534)
/// - **IP Address Format**: Checks if the provided address is a valid IP address or special value
/// - **Serial Parameters**: Ensures the baud rate and maximum line length are non-zero,
///   and that an explicitly configured serial port path is not empty
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    // Check value ranges for certain fields
    if config.visualization.port < 1 || config.visualization.port > 65534 {
        anyhow::bail!("Invalid port number: {}", config.visualization.port);
    }

    // Check if the address is in a valid format
    if !is_valid_ip_address(&config.visualization.address) {
        debug!(
            "Potentially invalid address format: {}",
            config.visualization.address
        );
        // Just issue a warning but don't block
    }

    if config.scale.baud_rate == 0 {
        anyhow::bail!("Invalid baud rate: 0");
    }

    if config.scale.max_line_length == 0 {
        anyhow::bail!("Invalid maximum line length: 0");
    }

    // An empty port string would never match a real device; auto-detection
    // is requested by omitting the field entirely
    if let Some(port) = &config.scale.port {
        if port.is_empty() {
            anyhow::bail!("Serial port path must not be empty; omit it for auto-detection");
        }
    }

    Ok(())
}
