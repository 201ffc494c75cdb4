// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Weighing scale configuration
//!
//! This module defines the structures for configuring the serial link to the
//! weighing scale and the behaviour of the line acquisition session.

use serde::{Deserialize, Serialize};

/// Configuration for the serial weighing scale.
///
/// This structure contains settings that control how the gateway talks to the
/// scale: which serial port to open, the line speed, and how oversized input
/// and dropped connections are handled.
///
/// # Port Selection
///
/// When `port` is set, the gateway opens exactly that device. When it is left
/// out, the gateway scans the available serial ports and picks the first one
/// whose path contains "tty", "COM" or "cu".
///
/// # Example
///
/// ```
/// use rust_scale_gateway::config::ScaleConfig;
///
/// let scale_config = ScaleConfig {
///     port: Some("/dev/ttyUSB0".to_string()),
///     baud_rate: 9600,
///     max_line_length: 512,
///     simulate: false,
///     simulate_interval_ms: 1000,
///     reconnect: false,
///     reconnect_interval_ms: 5000,
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleConfig {
    /// The serial port the scale is attached to (e.g. "/dev/ttyUSB0" or "COM3").
    ///
    /// When omitted, the first available port whose path contains "tty",
    /// "COM" or "cu" is selected automatically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,

    /// The serial line speed in baud.
    ///
    /// The scale ships configured for 9600 baud, 8 data bits, no parity,
    /// one stop bit. Default is 9600.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Maximum accepted line length in bytes, delimiter excluded.
    ///
    /// Input that exceeds this length without a line terminator is discarded
    /// up to the next terminator instead of growing the read buffer without
    /// bound. Default is 512.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    /// Replace the serial port with a simulated scale emitting random readings.
    ///
    /// Useful for development on machines without the hardware attached.
    /// Default is `false`.
    #[serde(default)]
    pub simulate: bool,

    /// Interval in milliseconds between simulated readings.
    #[serde(default = "default_simulate_interval_ms")]
    pub simulate_interval_ms: u64,

    /// Reopen the port and resume listening after a session ends.
    ///
    /// When `false`, a session that fails or reaches end of stream stays down
    /// until the process is restarted. Default is `false`.
    #[serde(default)]
    pub reconnect: bool,

    /// Delay in milliseconds before a reconnection attempt.
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
}

fn default_baud_rate() -> u32 {
    9600 // Factory setting of the scale's serial interface
}

fn default_max_line_length() -> usize {
    512 // A weight report is a few dozen bytes at most
}

fn default_simulate_interval_ms() -> u64 {
    1000 // One simulated reading per second
}

fn default_reconnect_interval_ms() -> u64 {
    5000 // Wait 5 seconds between reconnection attempts
}

// implement Default for ScaleConfig
impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            port: None, // Auto-detect the first serial port
            baud_rate: default_baud_rate(), // 9600 8N1
            max_line_length: default_max_line_length(),
            simulate: false, // Real hardware by default
            simulate_interval_ms: default_simulate_interval_ms(),
            reconnect: false, // A failed session stays failed
            reconnect_interval_ms: default_reconnect_interval_ms(),
        }
    }
}
