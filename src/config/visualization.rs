// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Visualization web server configuration
//!
//! This module defines the structures for configuring the web server that
//! exposes the most recent scale reading.

use serde::{Deserialize, Serialize};

/// Configuration for the visualization web server.
///
/// This structure contains all settings required for the web server component,
/// including network binding parameters and the advertised server name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationConfig {
    /// The TCP port the visualization server will listen on.
    ///
    /// Valid range is 1-65534. Default value is 5000.
    #[serde(default = "default_port")]
    pub port: u16,

    /// The network address the server will bind to.
    ///
    /// Can be an IPv4/IPv6 address or a hostname. Default is "127.0.0.1".
    /// Use "0.0.0.0" to bind to all IPv4 interfaces.
    #[serde(default = "default_address")]
    pub address: String,

    /// The server name reported in HTTP headers and logs.
    ///
    /// Default is "ScaleGatewayApiServer/" followed by the package version.
    #[serde(default = "default_name")]
    pub name: String,

    /// Enable or disable the visualization server.
    ///
    /// This flag can be used to easily enable or disable the server
    /// without removing the configuration. Default is `true`.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Provides the default TCP port (5000) for the visualization server.
fn default_port() -> u16 {
    5000
}

/// Provides the default network binding address (127.0.0.1) for the visualization server.
///
/// This loopback address ensures the server only accepts connections from the local
/// machine. For deployments where remote clients poll the gateway, this should be
/// changed to "0.0.0.0" or a specific network interface.
fn default_address() -> String {
    "127.0.0.1".to_string()
}

/// Generates the default server name string based on the current package version.
///
/// The server name is included in HTTP headers and used in logs to identify
/// this specific instance of the visualization server.
fn default_name() -> String {
    format!("ScaleGatewayApiServer/{}", env!("CARGO_PKG_VERSION"))
}

/// Provides the default enabled state for the visualization server.
fn default_enabled() -> bool {
    true
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            address: default_address(),
            name: default_name(),
            enabled: default_enabled(),
        }
    }
}
