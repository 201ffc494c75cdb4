// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the scale gateway
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings for the scale gateway. The configuration is backed
//! by a YAML file with defaults for every field, so a missing file or an empty
//! section still yields a working setup.
//!
//! ## Configuration Structure
//!
//! The application's configuration is organized as a nested structure with sections:
//! - `scale`: Settings for the serial link to the weighing scale
//! - `acquisition`: Settings for the data acquisition process
//! - `visualization`: Settings for the visualization web server
//!
//! ## Usage
//!
//! ```no_run
//! use rust_scale_gateway::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some(8081),                       // Web port
//!     Some("0.0.0.0".to_string()),      // Web address
//!     Some("/dev/ttyUSB1".to_string()), // Serial port
//!     Some(19200),                      // Baud rate
//!     false,                            // Simulate
//! );
//!
//! // Access configuration values
//! println!("Server port: {}", config.visualization.port);
//! ```

pub mod acquisition;
pub mod scale;
pub mod utils;
pub mod visualization;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

// Re-export all types for public API
pub use acquisition::AcquisitionConfig;
pub use scale::ScaleConfig;
pub use utils::is_valid_ip_address;
pub use visualization::VisualizationConfig;

/// Root configuration structure for the scale gateway.
///
/// This structure serves as the main container for all configuration sections
/// of the application.
///
/// # Structure
///
/// The configuration is designed to be deserialized from and serialized to YAML
/// using the serde framework.
///
/// # Default Values
///
/// Each section uses default values when not explicitly specified in the
/// configuration file, allowing for minimal configuration when custom settings
/// are not required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Settings for the serial link to the weighing scale.
    ///
    /// These settings control which serial port is opened, at what speed,
    /// and how the acquisition session behaves when the link drops.
    /// If not specified in the configuration file, default values are used.
    #[serde(default)]
    pub scale: ScaleConfig,

    /// Acquisition settings for the scale gateway.
    ///
    /// This section controls whether the data acquisition process runs at all.
    /// If not specified, default values will be used.
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Settings for the visualization web server component.
    ///
    /// These settings control how the visualization server behaves, including
    /// network binding and the advertised server name.
    /// If not specified, default values will be used.
    #[serde(default)]
    pub visualization: VisualizationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scale: ScaleConfig::default(),
            acquisition: AcquisitionConfig::default(),
            visualization: VisualizationConfig::default(),
        }
    }
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        debug!("Creating sample configuration file at {:?}", path);
        let sample_path = path.with_extension("sample.yaml");

        // Create parent directories if they don't exist
        if let Some(parent) = sample_path.parent() {
            if !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                std::fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        let sample_config = Self::default();
        sample_config
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        let config: Config = match serde_yml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                // Generate a sample config file with the default values
                // for the user to edit
                match Self::create_sample_config(path) {
                    Ok(_) => debug!("Successfully created sample config"),
                    Err(e) => error!("Failed to create sample config: {}", e),
                }

                // Return the original error enhanced with context
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        // Perform additional specific validations
        if let Err(err) = utils::validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// This method allows configuration values to be overridden with command line
    /// arguments. Only values that are explicitly provided will override the
    /// existing configuration.
    ///
    /// # Parameters
    ///
    /// * `web_port` - TCP port for the visualization server
    /// * `web_address` - Network address for the visualization server to bind to
    /// * `serial_port` - Serial port the scale is attached to
    /// * `baud_rate` - Serial line speed in baud
    /// * `simulate` - If true, replaces the serial port with a simulated scale
    ///
    /// # Example
    ///
    /// ```rust
    /// use rust_scale_gateway::config::Config;
    /// let mut config = Config::default();
    /// config.apply_args(
    ///     Some(8081),                       // Web port
    ///     Some("0.0.0.0".to_string()),      // Web address
    ///     Some("/dev/ttyUSB1".to_string()), // Serial port
    ///     Some(19200),                      // Baud rate
    ///     false,                            // Simulate
    /// );
    /// assert_eq!(config.visualization.port, 8081);
    /// ```
    pub fn apply_args(
        &mut self,
        web_port: Option<u16>,
        web_address: Option<String>,
        serial_port: Option<String>,
        baud_rate: Option<u32>,
        simulate: bool,
    ) {
        // Only override if command-line arguments are provided
        if let Some(web_port) = web_port {
            debug!("Overriding port from command line: {}", web_port);
            self.visualization.port = web_port;
        }

        if let Some(web_address) = web_address {
            debug!("Overriding address from command line: {}", web_address);
            self.visualization.address = web_address;
        }

        // Apply scale settings
        if let Some(port) = serial_port {
            debug!("Overriding serial port from command line: {}", port);
            self.scale.port = Some(port);
        }
        if let Some(baud_rate) = baud_rate {
            debug!("Overriding baud rate from command line: {}", baud_rate);
            self.scale.baud_rate = baud_rate;
        }

        // Force the simulated source when requested
        if simulate {
            debug!("Enabling simulated scale source from command line");
            self.scale.simulate = true;
        }
    }
}
