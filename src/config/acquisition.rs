// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Data acquisition configuration
//!
//! This module defines the structures for configuring the data acquisition
//! process in the scale gateway.

use serde::{Deserialize, Serialize};

/// Configuration for the data acquisition process.
///
/// This structure contains settings that control whether readings are
/// acquired from the scale at all.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AcquisitionConfig {
    /// Flag to enable or disable data acquisition.
    ///
    /// When enabled, the daemon opens the scale source and republishes every
    /// parsed reading. When disabled, the web server still runs but reports
    /// that no data has been received until the process is restarted with
    /// acquisition turned back on.
    pub enabled: bool,
}

// implement Default for AcquisitionConfig
impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
