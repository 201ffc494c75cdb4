// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Scale acquisition module
//!
//! This module handles the acquisition of weight readings from a
//! serial-attached scale: port discovery, line framing, and the session
//! daemon that feeds parsed readings into the shared stream.

use anyhow::Result;
use async_trait::async_trait;

pub mod codec;
pub mod daemon;
mod mock;
pub mod port_locator;
mod serial;
pub mod stream;

pub use codec::{LineCodec, LineEvent};
pub use daemon::AcquisitionDaemon;
pub use mock::SimulatedScaleSource;
pub use port_locator::{FixedPortLocator, HeuristicPortLocator, PortDescriptor, PortLocator};
pub use serial::SerialScaleSource;
pub use stream::{ScaleStreamConsumer, SessionState, SharedScaleStream, StreamStats};

use crate::config::ScaleConfig;

/// Represents a source of line events from a scale (serial port or simulator)
#[async_trait]
pub trait ScaleSource: Send + Sync {
    /// Read the next line event from the device
    /// Returns `None` once the underlying stream has closed
    async fn next_line(&mut self) -> Result<Option<LineEvent>>;

    /// Human-readable label of the device behind this source
    fn description(&self) -> String;
}

/// Get a scale source reading from a specific serial port path
pub fn get_scale_source_from_port(path: &str, config: &ScaleConfig) -> Result<Box<dyn ScaleSource>> {
    Ok(Box::new(SerialScaleSource::open(path, config)?))
}

/// Get a simulated scale source that generates synthetic readings
pub fn get_simulated_scale_source(config: &ScaleConfig) -> Box<dyn ScaleSource> {
    Box::new(SimulatedScaleSource::new(config))
}

/// Get the locator strategy for the configuration: a configured port path
/// pins the locator to that path, otherwise the path heuristic scans the
/// enumeration
pub fn get_port_locator(config: &ScaleConfig) -> Box<dyn PortLocator> {
    match &config.port {
        Some(path) => Box::new(FixedPortLocator::new(path.clone())),
        None => Box::new(HeuristicPortLocator),
    }
}
