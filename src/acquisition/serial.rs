// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Serial scale source
//!
//! Opens the scale's serial port (9600 8N1 by default, no flow control) and
//! exposes the framed line stream. The protocol is read-only: nothing is
//! ever written to the device.

use crate::acquisition::codec::{LineCodec, LineEvent};
use crate::acquisition::ScaleSource;
use crate::config::ScaleConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use log::info;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tokio_util::codec::{Decoder, Framed};

/// A scale attached to a serial port
pub struct SerialScaleSource {
    path: String,
    framed: Framed<SerialStream, LineCodec>,
}

impl SerialScaleSource {
    /// Open the port at `path` with the configured wire parameters
    pub fn open(path: &str, config: &ScaleConfig) -> Result<Self> {
        let stream = tokio_serial::new(path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .open_native_async()
            .with_context(|| format!("Failed to open serial port {}", path))?;

        info!("Connected to scale on {} at {} baud", path, config.baud_rate);

        Ok(Self {
            path: path.to_string(),
            framed: LineCodec::new(config.max_line_length).framed(stream),
        })
    }
}

#[async_trait]
impl ScaleSource for SerialScaleSource {
    async fn next_line(&mut self) -> Result<Option<LineEvent>> {
        match self.framed.next().await {
            Some(Ok(event)) => Ok(Some(event)),
            Some(Err(e)) => Err(e).context("Serial port read failed"),
            None => Ok(None),
        }
    }

    fn description(&self) -> String {
        self.path.clone()
    }
}
