// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Serial port discovery
//!
//! The scale announces itself on no protocol level, so discovery is a path
//! heuristic: the first enumerated port whose path contains one of the
//! markers `"tty"`, `"COM"`, or `"cu"` is presumed to be the scale. The
//! match is case-sensitive and first-match-wins. [`PortLocator`] is a
//! strategy trait, so a configured fixed path can replace the heuristic
//! without touching the rest of the pipeline.

use anyhow::{Context, Result};
use tokio_serial::{available_ports, SerialPortInfo, SerialPortType};

/// Path substrings that mark a plausible scale port (case-sensitive)
const PORT_PATH_MARKERS: [&str; 3] = ["tty", "COM", "cu"];

/// One enumerated serial port
///
/// Produced fresh on every discovery call, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PortDescriptor {
    /// OS path of the port, for example `/dev/ttyUSB0` or `COM3`
    pub path: String,
    /// Human-readable port kind reported by the driver layer
    pub kind: String,
}

impl PortDescriptor {
    /// Create a descriptor from a path and a kind label
    pub fn new(path: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
        }
    }

    fn from_info(info: SerialPortInfo) -> Self {
        let kind = describe_port_type(&info.port_type);
        Self {
            path: info.port_name,
            kind,
        }
    }

    /// Whether the path looks like a device the scale could sit on
    pub fn matches_heuristic(&self) -> bool {
        PORT_PATH_MARKERS
            .iter()
            .any(|marker| self.path.contains(marker))
    }
}

fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let label = usb
                .product
                .as_deref()
                .or(usb.manufacturer.as_deref())
                .unwrap_or("device");
            format!("USB {} ({:04x}:{:04x})", label, usb.vid, usb.pid)
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "Unknown".to_string(),
    }
}

/// Strategy for finding the scale's serial port
#[cfg_attr(test, mockall::automock)]
pub trait PortLocator: Send + Sync {
    /// Enumerate every serial port visible to the OS; may be empty
    fn list_candidate_ports(&self) -> Result<Vec<PortDescriptor>>;

    /// Pick the port presumed to be the scale, or `None` when nothing fits
    fn select(&self, candidates: &[PortDescriptor]) -> Option<PortDescriptor>;

    /// Enumerate and select in one call
    fn locate(&self) -> Result<Option<PortDescriptor>> {
        let candidates = self.list_candidate_ports()?;
        Ok(self.select(&candidates))
    }
}

/// Selects the first enumerated port whose path contains a known marker
#[derive(Debug, Clone, Default)]
pub struct HeuristicPortLocator;

impl PortLocator for HeuristicPortLocator {
    fn list_candidate_ports(&self) -> Result<Vec<PortDescriptor>> {
        let ports = available_ports().context("Failed to enumerate serial ports")?;
        Ok(ports.into_iter().map(PortDescriptor::from_info).collect())
    }

    fn select(&self, candidates: &[PortDescriptor]) -> Option<PortDescriptor> {
        candidates
            .iter()
            .find(|descriptor| descriptor.matches_heuristic())
            .cloned()
    }
}

/// Always selects a fixed, explicitly configured path
#[derive(Debug, Clone)]
pub struct FixedPortLocator {
    path: String,
}

impl FixedPortLocator {
    /// Create a locator pinned to `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl PortLocator for FixedPortLocator {
    fn list_candidate_ports(&self) -> Result<Vec<PortDescriptor>> {
        Ok(vec![PortDescriptor::new(self.path.clone(), "Configured")])
    }

    fn select(&self, candidates: &[PortDescriptor]) -> Option<PortDescriptor> {
        candidates.first().cloned()
    }
}
