// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Scale line parsing module
//!
//! This module normalizes the semi-structured ASCII lines emitted by the scale
//! into structured readings. The device output is noisy: readings arrive with
//! garbage characters, inconsistent spacing, and a known `enter.` noise token
//! that the firmware prepends before some measurements. The parser tolerates
//! all of that while requiring the final shape to be strictly
//! `<weight><optional space><unit>`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A normalized weight measurement from the scale
///
/// Immutable once constructed; the acquisition pipeline replaces the shared
/// reading wholesale instead of mutating it in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScaleReading {
    /// Measured weight as reported by the device
    pub weight: f64,
    /// Measurement unit, lowercase alphabetic (for example "g", "kg", "lb")
    pub unit: String,
}

impl ScaleReading {
    /// Create a new reading
    pub fn new(weight: f64, unit: impl Into<String>) -> Self {
        Self {
            weight,
            unit: unit.into(),
        }
    }
}

/// Reasons a raw line is refused by the parser
///
/// Rejections are logged and counted but never abort the session; the
/// pipeline moves on to the next line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseRejection {
    /// Nothing left of the line after cleaning
    #[error("line is empty after cleaning")]
    EmptyLine,
    /// The cleaned line does not look like `<weight> <unit>`
    #[error("line does not match the expected '<weight> <unit>' shape: {0:?}")]
    ShapeMismatch(String),
    /// The weight field matched the digit class but is not a valid number
    #[error("weight is not a valid number: {0:?}")]
    InvalidWeight(String),
}

/// Normalizes raw device lines into [`ScaleReading`]s
///
/// The transformation pipeline is order-sensitive:
///
/// 1. Strip every character that is not a digit, letter, comma, period, or
///    whitespace.
/// 2. Trim leading/trailing whitespace.
/// 3. Remove a leading case-insensitive `enter.` or `nter.` noise token plus
///    any whitespace after it, then trim again.
/// 4. Collapse each run of whitespace into a single space.
/// 5. Match against `^([0-9.]+)\s*([a-zA-Z]+)$`; the first group parses as an
///    `f64` weight, the second lowercases into the unit.
///
/// `parse` is total: every input yields either a reading or an explicit
/// [`ParseRejection`], never a panic.
pub struct ReadingParser {
    garbage: Regex,
    noise_prefix: Regex,
    whitespace: Regex,
    reading: Regex,
}

impl ReadingParser {
    /// Create a parser with the device's line grammar compiled
    pub fn new() -> Self {
        Self {
            garbage: Regex::new(r"[^0-9.,a-zA-Z\s]").expect("Invalid regex pattern"),
            noise_prefix: Regex::new(r"(?i)^(enter\.|nter\.)\s*").expect("Invalid regex pattern"),
            whitespace: Regex::new(r"\s+").expect("Invalid regex pattern"),
            reading: Regex::new(r"^([0-9.]+)\s*([a-zA-Z]+)$").expect("Invalid regex pattern"),
        }
    }

    /// Parse one raw line into a reading
    pub fn parse(&self, raw_line: &str) -> Result<ScaleReading, ParseRejection> {
        let cleaned = self.clean(raw_line);
        if cleaned.is_empty() {
            return Err(ParseRejection::EmptyLine);
        }

        let captures = self
            .reading
            .captures(&cleaned)
            .ok_or_else(|| ParseRejection::ShapeMismatch(cleaned.clone()))?;

        // The digit class admits strings like "1.2.3" that are not numbers;
        // a failed float parse is a rejection, not a fault.
        let weight_text = &captures[1];
        let weight: f64 = weight_text
            .parse()
            .map_err(|_| ParseRejection::InvalidWeight(weight_text.to_string()))?;
        let unit = captures[2].to_lowercase();

        Ok(ScaleReading { weight, unit })
    }

    /// Run the cleaning stages (everything before the shape match)
    pub fn clean(&self, raw: &str) -> String {
        let stripped = self.garbage.replace_all(raw, "");
        let trimmed = stripped.trim();
        let no_prefix = self.noise_prefix.replace(trimmed, "");
        let no_prefix = no_prefix.trim();
        self.whitespace.replace_all(no_prefix, " ").into_owned()
    }
}

impl Default for ReadingParser {
    fn default() -> Self {
        Self::new()
    }
}
