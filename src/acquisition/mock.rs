// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated scale source
//!
//! Generates plausible scale output for development without hardware and for
//! end-to-end tests: a slowly drifting weight in grams, emitted on a fixed
//! interval, occasionally prefixed with the `enter.` noise token real
//! devices produce.

use crate::acquisition::codec::LineEvent;
use crate::acquisition::ScaleSource;
use crate::config::ScaleConfig;
use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use rand::{Rng, RngExt};
use std::time::Duration;
use tokio::time::sleep;

/// Mock scale that emits synthetic readings on an interval
pub struct SimulatedScaleSource {
    interval: Duration,
    weight: f64,
}

impl SimulatedScaleSource {
    /// Create a simulator paced by `config.simulate_interval_ms`
    pub fn new(config: &ScaleConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.simulate_interval_ms),
            weight: 2717.5,
        }
    }

    /// Produce the next line of synthetic device output
    fn next_line_text(&mut self) -> String {
        let mut rng = rand::rng();
        self.weight = (self.weight + rng.random_range(-0.5..0.5)).max(0.0);
        let text = format!("{:.1} g", self.weight);
        if rng.random_bool(0.2) {
            format!("enter. {}", text)
        } else {
            text
        }
    }
}

#[async_trait]
impl ScaleSource for SimulatedScaleSource {
    async fn next_line(&mut self) -> Result<Option<LineEvent>> {
        sleep(self.interval).await;
        let line = self.next_line_text();
        debug!("Simulated scale line: {:?}", line);
        Ok(Some(LineEvent::Line(line)))
    }

    fn description(&self) -> String {
        "simulated scale".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::ReadingParser;

    fn fast_config() -> ScaleConfig {
        ScaleConfig {
            simulate: true,
            simulate_interval_ms: 1,
            ..ScaleConfig::default()
        }
    }

    #[tokio::test]
    async fn test_simulated_lines_always_parse() {
        let mut source = SimulatedScaleSource::new(&fast_config());
        let parser = ReadingParser::new();

        for _ in 0..20 {
            let event = source.next_line().await.unwrap().unwrap();
            let LineEvent::Line(line) = event else {
                panic!("simulator only emits lines");
            };
            let reading = parser.parse(&line).unwrap();
            assert_eq!(reading.unit, "g");
            assert!(reading.weight >= 0.0);
        }
    }

    #[test]
    fn test_weight_never_goes_negative() {
        let mut source = SimulatedScaleSource::new(&fast_config());
        source.weight = 0.1;
        for _ in 0..100 {
            source.next_line_text();
            assert!(source.weight >= 0.0);
        }
    }
}
