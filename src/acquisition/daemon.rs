// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Acquisition daemon module
//!
//! This module provides the daemon that runs one scale session: it consumes
//! line events from a [`ScaleSource`], feeds them through the
//! [`ReadingParser`], and publishes every successful reading to the shared
//! stream. Processing is strictly sequential, one line at a time, driven by
//! the source (no polling).
//!
//! A port error or a closed stream ends the session and leaves it in the
//! terminal [`SessionState::Failed`] state; the last published reading stays
//! retained on the stream. The daemon itself never retries.

use crate::acquisition::{LineEvent, ScaleSource, SessionState, SharedScaleStream};
use crate::parsing::ReadingParser;
use anyhow::Result;
use log::{debug, error, info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Acquisition daemon that reads one scale session to completion
pub struct AcquisitionDaemon {
    /// Line source (serial port or simulator)
    source: Box<dyn ScaleSource>,
    /// The device's line grammar
    parser: ReadingParser,
    /// Shared stream both publisher adapters observe
    stream: SharedScaleStream,
    /// Flag to control daemon execution
    running: Arc<AtomicBool>,
}

impl AcquisitionDaemon {
    /// Create a new acquisition daemon
    ///
    /// ### Parameters
    /// * `source` - The scale source to read from
    /// * `stream` - Shared stream to publish readings into; owned by the
    ///   caller so readings survive the session
    pub fn new(source: Box<dyn ScaleSource>, stream: SharedScaleStream) -> Self {
        Self {
            source,
            parser: ReadingParser::new(),
            stream,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a reference to the shared stream for consumers
    pub fn get_stream(&self) -> &SharedScaleStream {
        &self.stream
    }

    /// Run the session until the stream closes, the port errors, or
    /// [`stop`](Self::stop) is called
    pub async fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::Relaxed) {
            warn!("Scale session is already running");
            return Ok(());
        }

        self.running.store(true, Ordering::Relaxed);
        info!("Listening to scale on {}", self.source.description());
        self.stream.set_session_state(SessionState::Listening).await;

        while self.running.load(Ordering::Relaxed) {
            match self.source.next_line().await {
                Ok(Some(LineEvent::Line(line))) => {
                    self.handle_line(&line).await;
                }
                Ok(Some(LineEvent::Overflow { dropped })) => {
                    warn!(
                        "Dropped over-length scale line ({} bytes buffered without a delimiter)",
                        dropped
                    );
                    self.stream.record_rejection().await;
                }
                Ok(None) => {
                    info!("Scale stream closed");
                    self.stream.set_session_state(SessionState::Failed).await;
                    break;
                }
                Err(e) => {
                    // Errors are session-local; the last reading stays served
                    error!("Scale port error: {}", e);
                    self.stream.set_session_state(SessionState::Failed).await;
                    break;
                }
            }
        }

        self.running.store(false, Ordering::Relaxed);
        info!("Scale session ended");
        Ok(())
    }

    /// Stop the session
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        info!("Stopping scale session");
    }

    /// Check if the session is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Parse one line and publish or reject it
    async fn handle_line(&self, line: &str) {
        debug!("Received scale line: {:?}", line);

        match self.parser.parse(line) {
            Ok(reading) => {
                debug!("Parsed reading: {} {}", reading.weight, reading.unit);
                if let Err(e) = self.stream.publish(reading).await {
                    error!("Failed to publish reading: {}", e);
                }
            }
            Err(rejection) => {
                warn!("Ignoring scale line {:?}: {}", line, rejection);
                self.stream.record_rejection().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::ScaleStreamConsumer;
    use crate::parsing::ScaleReading;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::io;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    /// Replays a fixed script of events, then reports the stream as closed
    struct ScriptedSource {
        events: VecDeque<Result<Option<LineEvent>>>,
    }

    impl ScriptedSource {
        fn new(events: Vec<Result<Option<LineEvent>>>) -> Self {
            Self {
                events: events.into(),
            }
        }

        fn lines(lines: &[&str]) -> Self {
            Self::new(
                lines
                    .iter()
                    .map(|line| Ok(Some(LineEvent::Line(line.to_string()))))
                    .collect(),
            )
        }
    }

    #[async_trait]
    impl ScaleSource for ScriptedSource {
        async fn next_line(&mut self) -> Result<Option<LineEvent>> {
            // Yield so consumers keep up with the script
            sleep(Duration::from_millis(1)).await;
            self.events.pop_front().unwrap_or(Ok(None))
        }

        fn description(&self) -> String {
            "scripted".to_string()
        }
    }

    /// Emits the same line forever
    struct EndlessSource;

    #[async_trait]
    impl ScaleSource for EndlessSource {
        async fn next_line(&mut self) -> Result<Option<LineEvent>> {
            sleep(Duration::from_millis(5)).await;
            Ok(Some(LineEvent::Line("1 g".to_string())))
        }

        fn description(&self) -> String {
            "endless".to_string()
        }
    }

    #[tokio::test]
    async fn test_daemon_publishes_parsed_readings_and_skips_garbage() {
        let stream = SharedScaleStream::new(10);
        let source = ScriptedSource::lines(&["2717.5 g", "garbage###", "enter. 100 lb"]);
        let mut daemon = AcquisitionDaemon::new(Box::new(source), stream.clone());
        let mut consumer = ScaleStreamConsumer::new(&stream);

        let handle = tokio::spawn(async move { daemon.start().await });

        let first = timeout(Duration::from_secs(2), consumer.next_reading())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, ScaleReading::new(2717.5, "g"));

        let second = timeout(Duration::from_secs(2), consumer.next_reading())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second, ScaleReading::new(100.0, "lb"));

        handle.await.unwrap().unwrap();

        let stats = stream.get_stats().await;
        assert_eq!(stats.total_readings, 2);
        assert_eq!(stats.rejected_lines, 1);
    }

    #[tokio::test]
    async fn test_port_error_is_terminal_and_last_reading_is_retained() {
        let stream = SharedScaleStream::new(10);
        let source = ScriptedSource::new(vec![
            Ok(Some(LineEvent::Line("13 kg".to_string()))),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged").into()),
        ]);
        let mut daemon = AcquisitionDaemon::new(Box::new(source), stream.clone());

        daemon.start().await.unwrap();

        assert_eq!(stream.session_state().await, SessionState::Failed);
        assert_eq!(
            stream.latest_reading().await,
            Some(ScaleReading::new(13.0, "kg"))
        );
    }

    #[tokio::test]
    async fn test_closed_stream_ends_the_session() {
        let stream = SharedScaleStream::new(10);
        let source = ScriptedSource::lines(&[]);
        let mut daemon = AcquisitionDaemon::new(Box::new(source), stream.clone());

        daemon.start().await.unwrap();

        assert_eq!(stream.session_state().await, SessionState::Failed);
        assert_eq!(stream.latest_reading().await, None);
        assert!(!daemon.is_running());
    }

    #[tokio::test]
    async fn test_overflow_event_counts_as_rejection() {
        let stream = SharedScaleStream::new(10);
        let source = ScriptedSource::new(vec![
            Ok(Some(LineEvent::Overflow { dropped: 600 })),
            Ok(Some(LineEvent::Line("5 g".to_string()))),
        ]);
        let mut daemon = AcquisitionDaemon::new(Box::new(source), stream.clone());

        daemon.start().await.unwrap();

        let stats = stream.get_stats().await;
        assert_eq!(stats.rejected_lines, 1);
        assert_eq!(
            stream.latest_reading().await,
            Some(ScaleReading::new(5.0, "g"))
        );
    }

    #[tokio::test]
    async fn test_stop_ends_an_endless_session() {
        let stream = SharedScaleStream::new(10);
        let mut daemon = AcquisitionDaemon::new(Box::new(EndlessSource), stream.clone());
        let running = daemon.running.clone();
        let mut consumer = ScaleStreamConsumer::new(&stream);

        let handle = tokio::spawn(async move { daemon.start().await });

        // Wait for at least one reading, then ask the session to stop
        timeout(Duration::from_secs(2), consumer.next_reading())
            .await
            .unwrap()
            .unwrap();
        running.store(false, Ordering::Relaxed);

        timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
