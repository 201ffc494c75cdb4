// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Shared scale stream
//!
//! This module provides the single shared data structure between the
//! acquisition session and the publisher adapters. The session writes each
//! parsed reading exactly once; the push adapter subscribes to the broadcast
//! side, the pull adapter reads the retained latest value. Both adapters are
//! read-only observers and never mutate session state.

use crate::parsing::ScaleReading;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{broadcast, RwLock};

/// Lifecycle of a scale session
///
/// `Failed` is terminal within a session; nothing transitions out of it.
/// With the reconnect option enabled a *new* session starts over from
/// `Connecting`, which is the only way the state ever leaves `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No scale located yet; no session has started
    Idle,
    /// A port was selected and is being opened
    Connecting,
    /// The port is open and lines are being consumed
    Listening,
    /// The session ended with a port error and will not recover
    Failed,
}

/// Statistics about the scale stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamStats {
    /// Total number of readings published
    pub total_readings: u64,
    /// Lines refused by the parser (including buffer overflows)
    pub rejected_lines: u64,
    /// Number of active push subscribers
    pub active_subscribers: usize,
    /// Timestamp of the last published reading (milliseconds since epoch)
    pub last_update: u64,
}

impl Default for StreamStats {
    fn default() -> Self {
        Self {
            total_readings: 0,
            rejected_lines: 0,
            active_subscribers: 0,
            last_update: now_ms(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Shared scale stream for broadcasting readings to multiple consumers
#[derive(Clone, Debug)]
pub struct SharedScaleStream {
    /// Broadcast sender for the push side
    sender: broadcast::Sender<ScaleReading>,
    /// Latest reading, retained for the pull side and for late subscribers
    latest_reading: Arc<RwLock<Option<ScaleReading>>>,
    /// Stream statistics
    stats: Arc<RwLock<StreamStats>>,
    /// Current session lifecycle state
    session_state: Arc<RwLock<SessionState>>,
}

impl SharedScaleStream {
    /// Create a new shared stream
    ///
    /// ### Parameters
    /// * `buffer_size` - Size of the broadcast channel buffer
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);

        Self {
            sender,
            latest_reading: Arc::new(RwLock::new(None)),
            stats: Arc::new(RwLock::new(StreamStats::default())),
            session_state: Arc::new(RwLock::new(SessionState::Idle)),
        }
    }

    /// Get a receiver for subscribing to the stream
    pub fn subscribe(&self) -> broadcast::Receiver<ScaleReading> {
        self.sender.subscribe()
    }

    /// Publish a new reading to all subscribers and retain it as latest
    pub async fn publish(&self, reading: ScaleReading) -> Result<()> {
        {
            let mut latest = self.latest_reading.write().await;
            *latest = Some(reading.clone());
        }

        {
            let mut stats = self.stats.write().await;
            stats.total_readings += 1;
            stats.active_subscribers = self.sender.receiver_count();
            stats.last_update = now_ms();
        }

        match self.sender.send(reading) {
            Ok(_) => Ok(()),
            Err(broadcast::error::SendError(_)) => {
                // No active receivers; the pull side still sees the latest
                Ok(())
            }
        }
    }

    /// Count a line the parser refused (or an overflow the codec dropped)
    pub async fn record_rejection(&self) {
        let mut stats = self.stats.write().await;
        stats.rejected_lines += 1;
    }

    /// Get the latest reading, if any line has parsed successfully yet
    pub async fn latest_reading(&self) -> Option<ScaleReading> {
        self.latest_reading.read().await.clone()
    }

    /// Get current stream statistics
    pub async fn get_stats(&self) -> StreamStats {
        self.stats.read().await.clone()
    }

    /// Get the number of active push subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Current session state
    pub async fn session_state(&self) -> SessionState {
        *self.session_state.read().await
    }

    /// Record a session state transition
    pub async fn set_session_state(&self, state: SessionState) {
        let mut current = self.session_state.write().await;
        if *current != state {
            log::debug!("Scale session state: {:?} -> {:?}", *current, state);
            *current = state;
        }
    }
}

/// Consumer interface for reading from the shared stream
pub struct ScaleStreamConsumer {
    receiver: broadcast::Receiver<ScaleReading>,
}

impl ScaleStreamConsumer {
    /// Create a new consumer from a shared stream
    pub fn new(stream: &SharedScaleStream) -> Self {
        Self {
            receiver: stream.subscribe(),
        }
    }

    /// Get the next reading from the stream
    ///
    /// Returns `None` once the stream is closed. A consumer that lags behind
    /// the broadcast buffer skips ahead to the most recent readings; the
    /// acquisition side is never slowed down by a slow subscriber.
    pub async fn next_reading(&mut self) -> Option<ScaleReading> {
        match self.receiver.recv().await {
            Ok(reading) => Some(reading),
            Err(broadcast::error::RecvError::Closed) => None,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!(
                    "Scale stream consumer lagged behind, skipped {} readings",
                    skipped
                );
                match self.receiver.recv().await {
                    Ok(reading) => Some(reading),
                    Err(_) => None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_consumer_and_latest() {
        let stream = SharedScaleStream::new(10);
        let mut consumer = ScaleStreamConsumer::new(&stream);

        assert_eq!(stream.latest_reading().await, None);

        stream
            .publish(ScaleReading::new(2717.5, "g"))
            .await
            .unwrap();

        let received = consumer.next_reading().await.unwrap();
        assert_eq!(received, ScaleReading::new(2717.5, "g"));
        assert_eq!(
            stream.latest_reading().await,
            Some(ScaleReading::new(2717.5, "g"))
        );
    }

    #[tokio::test]
    async fn test_multiple_consumers_see_every_reading() {
        let stream = SharedScaleStream::new(10);
        let mut consumer1 = ScaleStreamConsumer::new(&stream);
        let mut consumer2 = ScaleStreamConsumer::new(&stream);

        stream.publish(ScaleReading::new(100.0, "lb")).await.unwrap();

        assert_eq!(
            consumer1.next_reading().await.unwrap(),
            ScaleReading::new(100.0, "lb")
        );
        assert_eq!(
            consumer2.next_reading().await.unwrap(),
            ScaleReading::new(100.0, "lb")
        );
    }

    #[tokio::test]
    async fn test_latest_reading_is_replaced_wholesale() {
        let stream = SharedScaleStream::new(10);

        stream.publish(ScaleReading::new(13.0, "kg")).await.unwrap();
        stream.publish(ScaleReading::new(14.5, "kg")).await.unwrap();

        assert_eq!(
            stream.latest_reading().await,
            Some(ScaleReading::new(14.5, "kg"))
        );

        let stats = stream.get_stats().await;
        assert_eq!(stats.total_readings, 2);
    }

    #[tokio::test]
    async fn test_rejections_are_counted_without_touching_latest() {
        let stream = SharedScaleStream::new(10);

        stream.record_rejection().await;
        stream.record_rejection().await;

        let stats = stream.get_stats().await;
        assert_eq!(stats.rejected_lines, 2);
        assert_eq!(stats.total_readings, 0);
        assert_eq!(stream.latest_reading().await, None);
    }

    #[tokio::test]
    async fn test_session_state_starts_idle() {
        let stream = SharedScaleStream::new(10);
        assert_eq!(stream.session_state().await, SessionState::Idle);

        stream.set_session_state(SessionState::Connecting).await;
        stream.set_session_state(SessionState::Listening).await;
        assert_eq!(stream.session_state().await, SessionState::Listening);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_not_an_error() {
        let stream = SharedScaleStream::new(10);
        stream.publish(ScaleReading::new(1.0, "g")).await.unwrap();
        assert_eq!(stream.subscriber_count(), 0);
    }
}
