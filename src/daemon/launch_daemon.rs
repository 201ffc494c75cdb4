//! # Daemon Management Module
//!
//! This module provides functionality for running and managing background
//! tasks in the scale gateway. It handles the lifecycle of:
//!
//! - The web server exposing the most recent reading
//! - The scale acquisition session
//! - System health monitoring (heartbeat)
//!
//! Each service runs as an independent Tokio task; the `Daemon` structure
//! tracks and coordinates these tasks so they can be shut down together.

use anyhow::Result;
use log::{debug, error, info};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;

use crate::acquisition::{
    get_port_locator, get_scale_source_from_port, get_simulated_scale_source, AcquisitionDaemon,
    PortLocator, ScaleSource, SessionState, SharedScaleStream,
};
use crate::config::{Config, ScaleConfig};
use crate::visualization::server::build_rocket;
use rocket::{
    config::LogLevel,
    data::{Limits, ToByteUnit},
};

/// Broadcast capacity of the reading stream; readings are a few bytes each
const READING_BUFFER_SIZE: usize = 128;

/// Represents a daemon that owns and manages the gateway's background tasks.
///
/// The `scale_stream` is created up front and outlives individual acquisition
/// sessions, so the web server keeps answering with the last known reading
/// while a session reconnects, and reports "no data yet" when acquisition is
/// disabled entirely.
pub struct Daemon {
    tasks: Vec<JoinHandle<Result<()>>>,
    running: Arc<AtomicBool>,
    scale_stream: Arc<SharedScaleStream>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    /// Create a new daemon instance
    ///
    /// Initializes a new daemon manager with an empty task list, the running
    /// flag set to `true`, and a fresh reading stream.
    pub fn new() -> Self {
        Daemon {
            tasks: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            scale_stream: Arc::new(SharedScaleStream::new(READING_BUFFER_SIZE)),
        }
    }

    /// Launch all configured tasks based on configuration
    pub async fn launch(&mut self, config: &Config) -> Result<()> {
        // Start web server if enabled
        if config.visualization.enabled {
            self.start_visualization_server(config).await?;
        }

        // Start the scale acquisition session
        self.start_scale_acquisition(config)?;

        // Start heartbeat task for monitoring
        self.start_heartbeat()?;

        Ok(())
    }

    /// Get a reference to the shared reading stream
    ///
    /// This is the stream the acquisition session publishes into and the web
    /// server reads from.
    pub fn get_scale_stream(&self) -> Arc<SharedScaleStream> {
        self.scale_stream.clone()
    }

    /// Start the Rocket web server
    async fn start_visualization_server(&mut self, config: &Config) -> Result<()> {
        info!(
            "Starting web server on {}:{}",
            config.visualization.address, config.visualization.port
        );

        let figment = rocket::Config::figment()
            .merge(("ident", config.visualization.name.clone()))
            .merge(("limits", Limits::new().limit("json", 2.mebibytes())))
            .merge(("address", config.visualization.address.clone()))
            .merge(("port", config.visualization.port))
            .merge(("log_level", LogLevel::Normal));

        let rocket = build_rocket(figment, self.scale_stream.clone()).await;

        let task = tokio::spawn(async move {
            let ignited = rocket.ignite().await?;
            ignited.launch().await?;
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Start the scale acquisition task
    ///
    /// Spawns a background task that runs one acquisition session from source
    /// selection to session end. When reconnection is enabled in the
    /// configuration, the task sleeps for the configured interval after each
    /// session and then starts over, including port discovery.
    fn start_scale_acquisition(&mut self, config: &Config) -> Result<()> {
        // Early return when acquisition is disabled in configuration; the web
        // server then keeps reporting that no data has been received
        if !config.acquisition.enabled {
            info!("Scale acquisition is disabled in configuration");
            return Ok(());
        }

        info!("Starting scale acquisition system");

        let scale_config = config.scale.clone();
        let stream = self.scale_stream.clone();
        let running = self.running.clone();

        let task = tokio::spawn(async move {
            loop {
                run_scale_session(&scale_config, &stream, get_port_locator(&scale_config)).await;

                if !running.load(Ordering::SeqCst) || !scale_config.reconnect {
                    break;
                }

                info!(
                    "Restarting scale session in {} ms",
                    scale_config.reconnect_interval_ms
                );
                time::sleep(Duration::from_millis(scale_config.reconnect_interval_ms)).await;
            }

            info!("Scale acquisition task stopped");
            Ok(())
        });

        self.tasks.push(task);
        info!("Scale acquisition daemon started successfully");
        Ok(())
    }

    /// Start a heartbeat task that logs stream statistics periodically
    fn start_heartbeat(&mut self) -> Result<()> {
        debug!("Starting heartbeat monitor");

        let running = self.running.clone();
        let stream = self.scale_stream.clone();
        let task = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                let stats = stream.get_stats().await;
                debug!(
                    "Daemon heartbeat: {} readings published, {} lines rejected, {} subscribers",
                    stats.total_readings, stats.rejected_lines, stats.active_subscribers
                );
                time::sleep(Duration::from_secs(60)).await;
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Stop all running tasks
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.running.store(false, Ordering::SeqCst);
        // Tasks should check the running flag and terminate gracefully
    }

    /// Wait for all tasks to complete
    ///
    /// Consumes the daemon and waits for all spawned tasks to finish. This
    /// method should be called after `shutdown()` for a clean application
    /// exit. If any task panics, the error is logged and the remaining tasks
    /// are still awaited.
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            match tokio::time::timeout(Duration::from_secs(5), task).await {
                Ok(result) => {
                    if let Err(e) = result {
                        log::error!("Task panicked: {}", e);
                    }
                }
                Err(_) => {
                    // Task didn't complete within timeout
                    log::warn!("Task did not complete within timeout period, may be hung");
                }
            }
        }
        Ok(())
    }
}

/// Run a single acquisition session from source selection to session end.
///
/// The locator decides which port the session opens; `simulate` bypasses it
/// entirely. Discovery failures (no ports, no match, enumeration error) leave
/// the session in `Idle`; failures after a port has been selected are
/// reported as `Failed`. Either way the session is over when this function
/// returns.
pub async fn run_scale_session(
    config: &ScaleConfig,
    stream: &Arc<SharedScaleStream>,
    locator: Box<dyn PortLocator>,
) {
    let source: Box<dyn ScaleSource> = if config.simulate {
        info!("Using simulated scale source");
        get_simulated_scale_source(config)
    } else {
        let descriptor = match locator.locate() {
            Ok(Some(descriptor)) => descriptor,
            Ok(None) => {
                error!("No serial port matching the scale heuristic was found");
                return;
            }
            Err(e) => {
                error!("Serial port enumeration failed: {}", e);
                return;
            }
        };

        info!("Selected scale port {}", descriptor.path);
        stream.set_session_state(SessionState::Connecting).await;

        match get_scale_source_from_port(&descriptor.path, config) {
            Ok(source) => source,
            Err(e) => {
                error!("Failed to open scale port {}: {}", descriptor.path, e);
                stream.set_session_state(SessionState::Failed).await;
                return;
            }
        }
    };

    let mut daemon = AcquisitionDaemon::new(source, stream.as_ref().clone());
    if let Err(e) = daemon.start().await {
        error!("Scale acquisition session failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::port_locator::MockPortLocator;

    #[tokio::test]
    async fn test_discovery_failure_never_leaves_idle() {
        let stream = Arc::new(SharedScaleStream::new(8));

        // No port matches the heuristic
        let mut locator = MockPortLocator::new();
        locator.expect_locate().returning(|| Ok(None));
        run_scale_session(&ScaleConfig::default(), &stream, Box::new(locator)).await;
        assert_eq!(stream.session_state().await, SessionState::Idle);
        assert!(stream.latest_reading().await.is_none());

        // Enumeration itself fails
        let mut locator = MockPortLocator::new();
        locator
            .expect_locate()
            .returning(|| Err(anyhow::anyhow!("enumeration backend unavailable")));
        run_scale_session(&ScaleConfig::default(), &stream, Box::new(locator)).await;
        assert_eq!(stream.session_state().await, SessionState::Idle);
        assert!(stream.latest_reading().await.is_none());
    }
}
