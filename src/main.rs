// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the serial weighing-scale gateway
use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use tokio::signal;

use rust_scale_gateway::acquisition::{HeuristicPortLocator, PortLocator};
use rust_scale_gateway::config::Config;
use rust_scale_gateway::daemon::Daemon;

/// Serial weighing-scale gateway with live weight streaming
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial port the scale is attached to (overrides auto-detection)
    #[arg(long)]
    serial_port: Option<String>,

    /// Serial line speed in baud
    #[arg(long)]
    baud_rate: Option<u32>,

    /// Web server port (default: 5000)
    #[arg(short = 'p', long)]
    web_port: Option<u16>,

    /// Web server address (default: 127.0.0.1)
    #[arg(long)]
    web_address: Option<String>,

    /// Replace the serial port with a simulated scale emitting random readings
    #[arg(long, default_value_t = false)]
    simulate: bool,

    /// List all available serial ports and exit
    #[arg(long = "list-ports", default_value_t = false)]
    list_ports: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[rocket::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_ports {
        // List available serial ports, marking the one the heuristic would pick
        let locator = HeuristicPortLocator;
        let ports = locator.list_candidate_ports()?;
        let selected = locator.select(&ports);
        println!("Available serial ports:");
        for port in &ports {
            let marker = match &selected {
                Some(selected) if selected.path == port.path => " (selected)",
                _ => "",
            };
            println!("- {} [{}]{}", port.path, port.kind, marker);
        }
        if ports.is_empty() {
            println!("(none)");
        }
        return Ok(());
    }

    // Initialize logger with appropriate level based on verbose and quiet flags
    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    // Load configuration
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let mut config = Config::from_file(&config_path)?;

    // Apply command line overrides
    config.apply_args(
        args.web_port,
        args.web_address.clone(),
        args.serial_port.clone(),
        args.baud_rate,
        args.simulate,
    );

    info!("Starting scale gateway daemon");
    let mut daemon = Daemon::new();

    // Launch all configured tasks
    daemon.launch(&config).await?;

    // Wait for termination signal
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal, terminating daemon");
            daemon.shutdown();
            daemon.join().await?;
        }
        Err(err) => {
            eprintln!("Error waiting for shutdown signal: {}", err);
        }
    }

    Ok(())
}
