//! Rust Scale Gateway library
//!
//! This library provides functionality for reading weight reports from a
//! serial weighing scale and republishing them over HTTP and Server-Sent
//! Events.

pub mod acquisition;
pub mod config;
pub mod daemon;
pub mod parsing;
pub mod visualization;
