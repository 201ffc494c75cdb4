// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Visualization module
//!
//! This module handles data presentation for the scale gateway: a small web
//! server exposing the most recent reading for polling clients and a
//! Server-Sent Events stream for clients that want push updates.

pub mod api;
pub mod server;

pub use api::{NoDataResponse, ScaleStreamState};
pub use server::build_rocket;
