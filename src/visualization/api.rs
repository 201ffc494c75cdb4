// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Scale reading API endpoints
//!
//! This module provides the HTTP endpoints of the gateway: a polling endpoint
//! returning the most recent reading, and a Server-Sent Events stream pushing
//! every new reading to subscribed web clients.

use rocket::futures::stream::Stream;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{
    get,
    http::Status,
    response::stream::{Event, EventStream},
    State,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::acquisition::{ScaleStreamConsumer, SharedScaleStream};
use crate::parsing::ScaleReading;

/// Scale streaming state managed by Rocket
pub struct ScaleStreamState {
    /// Stream of parsed readings fed by the acquisition daemon
    pub stream: Arc<SharedScaleStream>,
}

/// Error body returned while no reading has been received yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoDataResponse {
    /// Human readable description of the failure
    pub error: String,
}

/// Get the most recent scale reading
///
/// Returns the last successfully parsed reading as JSON. Until the scale has
/// produced at least one valid line, the endpoint answers with HTTP 500 and
/// an error body so polling clients can tell "no data yet" from a zero weight.
#[get("/scale")]
pub async fn get_scale(
    stream_state: &State<ScaleStreamState>,
) -> Result<Json<ScaleReading>, Custom<Json<NoDataResponse>>> {
    match stream_state.stream.latest_reading().await {
        Some(reading) => Ok(Json(reading)),
        None => Err(Custom(
            Status::InternalServerError,
            Json(NoDataResponse {
                error: "No valid data received from the scale yet.".to_string(),
            }),
        )),
    }
}

/// Stream scale readings via Server-Sent Events
///
/// Provides a continuous stream of readings to web clients using Server-Sent
/// Events. Each parsed line is delivered exactly once as an `update-weight`
/// event; while the scale is quiet a heartbeat is sent every 5 seconds so
/// intermediaries do not drop the connection.
///
/// ### Response Format
/// ```text
/// event: update-weight
/// data: {"weight": 2717.5, "unit": "g"}
/// ```
#[get("/scale/stream")]
pub fn stream_scale(
    stream_state: &State<ScaleStreamState>,
) -> EventStream<impl Stream<Item = Event>> {
    let stream = stream_state.stream.clone();

    EventStream! {
        let mut consumer = ScaleStreamConsumer::new(&stream);

        loop {
            match timeout(Duration::from_secs(5), consumer.next_reading()).await {
                Ok(Some(reading)) => {
                    yield Event::json(&reading).event("update-weight");
                }
                Ok(None) => {
                    log::info!("Scale stream closed, ending event stream");
                    break;
                }
                Err(_) => {
                    // Timeout - send heartbeat
                    yield Event::data(r#"{"type":"heartbeat"}"#);
                }
            }
        }
    }
}
