// Copyright (c) 2025 SCTG Development
// This file is part of the rust-scale-gateway project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use rocket::config::LogLevel;
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use serde_json::Value;
use std::sync::Arc;

use rust_scale_gateway::acquisition::SharedScaleStream;
use rust_scale_gateway::parsing::ScaleReading;
use rust_scale_gateway::visualization::server::build_rocket;

fn get_figment() -> rocket::figment::Figment {
    rocket::Config::figment()
        .merge(("port", 0))
        .merge(("address", "127.0.0.1"))
        .merge(("log_level", LogLevel::Off))
}

async fn test_client(stream: Arc<SharedScaleStream>) -> Client {
    let rocket = build_rocket(get_figment(), stream).await;
    Client::tracked(rocket)
        .await
        .expect("valid rocket instance")
}

#[rocket::async_test]
async fn test_get_scale_before_any_reading() {
    let stream = Arc::new(SharedScaleStream::new(16));
    let client = test_client(stream).await;

    let response = client.get("/scale").dispatch().await;
    assert_eq!(response.status(), Status::InternalServerError);
    assert_eq!(response.content_type(), Some(ContentType::JSON));

    let body: Value = response.into_json().await.expect("JSON error body");
    assert_eq!(
        body,
        serde_json::json!({"error": "No valid data received from the scale yet."})
    );
}

#[rocket::async_test]
async fn test_get_scale_returns_latest_reading() {
    let stream = Arc::new(SharedScaleStream::new(16));
    stream
        .publish(ScaleReading::new(100.0, "lb"))
        .await
        .expect("publish");
    let client = test_client(stream.clone()).await;

    let response = client.get("/scale").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.content_type(), Some(ContentType::JSON));

    let body: Value = response.into_json().await.expect("JSON body");
    assert_eq!(body, serde_json::json!({"weight": 100.0, "unit": "lb"}));

    // A newer reading replaces the previous one
    stream
        .publish(ScaleReading::new(2717.5, "g"))
        .await
        .expect("publish");

    let response = client.get("/scale").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.expect("JSON body");
    assert_eq!(body, serde_json::json!({"weight": 2717.5, "unit": "g"}));
}

#[rocket::async_test]
async fn test_stream_route_answers_with_event_stream() {
    let stream = Arc::new(SharedScaleStream::new(16));
    let client = test_client(stream).await;

    let response = client.get("/scale/stream").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.content_type(), Some(ContentType::EventStream));
}

#[rocket::async_test]
async fn test_unknown_route_is_not_found() {
    let stream = Arc::new(SharedScaleStream::new(16));
    let client = test_client(stream).await;

    let response = client.get("/weights").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn test_cors_headers_are_present() {
    let stream = Arc::new(SharedScaleStream::new(16));
    let client = test_client(stream).await;

    let response = client.get("/scale").dispatch().await;
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("*")
    );
}
