// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! Integration tests for the request logging middleware
//!
//! Events are captured with a thread-local subscriber, so every test here runs on
//! the current-thread runtime.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use axum::{
    body::Body,
    http::{header, Request as HttpRequest, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use futures_util::{stream, FutureExt};
use std::error::Error;
use std::io;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::Level;
use tributum::config::LogConfig;
use tributum::errors::{error_context_middleware, panic_response, ErrorRenderer};
use tributum::middleware::{request_context_middleware, request_logging_middleware, RequestLogging};
use tributum_core::context::CORRELATION_ID_HEADER;

async fn ok_handler() -> &'static str {
    "ok"
}

async fn slow_handler() -> &'static str {
    tokio::time::sleep(Duration::from_millis(30)).await;
    "slow"
}

#[allow(clippy::panic)]
async fn panicking_handler() -> &'static str {
    panic!("handler exploded")
}

async fn echo_json(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
    Json(body)
}

fn routes() -> Router {
    Router::new()
        .route("/ok", get(ok_handler))
        .route("/health", get(ok_handler))
        .route("/slow", get(slow_handler))
        .route("/panic", get(panicking_handler))
        .route("/echo", post(echo_json))
}

fn app(config: LogConfig) -> Router {
    routes().layer(middleware::from_fn_with_state(
        RequestLogging::new(config),
        request_logging_middleware,
    ))
}

fn json_request(uri: &str, body: &str) -> HttpRequest<Body> {
    HttpRequest::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

#[tokio::test]
async fn test_exactly_one_completed_event() -> Result<(), Box<dyn Error>> {
    let (events, _guard) = common::capture_events();

    let response = app(LogConfig::default())
        .oneshot(common::empty_request("/ok"))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let completed = events.with_message("request completed");
    assert_eq!(completed.len(), 1);
    let event = &completed[0];
    assert_eq!(event.level, Level::INFO);
    assert_eq!(event.field("method"), Some("GET"));
    assert_eq!(event.field("path"), Some("/ok"));
    assert_eq!(event.field("status_code"), Some("200"));
    let duration: f64 = event.field("duration_ms").unwrap().parse()?;
    assert!(duration >= 0.0);
    assert!(event.field("request_body").is_none());

    assert!(events.with_message("request failed").is_empty());
    Ok(())
}

#[tokio::test]
async fn test_excluded_path_emits_nothing() -> Result<(), Box<dyn Error>> {
    let (events, _guard) = common::capture_events();

    let response = app(LogConfig::default())
        .oneshot(common::empty_request("/health"))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(events.with_message("request completed").is_empty());
    assert!(events.with_message("request started").is_empty());
    Ok(())
}

#[tokio::test]
async fn test_started_event_sanitizes_headers_and_query() -> Result<(), Box<dyn Error>> {
    let (events, _guard) = common::capture_events();

    let request = HttpRequest::builder()
        .uri("/ok?page=2&api_key=secret-key")
        .header(header::AUTHORIZATION, "Bearer abc.def")
        .header("x-custom", "visible")
        .body(Body::empty())?;
    app(LogConfig::default()).oneshot(request).await?;

    let started = events.with_message("request started");
    assert_eq!(started.len(), 1);
    let headers = started[0].field("headers").unwrap();
    assert!(headers.contains("visible"));
    assert!(!headers.contains("abc.def"));
    let query = started[0].field("query").unwrap();
    assert!(query.contains("\"page\":\"2\""));
    assert!(!query.contains("secret-key"));
    Ok(())
}

#[tokio::test]
async fn test_slow_request_warning() -> Result<(), Box<dyn Error>> {
    let (events, _guard) = common::capture_events();
    let config = LogConfig {
        slow_request_threshold_ms: 5,
        ..LogConfig::default()
    };

    app(config.clone())
        .oneshot(common::empty_request("/slow"))
        .await?;
    let slow = events.with_message("slow request");
    assert_eq!(slow.len(), 1);
    assert_eq!(slow[0].level, Level::WARN);
    assert_eq!(slow[0].field("threshold_ms"), Some("5"));
    assert_eq!(events.with_message("request completed").len(), 1);

    events.clear();
    app(config).oneshot(common::empty_request("/ok")).await?;
    assert!(events.with_message("slow request").is_empty());
    Ok(())
}

#[tokio::test]
async fn test_panic_logged_once_and_propagated() -> Result<(), Box<dyn Error>> {
    let (events, _guard) = common::capture_events();

    let outcome = AssertUnwindSafe(
        app(LogConfig::default()).oneshot(common::empty_request("/panic")),
    )
    .catch_unwind()
    .await;

    let payload = outcome.err().ok_or("panic was swallowed")?;
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"handler exploded"));

    let failed = events.with_message("request failed");
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].level, Level::ERROR);
    assert_eq!(failed[0].field("error_type"), Some("panic"));
    assert_eq!(failed[0].field("error_message"), Some("handler exploded"));
    assert!(failed[0].field("duration_ms").is_some());
    assert!(events.with_message("request completed").is_empty());
    Ok(())
}

#[tokio::test]
async fn test_panic_becomes_internal_error_with_correlation() -> Result<(), Box<dyn Error>> {
    let (events, _guard) = common::capture_events();

    let app = routes()
        .layer(middleware::from_fn_with_state(
            RequestLogging::new(LogConfig::default()),
            request_logging_middleware,
        ))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(
            ErrorRenderer::default(),
            error_context_middleware,
        ))
        .layer(middleware::from_fn(request_context_middleware));

    let request = HttpRequest::builder()
        .uri("/panic")
        .header(CORRELATION_ID_HEADER, "panic-corr-1")
        .body(Body::empty())?;
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers().get(CORRELATION_ID_HEADER).unwrap(),
        "panic-corr-1"
    );
    let body = common::body_json(response).await;
    assert_eq!(body["error_code"], "INTERNAL_ERROR");
    assert_eq!(body["correlation_id"], "panic-corr-1");
    assert_eq!(body["severity"], "CRITICAL");

    let failed = events.with_message("request failed");
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].field("correlation_id"), Some("panic-corr-1"));
    Ok(())
}

#[tokio::test]
async fn test_body_capture_sanitized_and_truncated() -> Result<(), Box<dyn Error>> {
    let (events, _guard) = common::capture_events();
    let config = LogConfig {
        log_request_body: true,
        log_response_body: true,
        max_body_log_size: 40,
        ..LogConfig::default()
    };

    let response = app(config)
        .oneshot(json_request(
            "/echo",
            r#"{"password":"hunter2","note":"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"}"#,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // The handler still sees the original body
    let echoed = common::body_json(response).await;
    assert_eq!(echoed["password"], "hunter2");

    let completed = events.with_message("request completed");
    assert_eq!(completed.len(), 1);
    let request_body = completed[0].field("request_body").unwrap();
    assert!(!request_body.contains("hunter2"));
    assert!(request_body.ends_with("... [TRUNCATED]"));
    let response_body = completed[0].field("response_body").unwrap();
    assert!(!response_body.contains("hunter2"));
    Ok(())
}

#[tokio::test]
async fn test_small_body_captured_whole() -> Result<(), Box<dyn Error>> {
    let (events, _guard) = common::capture_events();
    let config = LogConfig {
        log_request_body: true,
        ..LogConfig::default()
    };

    app(config)
        .oneshot(json_request("/echo", r#"{"name":"ada"}"#))
        .await?;

    let completed = events.with_message("request completed");
    let request_body = completed[0].field("request_body").unwrap();
    assert_eq!(request_body, r#"{"name":"ada"}"#);
    assert!(completed[0].field("response_body").is_none());
    Ok(())
}

#[tokio::test]
async fn test_malformed_json_body_never_logged_raw() -> Result<(), Box<dyn Error>> {
    let (events, _guard) = common::capture_events();
    let config = LogConfig {
        log_request_body: true,
        ..LogConfig::default()
    };
    let raw = r#"{"password": "hunter2", "user": "ada""#;

    let response = app(config).oneshot(json_request("/echo", raw)).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let completed = events.with_message("request completed");
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].field("status_code"), Some("400"));
    let request_body = completed[0].field("request_body").unwrap();
    assert!(!request_body.contains("hunter2"));
    assert_eq!(request_body, format!("<invalid json body: {} bytes>", raw.len()));
    Ok(())
}

#[tokio::test]
async fn test_unreadable_request_body_still_logged() -> Result<(), Box<dyn Error>> {
    let (events, _guard) = common::capture_events();
    let config = LogConfig {
        log_request_body: true,
        ..LogConfig::default()
    };
    let chunks: Vec<Result<Bytes, io::Error>> = vec![
        Ok(Bytes::from_static(b"abc")),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "client reset")),
    ];
    let request = HttpRequest::builder()
        .method("POST")
        .uri("/echo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from_stream(stream::iter(chunks)))?;

    let response = app(config).oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let completed = events.with_message("request completed");
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].field("status_code"), Some("400"));
    assert_eq!(completed[0].field("path"), Some("/echo"));
    assert!(completed[0].field("duration_ms").is_some());
    assert!(events.with_message("request failed").is_empty());
    Ok(())
}

#[tokio::test]
async fn test_oversized_bodies_pass_through_uncaptured() -> Result<(), Box<dyn Error>> {
    let (events, _guard) = common::capture_events();
    let config = LogConfig {
        log_request_body: true,
        log_response_body: true,
        max_body_log_size: 32,
        max_body_buffer_size: 64,
        ..LogConfig::default()
    };
    let payload = format!(r#"{{"password":"hunter2","note":"{}"}}"#, "n".repeat(500));

    // Streamed without a declared length
    let response = app(config.clone())
        .oneshot(json_request("/echo", &payload))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let echoed = common::body_json(response).await;
    assert_eq!(echoed["note"].as_str().map(str::len), Some(500));

    let completed = events.with_message("request completed");
    assert_eq!(completed.len(), 1);
    let not_captured = "<body not captured: larger than 64 bytes>";
    assert_eq!(completed[0].field("request_body"), Some(not_captured));
    assert_eq!(completed[0].field("response_body"), Some(not_captured));

    // Declared length over the limit is never read ahead
    events.clear();
    let request = HttpRequest::builder()
        .method("POST")
        .uri("/echo")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload.clone()))?;
    let response = app(config).oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["password"], "hunter2");
    let completed = events.with_message("request completed");
    assert_eq!(completed[0].field("request_body"), Some(not_captured));
    Ok(())
}
