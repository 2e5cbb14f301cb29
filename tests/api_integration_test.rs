// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! End-to-end tests through the complete router and middleware stack

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use axum::{
    body::Body,
    http::{header, Request as HttpRequest, StatusCode},
};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;
use tributum::config::{DatabaseConfig, Environment, Settings};
use tributum::observability::Telemetry;
use tributum::routes::info::InfoResponse;
use tributum::server::{build_router, Server, ServerResources};
use tributum_core::context::{CORRELATION_ID_HEADER, REQUEST_ID_HEADER};
use uuid::Uuid;

fn resources(settings: Settings) -> Arc<ServerResources> {
    Arc::new(ServerResources::new(settings).unwrap())
}

#[tokio::test]
async fn test_root_greets_with_app_name() -> Result<(), Box<dyn Error>> {
    let settings = Settings {
        app_name: "Ledger".into(),
        ..common::test_settings()
    };
    let response = build_router(&resources(settings))
        .oneshot(common::empty_request("/"))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let correlation = response.headers().get(CORRELATION_ID_HEADER).unwrap().to_str()?;
    assert!(Uuid::parse_str(correlation).is_ok());
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Hello from Ledger!");
    Ok(())
}

#[tokio::test]
async fn test_info_reports_settings() -> Result<(), Box<dyn Error>> {
    let settings = Settings {
        app_version: "9.9.9".into(),
        environment: Environment::Staging,
        debug: false,
        ..common::test_settings()
    };
    let response = build_router(&resources(settings))
        .oneshot(common::empty_request("/info"))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let info: InfoResponse = serde_json::from_slice(&common::body_bytes(response).await)?;
    assert_eq!(
        info,
        InfoResponse {
            app_name: "Tributum".into(),
            version: "9.9.9".into(),
            environment: "staging".into(),
            debug: false,
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_health_with_reachable_database() -> Result<(), Box<dyn Error>> {
    let response = build_router(&resources(common::test_settings()))
        .oneshot(common::empty_request("/health"))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
    Ok(())
}

#[tokio::test]
async fn test_health_degraded_without_database() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("missing").join("app.db");
    let settings = Settings {
        database: DatabaseConfig {
            database_url: format!("sqlite://{}", missing.display()),
            pool_timeout_secs: 1,
            ..DatabaseConfig::default()
        },
        ..common::test_settings()
    };

    let response = build_router(&resources(settings))
        .oneshot(common::empty_request("/health"))
        .await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], false);
    Ok(())
}

#[tokio::test]
async fn test_unknown_route_returns_not_found_error() -> Result<(), Box<dyn Error>> {
    let request = HttpRequest::builder()
        .uri("/nowhere")
        .header(CORRELATION_ID_HEADER, "missing-route-1")
        .body(Body::empty())?;
    let response = build_router(&resources(common::test_settings()))
        .oneshot(request)
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get(CORRELATION_ID_HEADER).unwrap(),
        "missing-route-1"
    );
    let body = common::body_json(response).await;
    assert_eq!(body["error_code"], "NOT_FOUND");
    assert_eq!(body["correlation_id"], "missing-route-1");
    assert_eq!(body["severity"], "LOW");
    assert_eq!(body["details"]["path"], "/nowhere");
    assert_eq!(body["service_info"]["name"], "Tributum");
    assert_eq!(body["service_info"]["environment"], "development");
    assert!(body["request_id"].is_string());
    assert!(body["timestamp"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_production_error_omits_details() -> Result<(), Box<dyn Error>> {
    let settings = Settings {
        environment: Environment::Production,
        ..common::test_settings()
    }
    .with_environment_overrides();
    let response = build_router(&resources(settings))
        .oneshot(common::empty_request("/nowhere"))
        .await?;

    let body = common::body_json(response).await;
    assert_eq!(body["error_code"], "NOT_FOUND");
    assert!(body.get("details").is_none());
    assert_eq!(body["service_info"]["environment"], "production");
    Ok(())
}

#[tokio::test]
async fn test_security_headers_on_every_response() -> Result<(), Box<dyn Error>> {
    let router = build_router(&resources(common::test_settings()));

    for uri in ["/", "/nowhere"] {
        let response = router.clone().oneshot(common::empty_request(uri)).await?;
        let headers = response.headers();
        assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
        assert_eq!(headers.get(header::X_XSS_PROTECTION).unwrap(), "1; mode=block");
        assert_eq!(
            headers.get(header::REFERRER_POLICY).unwrap(),
            "strict-origin-when-cross-origin"
        );
        assert!(!headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    }
    Ok(())
}

#[tokio::test]
async fn test_serve_until_shutdown_closes_pool() -> Result<(), Box<dyn Error>> {
    let resources = resources(common::test_settings());
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server = Server::new(Arc::clone(&resources), Telemetry::disabled());
    let handle = tokio::spawn(server.serve(listener, async move {
        let _ = shutdown_rx.await;
    }));

    let mut stream = TcpStream::connect(address).await?;
    stream
        .write_all(b"GET /info HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await?;
    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut raw)).await??;
    let text = String::from_utf8_lossy(&raw);
    assert!(text.starts_with("HTTP/1.1 200"));
    assert!(text.to_lowercase().contains("x-correlation-id"));

    shutdown_tx.send(()).map_err(|()| "server already stopped")?;
    tokio::time::timeout(Duration::from_secs(5), handle).await???;
    assert!(resources.database.is_closed());
    Ok(())
}
