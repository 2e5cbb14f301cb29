// ABOUTME: Health check route handler for service monitoring
// ABOUTME: Reports database reachability, 503 when the database cannot be pinged
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! Health check routes for service monitoring
//!
//! `/health` is in the default excluded paths, so load balancer probes do not
//! produce request log events.

use crate::server::ServerResources;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;
use tracing::warn;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes() -> Router<Arc<ServerResources>> {
        Router::new().route("/health", get(health_handler))
    }
}

async fn health_handler(
    State(resources): State<Arc<ServerResources>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let database_ok = match resources.database.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Health check could not reach the database");
            false
        }
    };

    let (status, label) = if database_ok {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(serde_json::json!({
            "status": label,
            "database": database_ok,
            "version": resources.settings.app_version,
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
