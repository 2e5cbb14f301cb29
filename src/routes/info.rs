// ABOUTME: Welcome and service information endpoints
// ABOUTME: Reports name, version, environment and debug mode from the active settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

use crate::server::ServerResources;
use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `GET /info`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InfoResponse {
    /// Service name
    pub app_name: String,
    /// Service version
    pub version: String,
    /// Deployment environment
    pub environment: String,
    /// Debug mode
    pub debug: bool,
}

/// Service information routes
pub struct InfoRoutes;

impl InfoRoutes {
    /// `GET /` and `GET /info`
    pub fn routes() -> Router<Arc<ServerResources>> {
        Router::new()
            .route("/", get(root_handler))
            .route("/info", get(info_handler))
    }
}

async fn root_handler(State(resources): State<Arc<ServerResources>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": format!("Hello from {}!", resources.settings.app_name)
    }))
}

async fn info_handler(State(resources): State<Arc<ServerResources>>) -> Json<InfoResponse> {
    let settings = &resources.settings;
    Json(InfoResponse {
        app_name: settings.app_name.clone(),
        version: settings.app_version.clone(),
        environment: settings.environment.to_string(),
        debug: settings.debug,
    })
}
