// ABOUTME: Infrastructure HTTP routes: welcome, service info, health and the not-found fallback
// ABOUTME: Routes share ServerResources as axum state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

/// Health check routes
pub mod health;
/// Welcome and service info routes
pub mod info;

pub use health::HealthRoutes;
pub use info::InfoRoutes;

use crate::errors::ApiError;
use crate::server::ServerResources;
use axum::{http::Uri, Router};
use std::sync::Arc;
use tributum_core::TributumError;

/// Every route served by the application
pub fn api_routes() -> Router<Arc<ServerResources>> {
    Router::new()
        .merge(InfoRoutes::routes())
        .merge(HealthRoutes::routes())
        .fallback(not_found)
}

async fn not_found(uri: Uri) -> ApiError {
    TributumError::not_found(format!("Route {}", uri.path()))
        .with_detail("path", uri.path())
        .into()
}
