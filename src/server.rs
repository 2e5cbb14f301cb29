// ABOUTME: HTTP server assembly: shared resources, middleware stack and graceful shutdown
// ABOUTME: Closes the database pool and flushes trace export when the server stops
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! # Server
//!
//! [`build_router`] composes the middleware stack, outermost first:
//!
//! 1. security headers
//! 2. request context (correlation ID, request span)
//! 3. error context (service info for error responses)
//! 4. panic catcher
//! 5. request logging
//! 6. routes

use crate::config::Settings;
use crate::database::Database;
use crate::errors::{error_context_middleware, panic_response, ErrorRenderer};
use crate::middleware::{
    request_context_middleware, request_logging_middleware, security_headers_middleware,
    RequestLogging, SecurityHeaders,
};
use crate::observability::Telemetry;
use crate::routes;
use anyhow::{Context, Result};
use axum::{extract::FromRef, middleware, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, info};
use tributum_core::AppResult;

/// State shared by every handler
#[derive(Debug)]
pub struct ServerResources {
    /// Active configuration
    pub settings: Arc<Settings>,
    /// Connection pool
    pub database: Database,
}

impl ServerResources {
    /// Resources for `settings` with a lazily connecting pool
    ///
    /// # Errors
    ///
    /// Returns an error if the database URL is invalid
    pub fn new(settings: Settings) -> AppResult<Self> {
        let database = Database::connect_lazy(&settings.database, &settings.log)?;
        Ok(Self {
            settings: Arc::new(settings),
            database,
        })
    }
}

impl FromRef<Arc<ServerResources>> for Database {
    fn from_ref(resources: &Arc<ServerResources>) -> Self {
        resources.database.clone()
    }
}

/// Application router with the full middleware stack
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    let settings = &resources.settings;

    routes::api_routes()
        .with_state(Arc::clone(resources))
        .layer(middleware::from_fn_with_state(
            RequestLogging::new(settings.log.clone()),
            request_logging_middleware,
        ))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(
            ErrorRenderer::from_settings(settings),
            error_context_middleware,
        ))
        .layer(middleware::from_fn(request_context_middleware))
        .layer(middleware::from_fn_with_state(
            SecurityHeaders::from_config(&settings.security_headers),
            security_headers_middleware,
        ))
}

/// HTTP server owning the resources it tears down on shutdown
pub struct Server {
    resources: Arc<ServerResources>,
    telemetry: Telemetry,
}

impl Server {
    /// Server for `resources`, flushing `telemetry` on shutdown
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>, telemetry: Telemetry) -> Self {
        Self {
            resources,
            telemetry,
        }
    }

    /// Bind the configured address and serve until Ctrl-C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or serving fails
    pub async fn run(self) -> Result<()> {
        let target = self.resources.settings.bind_target();
        let listener = TcpListener::bind(&target)
            .await
            .with_context(|| format!("Failed to bind {target}"))?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` completes
    ///
    /// # Errors
    ///
    /// Returns an error if serving fails
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = listener.local_addr().context("Listener has no local address")?;
        let router = build_router(&self.resources);

        info!(
            address = %address,
            environment = %self.resources.settings.environment,
            "HTTP server starting"
        );

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed");

        info!("HTTP server stopped, releasing resources");
        self.resources.database.close().await;
        self.telemetry.shutdown();
        served
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
