// ABOUTME: Main library entry point for the Tributum HTTP API backend
// ABOUTME: Wires configuration, logging, tracing, middleware, database and routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

#![deny(unsafe_code)]

//! # Tributum
//!
//! HTTP API backend scaffold with request correlation, structured logging,
//! sanitized error reporting and OpenTelemetry tracing.
//!
//! ## Features
//!
//! - **Correlation IDs**: propagated from `X-Correlation-ID` or generated, visible to
//!   every log line, span and error response of the request
//! - **Request logging**: timing, slow request warnings, panic capture and optional
//!   sanitized body capture
//! - **Tracing**: console, OTLP, GCP or AWS exporters chosen by configuration, with
//!   fail-soft fallback to disabled tracing
//! - **Database**: sqlx pool for `SQLite` and `PostgreSQL` with per-request sessions
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tributum::config::Settings;
//! use tributum::server::{Server, ServerResources};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::from_env()?;
//!     let telemetry = tributum::observability::setup_tracing(&settings.observability);
//!     tributum::logging::init(&settings, &telemetry)?;
//!
//!     let resources = Arc::new(ServerResources::new(settings)?);
//!     Server::new(resources, telemetry).run().await
//! }
//! ```

/// Environment-based configuration
pub mod config;

/// Database pool, sessions and transactions
pub mod database;

/// HTTP error responses
pub mod errors;

/// Global subscriber setup and error logging
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// OpenTelemetry exporter selection and span helpers
pub mod observability;

/// Infrastructure routes
pub mod routes;

/// Router assembly and server lifecycle
pub mod server;
