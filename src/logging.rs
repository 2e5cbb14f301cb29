// ABOUTME: Structured logging setup with console or JSON output and optional span export
// ABOUTME: Span fields such as correlation_id are carried onto every event logged inside a request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! Logging configuration with structured output
//!
//! The global subscriber is a [`Registry`] with an [`EnvFilter`], one formatting
//! layer and, when tracing is enabled, the OpenTelemetry layer from
//! [`Telemetry::layer`]. `RUST_LOG` overrides the configured level; the noise
//! reduction directives apply either way.

use crate::config::{LogConfig, LogFormat, LogLevel, Settings};
use crate::observability::Telemetry;
use anyhow::{Context, Result};
use serde_json::Value;
use std::env;
use std::io;
use tracing::{error, info, warn, Subscriber};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};
use tributum_core::{Sanitizer, TributumError};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(settings: &Settings, telemetry: &Telemetry) -> Result<()> {
    let sql_statements = settings.log.enable_sql_logging || settings.database.echo;

    let mut layers = vec![format_layer(settings.log.log_format)];
    if let Some(otel) = telemetry.layer() {
        layers.push(otel);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(settings.log.log_level, sql_statements))
        .try_init()
        .context("Failed to install the global tracing subscriber")?;

    info!(
        service.name = %settings.app_name,
        service.version = %settings.app_version,
        environment = %settings.environment,
        log.level = %settings.log.log_level,
        log.format = %settings.log.log_format,
        tracing = telemetry.is_enabled(),
        "Logging initialized"
    );
    Ok(())
}

/// Subscriber used while the global one is not yet installed
///
/// Telemetry setup runs under this so its warnings reach the configured output.
#[must_use]
pub fn bootstrap_subscriber(config: &LogConfig) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry()
        .with(vec![format_layer(config.log_format)])
        .with(env_filter(config.log_level, false))
}

/// Log a [`TributumError`] at the level its severity calls for
///
/// Expected errors (low and medium severity) are warnings, everything else is an
/// error. Context is sanitized first.
pub fn log_error(error: &TributumError, sanitizer: &Sanitizer) {
    let context = Value::Object(error.sanitized_context(sanitizer));
    if error.severity.is_expected() {
        warn!(
            error_code = %error.code,
            severity = %error.severity,
            fingerprint = %error.fingerprint,
            origin = %error.origin(),
            context = %context,
            "{}",
            error.message
        );
    } else {
        let source = std::error::Error::source(error).map(ToString::to_string);
        error!(
            error_code = %error.code,
            severity = %error.severity,
            fingerprint = %error.fingerprint,
            origin = %error.origin(),
            context = %context,
            source = source.as_deref(),
            "{}",
            error.message
        );
    }
}

fn format_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(io::stdout)
            .boxed(),
        LogFormat::Console => fmt::layer()
            .with_target(true)
            .with_writer(io::stdout)
            .boxed(),
    }
}

fn env_filter(level: LogLevel, sql_statements: bool) -> EnvFilter {
    let base = env::var("RUST_LOG").map_or_else(
        |_| EnvFilter::new(level.to_string()),
        |directive| EnvFilter::new(&directive),
    );

    let sqlx = if sql_statements { "sqlx=debug" } else { "sqlx=warn" };
    [
        "hyper=warn",
        "hyper_util=warn",
        "h2=warn",
        "tower=warn",
        "tonic=warn",
        "opentelemetry=warn",
        sqlx,
    ]
    .into_iter()
    .fold(base, |filter, directive| {
        filter.add_directive(
            directive
                .parse()
                .unwrap_or_else(|_| tracing::Level::WARN.into()),
        )
    })
    .add_directive(
        format!("tributum={level}")
            .parse()
            .unwrap_or_else(|_| level.to_tracing_level().into()),
    )
}
