// ABOUTME: Span constructors for requests and database operations
// ABOUTME: Records correlation IDs and error metadata as span fields exported as attributes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

use tracing::field::Empty;
use tracing::Span;
use tributum_core::TributumError;

/// Server span for one HTTP request
#[inline]
#[must_use]
pub fn create_request_span(method: &str, path: &str, correlation_id: &str) -> Span {
    tracing::info_span!(
        "request",
        otel.name = %format!("{method} {path}"),
        otel.kind = "server",
        otel.status_code = Empty,
        http.method = %method,
        http.target = %path,
        http.status_code = Empty,
        correlation_id = %correlation_id,
        request_id = Empty,
        error.type = Empty,
        error.code = Empty,
        error.severity = Empty,
        error.fingerprint = Empty,
    )
}

/// Client span for one database operation, tagged with the active correlation ID
#[inline]
#[must_use]
pub fn create_database_span(operation: &str) -> Span {
    let span = tracing::info_span!(
        "db",
        otel.name = %format!("db.{operation}"),
        otel.kind = "client",
        otel.status_code = Empty,
        db.operation = %operation,
        correlation_id = Empty,
        error.type = Empty,
        error.code = Empty,
        error.severity = Empty,
        error.fingerprint = Empty,
    );
    if let Some(id) = tributum_core::correlation_id() {
        add_correlation_id_to_span(&span, &id);
    }
    span
}

/// Attach `correlation_id` to `span`
pub fn add_correlation_id_to_span(span: &Span, correlation_id: &str) {
    if span.has_field("correlation_id") {
        span.record("correlation_id", correlation_id);
        return;
    }
    #[cfg(feature = "telemetry")]
    {
        use tracing_opentelemetry::OpenTelemetrySpanExt as _;
        span.set_attribute("correlation_id", correlation_id.to_owned());
    }
}

/// Mark `span` as failed with the error's classification
pub fn record_error_in_span(span: &Span, error: &TributumError) {
    span.record("otel.status_code", "ERROR");
    span.record("error.type", error.code.error_type());
    span.record("error.code", error.code.as_str());
    span.record("error.severity", error.severity.as_str());
    span.record("error.fingerprint", error.fingerprint.as_str());
}

/// Record the response status on a request span
pub fn record_status(span: &Span, status: u16) {
    span.record("http.status_code", status);
    if status >= 500 {
        span.record("otel.status_code", "ERROR");
    }
}
