// ABOUTME: HTTP rendering of TributumError as JSON error responses
// ABOUTME: Adds correlation IDs and service info, hides details and internal messages in production
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! # API Errors
//!
//! Handlers return [`ApiResult`]. An [`ApiError`] records itself on the current span,
//! is logged at the level its severity calls for and renders an [`ErrorResponse`].
//!
//! Rendering reads the [`ErrorRenderer`] installed for the request by
//! [`error_context_middleware`]; outside of it development defaults apply.

use crate::config::Settings;
use crate::logging::log_error;
use crate::observability::record_error_in_span;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::sync::Arc;
use tracing::{error, Span};
use tributum_core::{ErrorCode, Sanitizer, Severity, TributumError};

tokio::task_local! {
    static ACTIVE_RENDERER: ErrorRenderer;
}

/// Identifies the service in error responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Service name
    pub name: String,
    /// Service version
    pub version: String,
    /// Deployment environment
    pub environment: String,
}

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable code
    pub error_code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Sanitized context, omitted in production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
    /// Correlation ID of the failed request
    pub correlation_id: Option<String>,
    /// Request ID of the failed request
    pub request_id: Option<String>,
    /// When the error occurred
    pub timestamp: DateTime<Utc>,
    /// Error severity
    pub severity: Severity,
    /// Service that produced the error
    pub service_info: ServiceInfo,
}

/// Turns errors into responses for one deployment
#[derive(Debug, Clone)]
pub struct ErrorRenderer {
    service: ServiceInfo,
    expose_details: bool,
    sanitizer: Arc<Sanitizer>,
}

impl Default for ErrorRenderer {
    fn default() -> Self {
        Self {
            service: ServiceInfo {
                name: crate::config::environment::DEFAULT_APP_NAME.to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                environment: crate::config::Environment::Development.to_string(),
            },
            expose_details: true,
            sanitizer: Arc::new(Sanitizer::default()),
        }
    }
}

impl ErrorRenderer {
    /// Renderer for the configured service; production hides details
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            service: ServiceInfo {
                name: settings.app_name.clone(),
                version: settings.app_version.clone(),
                environment: settings.environment.to_string(),
            },
            expose_details: !settings.environment.is_production(),
            sanitizer: Arc::new(Sanitizer::new(&settings.log.sensitive_fields)),
        }
    }

    /// Renderer active for the current request, or the default one
    #[must_use]
    pub fn current() -> Self {
        ACTIVE_RENDERER
            .try_with(Clone::clone)
            .unwrap_or_default()
    }

    /// Sanitizer applied to error context
    #[must_use]
    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    /// Response body for `error`
    #[must_use]
    pub fn body(&self, error: &TributumError) -> ErrorResponse {
        let message = if !self.expose_details && error.code == ErrorCode::InternalError {
            error.code.description().to_owned()
        } else {
            error.message.clone()
        };
        let details = self
            .expose_details
            .then(|| error.sanitized_context(&self.sanitizer))
            .filter(|details| !details.is_empty());

        ErrorResponse {
            error_code: error.code,
            message,
            details,
            correlation_id: tributum_core::correlation_id(),
            request_id: tributum_core::request_id(),
            timestamp: error.timestamp,
            severity: error.severity,
            service_info: self.service.clone(),
        }
    }

    /// Full response for `error`
    #[must_use]
    pub fn render(&self, error: &TributumError) -> Response {
        let status =
            StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body(error))).into_response()
    }
}

/// HTTP-facing wrapper around [`TributumError`]
#[derive(Debug)]
pub struct ApiError(pub TributumError);

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl From<TributumError> for ApiError {
    fn from(error: TributumError) -> Self {
        Self(error)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let renderer = ErrorRenderer::current();
        record_error_in_span(&Span::current(), &self.0);
        log_error(&self.0, renderer.sanitizer());
        renderer.render(&self.0)
    }
}

/// Make `renderer` the active [`ErrorRenderer`] for the inner service
pub async fn error_context_middleware(
    State(renderer): State<ErrorRenderer>,
    req: Request,
    next: Next,
) -> Response {
    ACTIVE_RENDERER.scope(renderer, next.run(req)).await
}

/// Response for a panic caught by `CatchPanicLayer`
///
/// The panic message is only included outside production.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let renderer = ErrorRenderer::current();
    let panic_message = payload
        .downcast_ref::<TributumError>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_owned()))
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned());

    let error = TributumError::internal(format!("Unhandled panic: {panic_message}"))
        .with_detail("panic_message", panic_message.clone())
        .with_severity(Severity::Critical);

    record_error_in_span(&Span::current(), &error);
    error!(
        error_code = %error.code,
        severity = %error.severity,
        fingerprint = %error.fingerprint,
        "Handler panicked, returning internal error response"
    );
    renderer.render(&error)
}
