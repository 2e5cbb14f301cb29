// ABOUTME: Structured request logging with timing, slow request warnings and failure capture
// ABOUTME: Optionally records size-capped, sanitized request and response bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! Request Logging Middleware
//!
//! For every request whose path is not excluded this emits:
//!
//! - a `request started` debug event with sanitized headers and query parameters,
//! - exactly one `request completed` event with status and duration,
//! - an extra `slow request` warning when the duration exceeds the threshold.
//!
//! If the inner service panics, a single `request failed` error event is emitted
//! and the panic resumes with its original payload.
//!
//! Bodies are only held in memory up to `max_body_buffer_size`. Larger bodies
//! are passed on as a stream and logged as not captured.

use crate::config::LogConfig;
use crate::errors::ApiError;
use axum::{
    body::{Body, BodyDataStream},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::{Bytes, BytesMut};
use futures_util::{future, stream, FutureExt, StreamExt};
use http::{header, HeaderMap, Method};
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::{resume_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn, Level};
use tributum_core::{Sanitizer, TributumError};

/// Appended to a body cut at `max_body_log_size`
pub const BODY_TRUNCATION_SUFFIX: &str = "... [TRUNCATED]";

/// Shared state for [`request_logging_middleware`]
#[derive(Debug, Clone)]
pub struct RequestLogging {
    config: Arc<LogConfig>,
    sanitizer: Arc<Sanitizer>,
}

impl RequestLogging {
    /// State for `config`, redacting its extra sensitive fields too
    #[must_use]
    pub fn new(config: LogConfig) -> Self {
        let sanitizer = Sanitizer::new(&config.sensitive_fields);
        Self {
            config: Arc::new(config),
            sanitizer: Arc::new(sanitizer),
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &LogConfig {
        &self.config
    }
}

/// Log the request around the inner service
pub async fn request_logging_middleware(
    State(logging): State<RequestLogging>,
    req: Request,
    next: Next,
) -> Response {
    let config = &logging.config;
    let path = req.uri().path().to_owned();
    if config.is_excluded(&path) {
        return next.run(req).await;
    }

    let method = req.method().clone();
    let start = Instant::now();

    if tracing::enabled!(Level::DEBUG) {
        log_request_started(&logging.sanitizer, &method, &path, &req);
    }

    let (req, request_body) = if config.log_request_body {
        match buffer_request(req, config, &logging.sanitizer).await {
            Ok(buffered) => buffered,
            Err(e) => {
                let response = ApiError::from(e).into_response();
                log_completed(config, &method, &path, &response, start.elapsed(), None, None);
                return response;
            }
        }
    } else {
        (req, None)
    };

    let outcome = AssertUnwindSafe(next.run(req)).catch_unwind().await;
    let elapsed = start.elapsed();

    let response = match outcome {
        Ok(response) => response,
        Err(payload) => {
            let (error_type, error_message) = describe_panic(payload.as_ref());
            error!(
                method = %method,
                path = %path,
                error_type = %error_type,
                error_message = %error_message,
                duration_ms = duration_ms(elapsed),
                "request failed"
            );
            resume_unwind(payload)
        }
    };

    let (response, response_body) = if config.log_response_body {
        buffer_response(response, config, &logging.sanitizer).await
    } else {
        (response, None)
    };

    log_completed(
        config,
        &method,
        &path,
        &response,
        elapsed,
        request_body.as_deref(),
        response_body.as_deref(),
    );
    response
}

fn log_completed(
    config: &LogConfig,
    method: &Method,
    path: &str,
    response: &Response,
    elapsed: Duration,
    request_body: Option<&str>,
    response_body: Option<&str>,
) {
    info!(
        method = %method,
        path = %path,
        status_code = response.status().as_u16(),
        duration_ms = duration_ms(elapsed),
        request_body,
        response_body,
        "request completed"
    );

    if elapsed > config.slow_request_threshold() {
        warn!(
            method = %method,
            path = %path,
            duration_ms = duration_ms(elapsed),
            threshold_ms = config.slow_request_threshold_ms,
            "slow request"
        );
    }
}

fn log_request_started(sanitizer: &Sanitizer, method: &Method, path: &str, req: &Request) {
    let headers = Value::Object(sanitize_headers(sanitizer, req.headers()));
    let query = req
        .uri()
        .query()
        .map(|query| Value::Object(sanitize_pairs(sanitizer, query.as_bytes())));
    debug!(
        method = %method,
        path = %path,
        query = query.as_ref().map(tracing::field::display),
        headers = %headers,
        "request started"
    );
}

/// A body read for logging, up to the buffer limit
enum Collected {
    Whole(Bytes),
    /// The limit was passed; `head` is what was read, `rest` is still unread
    Oversized { head: Bytes, rest: BodyDataStream },
}

impl Collected {
    /// Reassemble the body and render its loggable form
    fn into_logged(
        self,
        headers: &HeaderMap,
        config: &LogConfig,
        sanitizer: &Sanitizer,
    ) -> (Body, Option<String>) {
        match self {
            Self::Whole(bytes) => {
                let logged = render_body(&bytes, headers, config.max_body_log_size, sanitizer);
                (Body::from(bytes), logged)
            }
            Self::Oversized { head, rest } => {
                let body = Body::from_stream(stream::once(future::ready(Ok(head))).chain(rest));
                (body, Some(not_captured(config.max_body_buffer_size)))
            }
        }
    }
}

fn not_captured(limit: usize) -> String {
    format!("<body not captured: larger than {limit} bytes>")
}

/// Declared `Content-Length`, if it parses
fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

fn exceeds_limit(headers: &HeaderMap, limit: usize) -> bool {
    declared_length(headers)
        .is_some_and(|length| !usize::try_from(length).is_ok_and(|length| length <= limit))
}

/// Read `body` until it ends or grows past `limit` bytes
async fn collect_capped(body: Body, limit: usize) -> Result<Collected, axum::Error> {
    let mut rest = body.into_data_stream();
    let mut buffer = BytesMut::new();
    while let Some(chunk) = rest.next().await {
        buffer.extend_from_slice(&chunk?);
        if buffer.len() > limit {
            return Ok(Collected::Oversized {
                head: buffer.freeze(),
                rest,
            });
        }
    }
    Ok(Collected::Whole(buffer.freeze()))
}

async fn buffer_request(
    req: Request,
    config: &LogConfig,
    sanitizer: &Sanitizer,
) -> Result<(Request, Option<String>), TributumError> {
    if exceeds_limit(req.headers(), config.max_body_buffer_size) {
        return Ok((req, Some(not_captured(config.max_body_buffer_size))));
    }
    let (parts, body) = req.into_parts();
    let collected = collect_capped(body, config.max_body_buffer_size)
        .await
        .map_err(|e| {
            TributumError::validation("Failed to read request body")
                .with_detail("reason", e.to_string())
        })?;
    let (body, logged) = collected.into_logged(&parts.headers, config, sanitizer);
    Ok((Request::from_parts(parts, body), logged))
}

async fn buffer_response(
    response: Response,
    config: &LogConfig,
    sanitizer: &Sanitizer,
) -> (Response, Option<String>) {
    if is_streaming(response.headers()) {
        return (response, Some("<streaming body not captured>".to_owned()));
    }
    if exceeds_limit(response.headers(), config.max_body_buffer_size) {
        return (response, Some(not_captured(config.max_body_buffer_size)));
    }
    let (parts, body) = response.into_parts();
    match collect_capped(body, config.max_body_buffer_size).await {
        Ok(collected) => {
            let (body, logged) = collected.into_logged(&parts.headers, config, sanitizer);
            (Response::from_parts(parts, body), logged)
        }
        Err(e) => {
            warn!(error = %e, "Failed to buffer response body for logging");
            (Response::from_parts(parts, Body::empty()), None)
        }
    }
}

fn is_streaming(headers: &HeaderMap) -> bool {
    content_type(headers).starts_with("text/event-stream")
}

fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Loggable form of a body: sanitized, capped at `max_size` bytes, `None` when empty
#[must_use]
pub fn render_body(
    bytes: &Bytes,
    headers: &HeaderMap,
    max_size: usize,
    sanitizer: &Sanitizer,
) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let content_type = content_type(headers).to_lowercase();

    if content_type.contains("json") {
        return Some(match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => truncate_body(&sanitizer.sanitize_value(&value).to_string(), max_size),
            Err(_) => format!("<invalid json body: {} bytes>", bytes.len()),
        });
    }
    if content_type.starts_with("application/x-www-form-urlencoded") {
        let clean = Value::Object(sanitize_pairs(sanitizer, bytes)).to_string();
        return Some(truncate_body(&clean, max_size));
    }

    let head = &bytes[..bytes.len().min(max_size)];
    match std::str::from_utf8(head) {
        Ok(text) => {
            let clean = sanitizer.sanitize_text(text);
            if bytes.len() > max_size {
                Some(format!("{clean}{BODY_TRUNCATION_SUFFIX}"))
            } else {
                Some(clean)
            }
        }
        Err(e) if e.error_len().is_none() && e.valid_up_to() > 0 => {
            // the cap split a multi-byte character
            let text = String::from_utf8_lossy(&head[..e.valid_up_to()]);
            Some(format!(
                "{}{BODY_TRUNCATION_SUFFIX}",
                sanitizer.sanitize_text(&text)
            ))
        }
        Err(_) => Some(format!(
            "<binary body: {} bytes, content-type: {}>",
            bytes.len(),
            if content_type.is_empty() { "unknown" } else { &content_type }
        )),
    }
}

/// Cut `text` to at most `max_size` bytes on a character boundary and mark it
#[must_use]
pub fn truncate_body(text: &str, max_size: usize) -> String {
    if text.len() <= max_size {
        return text.to_owned();
    }
    let mut cut = max_size;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{BODY_TRUNCATION_SUFFIX}", &text[..cut])
}

fn sanitize_headers(sanitizer: &Sanitizer, headers: &HeaderMap) -> Map<String, Value> {
    sanitizer.sanitize_headers(
        headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value))),
    )
}

fn sanitize_pairs(sanitizer: &Sanitizer, encoded: &[u8]) -> Map<String, Value> {
    let pairs: Map<String, Value> = url::form_urlencoded::parse(encoded)
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect();
    sanitizer.sanitize_map(&pairs)
}

fn describe_panic(payload: &(dyn Any + Send)) -> (String, String) {
    if let Some(error) = payload.downcast_ref::<TributumError>() {
        return (error.code.error_type().to_owned(), error.message.clone());
    }
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned());
    ("panic".to_owned(), message)
}

fn duration_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100_000.0).round() / 100.0
}
