// ABOUTME: Correlation ID propagation for HTTP requests
// ABOUTME: Binds the IDs to a task-local scope and the request span, echoes them on the response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! Request Context Middleware
//!
//! Every request gets a [`RequestScope`]: the inbound `X-Correlation-ID` when it is
//! present and non-empty, otherwise a fresh UUID, plus a new request ID. The scope is
//!
//! - inserted into request extensions (`Extension<RequestScope>`),
//! - active as the task-local context while the inner service runs,
//! - recorded on the `request` span so every event carries `correlation_id`,
//! - echoed back in the `X-Correlation-ID` and `X-Request-ID` response headers.
//!
//! The task-local slot is dropped with the inner future, so nothing leaks into
//! the next request served by the same worker.

use crate::observability::{create_request_span, link_remote_parent, spans::record_status};
use axum::{extract::Request, middleware::Next, response::Response};
use http::HeaderValue;
use tracing::Instrument;
use tributum_core::context::{self, CORRELATION_ID_HEADER, REQUEST_ID_HEADER};
use tributum_core::RequestScope;

/// Establish the correlation context for one request
pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    // obs-text bytes are kept: the scope holds a lossy copy, the response echoes the raw value
    let inbound = req.headers().get(CORRELATION_ID_HEADER).cloned();
    let inbound_text = inbound
        .as_ref()
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
    let scope = RequestScope::from_inbound(inbound_text.as_deref());

    let span = create_request_span(req.method().as_str(), req.uri().path(), scope.correlation_id());
    span.record("request_id", scope.request_id());
    link_remote_parent(&span, req.headers());

    let echoed_correlation = match inbound {
        Some(value) if inbound_text.as_deref() == Some(scope.correlation_id()) => Some(value),
        _ => HeaderValue::from_str(scope.correlation_id()).ok(),
    };
    let echoed = (
        echoed_correlation,
        HeaderValue::from_str(scope.request_id()).ok(),
    );
    req.extensions_mut().insert(scope.clone());

    let mut response = context::scope(scope, next.run(req))
        .instrument(span.clone())
        .await;
    record_status(&span, response.status().as_u16());

    let headers = response.headers_mut();
    if let Some(value) = echoed.0 {
        headers.insert(CORRELATION_ID_HEADER, value);
    }
    if let Some(value) = echoed.1 {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    response
}
