// ABOUTME: Task-local correlation and request IDs scoped to a single request future
// ABOUTME: Concurrent requests never observe each other's IDs and nothing outlives the scope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! Request-scoped correlation context
//!
//! The slot is a Tokio task-local, set for exactly the lifetime of the future
//! passed to [`scope`]. Code running outside a scope sees `None`.

use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Header carrying the correlation ID in both directions
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Header carrying the per-request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static ACTIVE_SCOPE: RequestScope;
}

/// IDs visible to the task handling one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestScope {
    correlation_id: Arc<str>,
    request_id: Arc<str>,
}

impl RequestScope {
    /// Build a scope from explicit IDs
    #[must_use]
    pub fn new(correlation_id: impl Into<Arc<str>>, request_id: impl Into<Arc<str>>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            request_id: request_id.into(),
        }
    }

    /// Scope for an inbound request: reuses a non-empty inbound correlation ID,
    /// always generates a fresh request ID
    #[must_use]
    pub fn from_inbound(inbound_correlation_id: Option<&str>) -> Self {
        Self::new(
            resolve_correlation_id(inbound_correlation_id),
            generate_correlation_id(),
        )
    }

    /// Correlation ID shared across services for one logical request
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// ID unique to this hop
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

/// Generate a random UUID v4 in canonical hyphenated form
#[must_use]
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Use the inbound value when present and non-empty, otherwise generate one
#[must_use]
pub fn resolve_correlation_id(inbound: Option<&str>) -> String {
    match inbound {
        Some(value) if !value.is_empty() => value.to_owned(),
        _ => generate_correlation_id(),
    }
}

/// Run `future` with `scope` as the active request scope
pub async fn scope<F>(active: RequestScope, future: F) -> F::Output
where
    F: Future,
{
    ACTIVE_SCOPE.scope(active, future).await
}

/// Snapshot of the active scope
#[must_use]
pub fn current() -> Option<RequestScope> {
    ACTIVE_SCOPE.try_with(Clone::clone).ok()
}

/// Correlation ID of the active scope
#[must_use]
pub fn correlation_id() -> Option<String> {
    ACTIVE_SCOPE
        .try_with(|s| s.correlation_id().to_owned())
        .ok()
}

/// Request ID of the active scope
#[must_use]
pub fn request_id() -> Option<String> {
    ACTIVE_SCOPE.try_with(|s| s.request_id().to_owned()).ok()
}

/// Spawn a task that inherits the caller's request scope, if any
pub fn spawn_in_scope<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match current() {
        Some(active) => tokio::spawn(ACTIVE_SCOPE.scope(active, future)),
        None => tokio::spawn(future),
    }
}
