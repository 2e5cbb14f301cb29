// ABOUTME: Adds browser security headers to every HTTP response
// ABOUTME: Headers already set by a handler are left untouched
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

use crate::config::SecurityHeadersConfig;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::{header, HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use tracing::warn;

/// Precomputed security header set
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl SecurityHeaders {
    /// Build the header set, skipping configured values that are not valid header values
    #[must_use]
    pub fn from_config(config: &SecurityHeadersConfig) -> Self {
        let mut headers = vec![
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
            (
                header::X_XSS_PROTECTION,
                HeaderValue::from_static("1; mode=block"),
            ),
        ];

        let configured = [
            (header::X_FRAME_OPTIONS, Some(config.frame_options.clone())),
            (header::REFERRER_POLICY, Some(config.referrer_policy.clone())),
            (header::STRICT_TRANSPORT_SECURITY, config.hsts_value()),
            (
                header::CONTENT_SECURITY_POLICY,
                config.content_security_policy.clone(),
            ),
        ];
        for (name, value) in configured {
            let Some(value) = value else { continue };
            match HeaderValue::from_str(&value) {
                Ok(value) => headers.push((name, value)),
                Err(_) => warn!(header = %name, "Ignoring invalid security header value"),
            }
        }

        Self {
            headers: Arc::new(headers),
        }
    }

    /// Insert every header that is not already present
    pub fn apply(&self, target: &mut HeaderMap) {
        for (name, value) in self.headers.iter() {
            if !target.contains_key(name) {
                target.insert(name.clone(), value.clone());
            }
        }
    }
}

/// Middleware adding [`SecurityHeaders`] to the response
///
/// ```rust,no_run
/// use axum::{middleware, routing::get, Router};
/// use tributum::config::SecurityHeadersConfig;
/// use tributum::middleware::security_headers::{security_headers_middleware, SecurityHeaders};
///
/// let headers = SecurityHeaders::from_config(&SecurityHeadersConfig::default());
/// let app: Router = Router::new()
///     .route("/", get(|| async { "ok" }))
///     .layer(middleware::from_fn_with_state(headers, security_headers_middleware));
/// ```
pub async fn security_headers_middleware(
    State(headers): State<SecurityHeaders>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    headers.apply(response.headers_mut());
    response
}
