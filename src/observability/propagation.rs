// ABOUTME: W3C trace context extraction from inbound HTTP headers
// ABOUTME: Links the request span to a remote parent when a valid traceparent arrives
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

use http::HeaderMap;
use tracing::Span;

/// W3C trace context header
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Parent `span` on the trace context carried by `headers`
///
/// Returns whether a valid remote parent was found. Without the `telemetry`
/// feature the headers are ignored.
pub fn link_remote_parent(span: &Span, headers: &HeaderMap) -> bool {
    #[cfg(feature = "telemetry")]
    {
        use opentelemetry::trace::TraceContextExt as _;
        use tracing_opentelemetry::OpenTelemetrySpanExt as _;

        if !headers.contains_key(TRACEPARENT_HEADER) {
            return false;
        }
        let context = opentelemetry::global::get_text_map_propagator(|propagator| {
            propagator.extract(&HeaderExtractor(headers))
        });
        if !context.span().span_context().is_valid() {
            return false;
        }
        span.set_parent(context);
        true
    }
    #[cfg(not(feature = "telemetry"))]
    {
        let _ = (span, headers);
        false
    }
}

#[cfg(feature = "telemetry")]
struct HeaderExtractor<'a>(&'a HeaderMap);

#[cfg(feature = "telemetry")]
impl opentelemetry::propagation::Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(http::HeaderName::as_str).collect()
    }
}
