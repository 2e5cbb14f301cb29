// ABOUTME: HTTP middleware for security headers, request correlation and request logging
// ABOUTME: Layers are composed in server::build_router in a fixed outer-to-inner order

/// Correlation ID propagation and request span
pub mod request_context;
/// Request logging pipeline
pub mod request_logging;
/// Browser security headers
pub mod security_headers;

pub use request_context::request_context_middleware;
pub use request_logging::{request_logging_middleware, RequestLogging};
pub use security_headers::{security_headers_middleware, SecurityHeaders};
