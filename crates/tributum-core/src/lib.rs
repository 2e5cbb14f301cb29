// ABOUTME: Core types for the Tributum API backend
// ABOUTME: Foundation crate with error handling, sanitization, and request correlation context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

#![deny(unsafe_code)]

//! # Tributum Core
//!
//! Framework-free foundation shared by the Tributum server. Nothing here knows
//! about HTTP frameworks or log sinks, which keeps the crate cheap to compile and
//! easy to test in isolation.
//!
//! ## Modules
//!
//! - **errors**: `TributumError`, `ErrorCode` and `Severity`
//! - **sanitize**: recursive redaction of sensitive fields and headers
//! - **context**: task-local correlation and request IDs

/// Unified error type with codes, severities and fingerprints
pub mod errors;

/// Redaction of sensitive values in nested structures and headers
pub mod sanitize;

/// Request-scoped correlation context
pub mod context;

pub use context::{correlation_id, request_id, RequestScope};
pub use errors::{AppResult, ErrorCode, Severity, TributumError};
pub use sanitize::Sanitizer;
