// ABOUTME: Unified error type with standard codes, severities and stable fingerprints
// ABOUTME: Carries structured context that is sanitized before reaching logs or responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! # Unified Error Handling
//!
//! Every error that crosses a module boundary is a [`TributumError`]. It carries a
//! machine-readable [`ErrorCode`], a [`Severity`] that drives the log level, free-form
//! context and a fingerprint that groups occurrences of the same failure site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use std::panic::Location;
use thiserror::Error;

use crate::sanitize::Sanitizer;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Unexpected failure inside the service
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
    /// Input failed validation
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
    /// Requested resource does not exist
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// Caller is not authenticated
    #[serde(rename = "UNAUTHORIZED")]
    Unauthorized,
    /// Request is well-formed but violates a business rule
    #[serde(rename = "BUSINESS_RULE_VIOLATION")]
    BusinessRuleViolation,
}

impl ErrorCode {
    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::ValidationError => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::BusinessRuleViolation => 422,
            Self::InternalError => 500,
        }
    }

    /// Wire representation of the code
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InternalError => "INTERNAL_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BusinessRuleViolation => "BUSINESS_RULE_VIOLATION",
        }
    }

    /// Error type name used in logs and span attributes
    #[must_use]
    pub const fn error_type(self) -> &'static str {
        match self {
            Self::InternalError => "InternalError",
            Self::ValidationError => "ValidationError",
            Self::NotFound => "NotFoundError",
            Self::Unauthorized => "UnauthorizedError",
            Self::BusinessRuleViolation => "BusinessRuleError",
        }
    }

    /// Severity assigned when the caller does not override it
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::ValidationError | Self::NotFound => Severity::Low,
            Self::BusinessRuleViolation => Severity::Medium,
            Self::Unauthorized | Self::InternalError => Severity::High,
        }
    }

    /// Client-safe description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InternalError => "An internal server error occurred",
            Self::ValidationError => "The provided input is invalid",
            Self::NotFound => "The requested resource was not found",
            Self::Unauthorized => "Authentication is required to access this resource",
            Self::BusinessRuleViolation => "The request violates a business rule",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious an error is, which decides how loudly it is logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Routine client mistake
    Low,
    /// Notable but expected condition
    Medium,
    /// Needs attention
    High,
    /// Service integrity at risk
    Critical,
}

impl Severity {
    /// Expected errors are part of normal operation and logged as warnings
    #[must_use]
    pub const fn is_expected(self) -> bool {
        matches!(self, Self::Low | Self::Medium)
    }

    /// Wire representation of the severity
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct TributumError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Severity, defaults to the code's severity
    pub severity: Severity,
    /// Additional structured context (may contain sensitive values until sanitized)
    pub context: Map<String, Value>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Stable hash of code and construction site
    pub fingerprint: String,
    /// When the error was constructed
    pub timestamp: DateTime<Utc>,
    /// Where the error was constructed
    pub location: &'static Location<'static>,
}

impl TributumError {
    /// Create a new error with the given code and message
    #[track_caller]
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let location = Location::caller();
        Self {
            code,
            message: message.into(),
            severity: code.default_severity(),
            context: Map::new(),
            source: None,
            fingerprint: fingerprint(code, location),
            timestamp: Utc::now(),
            location,
        }
    }

    /// Input validation failure
    #[track_caller]
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Missing resource
    #[track_caller]
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::new(ErrorCode::NotFound, format!("{resource} not found"))
    }

    /// Missing or invalid authentication
    #[track_caller]
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Business rule violation
    #[track_caller]
    #[must_use]
    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BusinessRuleViolation, message)
    }

    /// Unexpected internal failure
    #[track_caller]
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Replace the whole context map
    #[must_use]
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    /// Add a single context entry
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Override the default severity
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Context with every sensitive value redacted
    #[must_use]
    pub fn sanitized_context(&self, sanitizer: &Sanitizer) -> Map<String, Value> {
        sanitizer.sanitize_map(&self.context)
    }

    /// `file:line` where the error was constructed
    #[must_use]
    pub fn origin(&self) -> String {
        format!("{}:{}", self.location.file(), self.location.line())
    }
}

impl fmt::Display for TributumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, TributumError>;

fn fingerprint(code: ErrorCode, location: &Location<'_>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(location.file().as_bytes());
    hasher.update(b"|");
    hasher.update(location.line().to_string().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}
