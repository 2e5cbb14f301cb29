// ABOUTME: Logging configuration: level, output format, excluded paths and body capture
// ABOUTME: Also holds request and SQL slow thresholds used by the middleware and pool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

use super::types::{LogFormat, LogLevel};
use super::{env_list_or, env_parse_or, env_var_or};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Paths that bypass request logging unless configured otherwise
pub const DEFAULT_EXCLUDED_PATHS: [&str; 2] = ["/health", "/metrics"];

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Minimum level emitted by the application
    pub log_level: LogLevel,
    /// Output format, forced to JSON in production
    pub log_format: LogFormat,
    /// Request paths that produce no request log events
    pub excluded_paths: Vec<String>,
    /// Field names redacted in addition to the built-in patterns
    pub sensitive_fields: Vec<String>,
    /// Requests slower than this also emit a `slow request` warning
    pub slow_request_threshold_ms: u64,
    /// Capture request bodies in the request log
    pub log_request_body: bool,
    /// Capture response bodies in the request log
    pub log_response_body: bool,
    /// Captured bodies are cut at this many bytes
    pub max_body_log_size: usize,
    /// Bodies larger than this are streamed through without being captured
    pub max_body_buffer_size: usize,
    /// Log every SQL statement at debug level
    pub enable_sql_logging: bool,
    /// Statements slower than this are logged as warnings
    pub slow_query_threshold_ms: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Console,
            excluded_paths: DEFAULT_EXCLUDED_PATHS.map(str::to_owned).to_vec(),
            sensitive_fields: Vec::new(),
            slow_request_threshold_ms: 1000,
            log_request_body: false,
            log_response_body: false,
            max_body_log_size: 10_240,
            max_body_buffer_size: 1_048_576,
            enable_sql_logging: false,
            slow_query_threshold_ms: 100,
        }
    }
}

impl LogConfig {
    /// Load logging configuration from `LOG_CONFIG__*` variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable cannot be parsed
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            log_level: LogLevel::from_str_or_default(&env_var_or(
                "LOG_CONFIG__LOG_LEVEL",
                &defaults.log_level.to_string(),
            )),
            log_format: LogFormat::from_str_or_default(&env_var_or(
                "LOG_CONFIG__LOG_FORMAT",
                &defaults.log_format.to_string(),
            )),
            excluded_paths: env_list_or("LOG_CONFIG__EXCLUDED_PATHS", &defaults.excluded_paths),
            sensitive_fields: env_list_or(
                "LOG_CONFIG__SENSITIVE_FIELDS",
                &defaults.sensitive_fields,
            ),
            slow_request_threshold_ms: env_parse_or(
                "LOG_CONFIG__SLOW_REQUEST_THRESHOLD_MS",
                defaults.slow_request_threshold_ms,
            )?,
            log_request_body: env_parse_or(
                "LOG_CONFIG__LOG_REQUEST_BODY",
                defaults.log_request_body,
            )?,
            log_response_body: env_parse_or(
                "LOG_CONFIG__LOG_RESPONSE_BODY",
                defaults.log_response_body,
            )?,
            max_body_log_size: env_parse_or(
                "LOG_CONFIG__MAX_BODY_LOG_SIZE",
                defaults.max_body_log_size,
            )?,
            max_body_buffer_size: env_parse_or(
                "LOG_CONFIG__MAX_BODY_BUFFER_SIZE",
                defaults.max_body_buffer_size,
            )?,
            enable_sql_logging: env_parse_or(
                "LOG_CONFIG__ENABLE_SQL_LOGGING",
                defaults.enable_sql_logging,
            )?,
            slow_query_threshold_ms: env_parse_or(
                "LOG_CONFIG__SLOW_QUERY_THRESHOLD_MS",
                defaults.slow_query_threshold_ms,
            )?,
        })
    }

    /// Whether `path` bypasses request logging
    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_paths.iter().any(|excluded| excluded == path)
    }

    /// Slow request threshold as a duration
    #[must_use]
    pub const fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_request_threshold_ms)
    }

    /// Slow SQL statement threshold as a duration
    #[must_use]
    pub const fn slow_query_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_query_threshold_ms)
    }

    /// Whether any body capture is enabled
    #[must_use]
    pub const fn captures_bodies(&self) -> bool {
        self.log_request_body || self.log_response_body
    }
}
