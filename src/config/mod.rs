// ABOUTME: Configuration management module for server, logging, tracing and database settings
// ABOUTME: Loads every section from environment variables and validates the combined result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! Configuration module for the Tributum server
//!
//! All settings come from environment variables. Top-level values use plain names
//! (`APP_NAME`, `ENVIRONMENT`, `API_PORT`), nested sections use `SECTION__FIELD`
//! (`LOG_CONFIG__LOG_LEVEL`, `DATABASE_CONFIG__POOL_SIZE`).
//!
//! - **environment**: top-level [`Settings`] and cross-section validation
//! - **logging**: log level, format, excluded paths and body capture limits
//! - **observability**: tracing exporter selection and sampling
//! - **database**: connection URL and pool sizing
//! - **security**: response security header values

use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Top-level settings
pub mod environment;
/// Logging configuration
pub mod logging;
/// Tracing exporter configuration
pub mod observability;
/// Database pool configuration
pub mod database;
/// Security header configuration
pub mod security;
/// Shared enumerations
pub mod types;

pub use database::DatabaseConfig;
pub use environment::Settings;
pub use logging::LogConfig;
pub use observability::ObservabilityConfig;
pub use security::SecurityHeadersConfig;
pub use types::{Environment, LogFormat, LogLevel};

/// Get environment variable or default value
pub(crate) fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Non-empty environment variable, if set
pub(crate) fn env_var_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an environment variable, falling back to `default` when unset
pub(crate) fn env_parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env_var_opt(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}")),
        None => Ok(default),
    }
}

/// Parse a comma-separated environment variable into a list
pub(crate) fn env_list_or<S: Display>(key: &str, default: &[S]) -> Vec<String> {
    env::var(key).map_or_else(
        |_| default.iter().map(ToString::to_string).collect(),
        |raw| parse_list(&raw),
    )
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_owned())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_skips_blanks() {
        assert_eq!(
            parse_list(" /health, ,/metrics,"),
            vec!["/health".to_owned(), "/metrics".to_owned()]
        );
        assert!(parse_list("").is_empty());
    }
}
