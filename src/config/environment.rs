// ABOUTME: Top-level server settings assembled from environment variables
// ABOUTME: Applies production overrides and validates all sections together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

use super::database::DatabaseConfig;
use super::logging::LogConfig;
use super::observability::ObservabilityConfig;
use super::security::SecurityHeadersConfig;
use super::types::{Environment, LogFormat};
use super::{env_parse_or, env_var_or};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default service name reported by `/info` and error responses
pub const DEFAULT_APP_NAME: &str = "Tributum";

/// Complete server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Service name
    pub app_name: String,
    /// Service version, the crate version unless overridden
    pub app_version: String,
    /// Deployment environment
    pub environment: Environment,
    /// Debug mode, always off in production
    pub debug: bool,
    /// Bind address
    pub api_host: String,
    /// Bind port
    pub api_port: u16,
    /// Logging section
    pub log: LogConfig,
    /// Tracing section
    pub observability: ObservabilityConfig,
    /// Database section
    pub database: DatabaseConfig,
    /// Security header section
    pub security_headers: SecurityHeadersConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.into(),
            app_version: env!("CARGO_PKG_VERSION").into(),
            environment: Environment::Development,
            debug: true,
            api_host: "127.0.0.1".into(),
            api_port: 8000,
            log: LogConfig::default(),
            observability: ObservabilityConfig::default(),
            database: DatabaseConfig::default(),
            security_headers: SecurityHeadersConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or the result fails validation
    pub fn from_env() -> Result<Self> {
        let environment = Environment::from_str_or_default(&env_var_or("ENVIRONMENT", "development"));

        let settings = Self {
            app_name: env_var_or("APP_NAME", DEFAULT_APP_NAME),
            app_version: env_var_or("APP_VERSION", env!("CARGO_PKG_VERSION")),
            environment,
            debug: env_parse_or("DEBUG", !environment.is_production())?,
            api_host: env_var_or("API_HOST", "127.0.0.1"),
            api_port: env_parse_or("API_PORT", 8000)?,
            log: LogConfig::from_env().context("Failed to load logging configuration")?,
            observability: ObservabilityConfig::from_env()
                .context("Failed to load observability configuration")?,
            database: DatabaseConfig::from_env()
                .context("Failed to load database configuration")?,
            security_headers: SecurityHeadersConfig::from_env(environment)
                .context("Failed to load security header configuration")?,
        }
        .with_environment_overrides();

        settings.validate()?;
        Ok(settings)
    }

    /// Apply the rules that follow from the deployment environment
    #[must_use]
    pub fn with_environment_overrides(mut self) -> Self {
        if self.environment.is_production() {
            self.log.log_format = LogFormat::Json;
            self.debug = false;
        }
        self
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        let rate = self.observability.trace_sample_rate;
        if !(0.0..=1.0).contains(&rate) {
            bail!("OBSERVABILITY_CONFIG__TRACE_SAMPLE_RATE must be within 0.0..=1.0, got {rate}");
        }
        if self.log.max_body_log_size == 0 && self.log.captures_bodies() {
            bail!("LOG_CONFIG__MAX_BODY_LOG_SIZE must be positive when body logging is enabled");
        }
        if self.log.max_body_buffer_size < self.log.max_body_log_size && self.log.captures_bodies() {
            bail!("LOG_CONFIG__MAX_BODY_BUFFER_SIZE must not be smaller than LOG_CONFIG__MAX_BODY_LOG_SIZE");
        }
        if self.api_host.trim().is_empty() {
            bail!("API_HOST must not be empty");
        }
        self.database.validate()
    }

    /// `host:port` the server listens on
    #[must_use]
    pub fn bind_target(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Log a summary of the active configuration
    pub fn log_summary(&self) {
        info!(
            app_name = %self.app_name,
            version = %self.app_version,
            environment = %self.environment,
            debug = self.debug,
            bind = %self.bind_target(),
            log_level = %self.log.log_level,
            log_format = %self.log.log_format,
            tracing_enabled = self.observability.enable_tracing,
            exporter = %self.observability.exporter_type,
            database = %self.database.redacted_url(),
            "Configuration loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_overrides() {
        let settings = Settings {
            environment: Environment::Production,
            ..Settings::default()
        }
        .with_environment_overrides();
        assert_eq!(settings.log.log_format, LogFormat::Json);
        assert!(!settings.debug);
    }

    #[test]
    fn test_validate_sample_rate() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());
        settings.observability.trace_sample_rate = 1.5;
        assert!(settings.validate().is_err());
        settings.observability.trace_sample_rate = f64::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_bind_target() {
        let settings = Settings {
            api_host: "0.0.0.0".into(),
            api_port: 9000,
            ..Settings::default()
        };
        assert_eq!(settings.bind_target(), "0.0.0.0:9000");
    }
}
