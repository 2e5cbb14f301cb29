// ABOUTME: Database configuration: connection URL and pool sizing
// ABOUTME: Supports SQLite and PostgreSQL URLs through the sqlx Any driver
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

use super::{env_parse_or, env_var_or};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// URL schemes the pool can connect to
pub const SUPPORTED_SCHEMES: [&str; 3] = ["sqlite:", "postgres://", "postgresql://"];

/// Database connection and pool configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Connection URL
    pub database_url: String,
    /// Connections kept open
    pub pool_size: u32,
    /// Extra connections allowed under load
    pub max_overflow: u32,
    /// Seconds to wait for a free connection
    pub pool_timeout_secs: u64,
    /// Test connections before handing them out
    pub pool_pre_ping: bool,
    /// Log every statement
    pub echo: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            pool_size: 10,
            max_overflow: 5,
            pool_timeout_secs: 30,
            pool_pre_ping: true,
            echo: false,
        }
    }
}

impl DatabaseConfig {
    /// Load from `DATABASE_CONFIG__*` variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable cannot be parsed
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            database_url: env_var_or("DATABASE_CONFIG__DATABASE_URL", &defaults.database_url),
            pool_size: env_parse_or("DATABASE_CONFIG__POOL_SIZE", defaults.pool_size)?,
            max_overflow: env_parse_or("DATABASE_CONFIG__MAX_OVERFLOW", defaults.max_overflow)?,
            pool_timeout_secs: env_parse_or(
                "DATABASE_CONFIG__POOL_TIMEOUT",
                defaults.pool_timeout_secs,
            )?,
            pool_pre_ping: env_parse_or("DATABASE_CONFIG__POOL_PRE_PING", defaults.pool_pre_ping)?,
            echo: env_parse_or("DATABASE_CONFIG__ECHO", defaults.echo)?,
        })
    }

    /// Upper bound on open connections
    #[must_use]
    pub const fn max_connections(&self) -> u32 {
        self.pool_size.saturating_add(self.max_overflow)
    }

    /// Acquire timeout as a duration
    #[must_use]
    pub const fn pool_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_timeout_secs)
    }

    /// Check the URL scheme and pool sizing
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported scheme or an empty pool
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_SCHEMES
            .iter()
            .any(|scheme| self.database_url.starts_with(scheme))
        {
            bail!(
                "Unsupported database URL scheme in {}; expected one of {}",
                redact_url(&self.database_url),
                SUPPORTED_SCHEMES.join(", ")
            );
        }
        if self.pool_size == 0 {
            bail!("DATABASE_CONFIG__POOL_SIZE must be at least 1");
        }
        Ok(())
    }

    /// URL with the password replaced, safe to log
    #[must_use]
    pub fn redacted_url(&self) -> String {
        redact_url(&self.database_url)
    }
}

fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) if parsed.password().is_some() => {
            if parsed.set_password(Some("***")).is_err() {
                return "<unparseable database url>".into();
            }
            parsed.to_string()
        }
        Ok(_) => raw.to_owned(),
        Err(_) => "<unparseable database url>".into(),
    }
}
