// ABOUTME: Database pool management over the sqlx Any driver for SQLite and PostgreSQL
// ABOUTME: Lazy pool with pre-ping, overflow sizing, statement logging and slow query warnings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! Database pool and request sessions
//!
//! [`Database`] owns the connection pool. Handlers take a [`DbSession`] to work on
//! one pooled connection, or call [`Database::begin`] for a [`TransactionGuard`]
//! that rolls back unless committed.

/// Per-request connection extractor
pub mod session;
/// Transaction guard with rollback on drop
pub mod transactions;

pub use session::DbSession;
pub use transactions::TransactionGuard;

use crate::config::{DatabaseConfig, LogConfig};
use crate::observability::create_database_span;
use log::LevelFilter;
use sqlx::any::{AnyConnectOptions, AnyPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyPool, ConnectOptions};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, Instrument};
use tributum_core::{AppResult, TributumError};

/// Shared connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: AnyPool,
    redacted_url: Arc<str>,
}

impl Database {
    /// Build a pool that opens connections on first use
    ///
    /// # Errors
    ///
    /// Returns an error if the database URL cannot be parsed
    pub fn connect_lazy(config: &DatabaseConfig, log: &LogConfig) -> AppResult<Self> {
        sqlx::any::install_default_drivers();

        let redacted_url = config.redacted_url();
        let mut options = AnyConnectOptions::from_str(&config.database_url).map_err(|e| {
            TributumError::internal("Invalid database URL")
                .with_detail("database_url", redacted_url.clone())
                .with_source(e)
        })?;

        options = if config.echo || log.enable_sql_logging {
            options.log_statements(LevelFilter::Debug)
        } else {
            options.disable_statement_logging()
        };
        options = options.log_slow_statements(LevelFilter::Warn, log.slow_query_threshold());

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections())
            .acquire_timeout(config.pool_timeout())
            .test_before_acquire(config.pool_pre_ping)
            .connect_lazy_with(options);

        info!(
            database = %redacted_url,
            pool_size = config.pool_size,
            max_overflow = config.max_overflow,
            pool_timeout_secs = config.pool_timeout_secs,
            pre_ping = config.pool_pre_ping,
            "Database pool configured"
        );

        Ok(Self {
            pool,
            redacted_url: redacted_url.into(),
        })
    }

    /// Run `SELECT 1` on a pooled connection
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be obtained or the query fails
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .instrument(create_database_span("ping"))
            .await
            .map(|_| ())
            .map_err(|e| database_error("Database ping failed", e))
    }

    /// Take one connection from the pool
    ///
    /// # Errors
    ///
    /// Returns an error if the pool is exhausted past the acquire timeout
    pub async fn acquire(&self) -> AppResult<PoolConnection<Any>> {
        self.pool
            .acquire()
            .instrument(create_database_span("acquire"))
            .await
            .map_err(|e| database_error("Database connection unavailable", e))
    }

    /// Start a transaction that rolls back unless committed
    ///
    /// # Errors
    ///
    /// Returns an error if no connection is available or `BEGIN` fails
    pub async fn begin(&self) -> AppResult<TransactionGuard> {
        let transaction = self
            .pool
            .begin()
            .instrument(create_database_span("begin"))
            .await
            .map_err(|e| database_error("Failed to begin transaction", e))?;
        Ok(TransactionGuard::new(transaction))
    }

    /// Close every connection and refuse new ones
    pub async fn close(&self) {
        self.pool.close().await;
        info!(database = %self.redacted_url, "Database pool closed");
    }

    /// Whether [`Database::close`] has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Connection URL with the password masked
    #[must_use]
    pub fn redacted_url(&self) -> &str {
        &self.redacted_url
    }
}

/// Wrap a driver error, keeping it as the source
#[track_caller]
pub(crate) fn database_error(message: &str, source: sqlx::Error) -> TributumError {
    let kind = match &source {
        sqlx::Error::PoolTimedOut => "pool_timeout",
        sqlx::Error::PoolClosed => "pool_closed",
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => "connection",
        sqlx::Error::Database(_) => "database",
        _ => "driver",
    };
    TributumError::internal(message)
        .with_detail("db_error_kind", kind)
        .with_source(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_rejected() {
        let config = DatabaseConfig {
            database_url: "not a url".into(),
            ..DatabaseConfig::default()
        };
        let error = Database::connect_lazy(&config, &LogConfig::default()).err();
        assert!(error.is_some_and(|e| e.code == tributum_core::ErrorCode::InternalError));
    }

    #[test]
    fn test_pool_error_kinds() {
        let error = database_error("Database connection unavailable", sqlx::Error::PoolTimedOut);
        assert_eq!(error.context["db_error_kind"], "pool_timeout");
        assert_eq!(error.message, "Database connection unavailable");
    }
}
