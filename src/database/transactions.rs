// ABOUTME: RAII transaction guard that rolls back unless explicitly committed
// ABOUTME: Wraps a sqlx Any transaction and maps driver errors into TributumError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! ## RAII Transaction Guard
//!
//! ```text
//! let mut tx = database.begin().await?;
//! sqlx::query("INSERT INTO ledger ...").execute(tx.executor()?).await?;
//! tx.commit().await?;
//! ```
//!
//! Dropping the guard before `commit()` rolls the transaction back.

use super::database_error;
use sqlx::{Any, AnyConnection, Transaction};
use tracing::debug;
use tributum_core::{AppResult, TributumError};

/// Transaction that rolls back on drop unless committed
pub struct TransactionGuard {
    transaction: Option<Transaction<'static, Any>>,
}

impl std::fmt::Debug for TransactionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionGuard")
            .field("open", &self.transaction.is_some())
            .finish()
    }
}

impl TransactionGuard {
    /// Guard an open transaction
    #[must_use]
    pub fn new(transaction: Transaction<'static, Any>) -> Self {
        Self {
            transaction: Some(transaction),
        }
    }

    /// Connection to run statements on
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction was already finished
    pub fn executor(&mut self) -> AppResult<&mut AnyConnection> {
        self.transaction
            .as_deref_mut()
            .ok_or_else(|| TributumError::internal("Transaction already finished"))
    }

    /// Commit and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails
    pub async fn commit(mut self) -> AppResult<()> {
        let transaction = self
            .transaction
            .take()
            .ok_or_else(|| TributumError::internal("Transaction already finished"))?;
        transaction
            .commit()
            .await
            .map_err(|e| database_error("Transaction commit failed", e))?;
        debug!("Transaction committed");
        Ok(())
    }

    /// Roll back and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails
    pub async fn rollback(mut self) -> AppResult<()> {
        let transaction = self
            .transaction
            .take()
            .ok_or_else(|| TributumError::internal("Transaction already finished"))?;
        transaction
            .rollback()
            .await
            .map_err(|e| database_error("Transaction rollback failed", e))?;
        debug!("Transaction rolled back");
        Ok(())
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        if self.transaction.is_some() {
            debug!("Transaction dropped without commit, rolling back");
        }
    }
}
