// ABOUTME: Axum extractor handing each request its own pooled database connection
// ABOUTME: Pool exhaustion is rejected with an INTERNAL_ERROR response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

use super::Database;
use crate::errors::ApiError;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyConnection};
use std::ops::{Deref, DerefMut};

/// Pooled connection held for the lifetime of one request
///
/// ```rust,no_run
/// use tributum::database::DbSession;
/// use tributum::errors::ApiResult;
///
/// async fn count(mut session: DbSession) -> ApiResult<String> {
///     let one: i32 = sqlx::query_scalar("SELECT 1")
///         .fetch_one(&mut *session)
///         .await
///         .map_err(|e| tributum_core::TributumError::internal("query failed").with_source(e))?;
///     Ok(one.to_string())
/// }
/// ```
#[derive(Debug)]
pub struct DbSession(PoolConnection<Any>);

impl DbSession {
    /// Release the connection back to the pool
    pub fn into_inner(self) -> PoolConnection<Any> {
        self.0
    }
}

impl Deref for DbSession {
    type Target = AnyConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DbSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for DbSession
where
    Database: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let database = Database::from_ref(state);
        database.acquire().await.map(Self).map_err(ApiError::from)
    }
}
