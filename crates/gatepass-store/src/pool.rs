// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{
	SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;

use crate::error::DbError;

/// Create the identity store pool.
///
/// The pool holds exactly one connection, so every read and write against
/// the store is serialized store-wide.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./data/users.db")
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid or `DbError::Sqlx` if the
/// database cannot be opened.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// Apply the schema. Every statement is idempotent.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	let m1 = include_str!("../migrations/001_create_identities.sql");
	sqlx::query(m1).execute(pool).await?;

	tracing::debug!("migrations applied");
	Ok(())
}
