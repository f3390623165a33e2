// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatepass_core::{Credential, IdentityId, IdentityRecord};
use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

/// Keyed store of identity records.
///
/// `create` never upserts: creating an id that already exists fails with
/// [`DbError::Conflict`]. `delete` is idempotent and reports whether a record
/// was actually removed. `list_all` returns a point-in-time snapshot.
#[async_trait]
pub trait IdentityStore: Send + Sync {
	async fn get_by_identity(&self, id: IdentityId) -> Result<Option<IdentityRecord>, DbError>;
	async fn create(&self, record: &IdentityRecord) -> Result<(), DbError>;
	async fn delete(&self, id: IdentityId) -> Result<bool, DbError>;
	async fn list_all(&self) -> Result<Vec<IdentityRecord>, DbError>;
}

#[async_trait]
impl IdentityStore for IdentityRepository {
	async fn get_by_identity(&self, id: IdentityId) -> Result<Option<IdentityRecord>, DbError> {
		self.get_by_identity(id).await
	}

	async fn create(&self, record: &IdentityRecord) -> Result<(), DbError> {
		self.create(record).await
	}

	async fn delete(&self, id: IdentityId) -> Result<bool, DbError> {
		self.delete(id).await
	}

	async fn list_all(&self) -> Result<Vec<IdentityRecord>, DbError> {
		self.list_all().await
	}
}

type IdentityRow = (i64, String, String, String);

#[derive(Clone)]
pub struct IdentityRepository {
	pool: SqlitePool,
}

impl IdentityRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Get the record for an identity.
	///
	/// # Returns
	/// `None` if the identity has never been provisioned or was removed.
	#[tracing::instrument(skip(self), fields(identity_id = %id))]
	pub async fn get_by_identity(&self, id: IdentityId) -> Result<Option<IdentityRecord>, DbError> {
		let row: Option<IdentityRow> = sqlx::query_as(
			r#"
			SELECT identity_id, display_label, credential, created_at
			FROM identities
			WHERE identity_id = ?
			"#,
		)
		.bind(id.get())
		.fetch_optional(&self.pool)
		.await?;

		row.map(parse_identity_row).transpose()
	}

	/// Insert a new record.
	///
	/// # Errors
	/// `DbError::Conflict` if a record for the identity already exists.
	#[tracing::instrument(skip(self, record), fields(identity_id = %record.identity_id))]
	pub async fn create(&self, record: &IdentityRecord) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			INSERT INTO identities (identity_id, display_label, credential, created_at)
			VALUES (?, ?, ?, ?)
			"#,
		)
		.bind(record.identity_id.get())
		.bind(&record.display_label)
		.bind(record.credential.expose())
		.bind(record.created_at.to_rfc3339())
		.execute(&self.pool)
		.await;

		match result {
			Ok(_) => {
				tracing::debug!(identity_id = %record.identity_id, "identity record created");
				Ok(())
			}
			Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(DbError::Conflict(
				format!("identity {} already has a record", record.identity_id),
			)),
			Err(e) => Err(e.into()),
		}
	}

	/// Delete the record for an identity. Absent ids are not an error.
	#[tracing::instrument(skip(self), fields(identity_id = %id))]
	pub async fn delete(&self, id: IdentityId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM identities WHERE identity_id = ?")
			.bind(id.get())
			.execute(&self.pool)
			.await?;

		let removed = result.rows_affected() > 0;
		tracing::debug!(identity_id = %id, removed, "identity record deleted");
		Ok(removed)
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_all(&self) -> Result<Vec<IdentityRecord>, DbError> {
		let rows: Vec<IdentityRow> = sqlx::query_as(
			r#"
			SELECT identity_id, display_label, credential, created_at
			FROM identities
			ORDER BY identity_id
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(parse_identity_row).collect()
	}
}

fn parse_identity_row(row: IdentityRow) -> Result<IdentityRecord, DbError> {
	let (identity_id, display_label, credential, created_at) = row;
	let created_at = DateTime::parse_from_rfc3339(&created_at)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("invalid created_at for {identity_id}: {e}")))?;

	Ok(IdentityRecord {
		identity_id: IdentityId::new(identity_id),
		display_label,
		credential: Credential::from_stored(credential),
		created_at,
	})
}
