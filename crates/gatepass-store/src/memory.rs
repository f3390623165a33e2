// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory identity store with failure injection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use gatepass_core::{IdentityId, IdentityRecord};
use tokio::sync::Mutex;

use crate::error::DbError;
use crate::identity::IdentityStore;

#[derive(Default)]
pub struct MemoryIdentityStore {
	records: Mutex<BTreeMap<IdentityId, IdentityRecord>>,
	fail_get: AtomicBool,
	fail_create: AtomicBool,
	fail_delete: AtomicBool,
	fail_list: AtomicBool,
}

impl MemoryIdentityStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_records(records: impl IntoIterator<Item = IdentityRecord>) -> Self {
		let map = records
			.into_iter()
			.map(|r| (r.identity_id, r))
			.collect::<BTreeMap<_, _>>();
		Self {
			records: Mutex::new(map),
			..Self::default()
		}
	}

	pub fn with_get_failure(self) -> Self {
		self.fail_get.store(true, Ordering::SeqCst);
		self
	}

	pub fn with_create_failure(self) -> Self {
		self.fail_create.store(true, Ordering::SeqCst);
		self
	}

	pub fn with_delete_failure(self) -> Self {
		self.fail_delete.store(true, Ordering::SeqCst);
		self
	}

	pub fn with_list_failure(self) -> Self {
		self.fail_list.store(true, Ordering::SeqCst);
		self
	}

	pub fn set_create_failure(&self, fail: bool) {
		self.fail_create.store(fail, Ordering::SeqCst);
	}

	pub async fn len(&self) -> usize {
		self.records.lock().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.records.lock().await.is_empty()
	}

	pub async fn contains(&self, id: IdentityId) -> bool {
		self.records.lock().await.contains_key(&id)
	}
}

fn injected(op: &str) -> DbError {
	DbError::Internal(format!("injected {op} failure"))
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
	async fn get_by_identity(&self, id: IdentityId) -> Result<Option<IdentityRecord>, DbError> {
		if self.fail_get.load(Ordering::SeqCst) {
			return Err(injected("get"));
		}
		Ok(self.records.lock().await.get(&id).cloned())
	}

	async fn create(&self, record: &IdentityRecord) -> Result<(), DbError> {
		if self.fail_create.load(Ordering::SeqCst) {
			return Err(injected("create"));
		}
		let mut records = self.records.lock().await;
		if records.contains_key(&record.identity_id) {
			return Err(DbError::Conflict(format!(
				"identity {} already has a record",
				record.identity_id
			)));
		}
		records.insert(record.identity_id, record.clone());
		Ok(())
	}

	async fn delete(&self, id: IdentityId) -> Result<bool, DbError> {
		if self.fail_delete.load(Ordering::SeqCst) {
			return Err(injected("delete"));
		}
		Ok(self.records.lock().await.remove(&id).is_some())
	}

	async fn list_all(&self) -> Result<Vec<IdentityRecord>, DbError> {
		if self.fail_list.load(Ordering::SeqCst) {
			return Err(injected("list"));
		}
		Ok(self.records.lock().await.values().cloned().collect())
	}
}
