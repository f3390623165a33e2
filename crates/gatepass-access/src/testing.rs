// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Recording collaborators for orchestrator and loop tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use gatepass_core::{
	GatewayClient, IdentityId, Membership, MembershipOracle, NotificationSink, NotifyError,
	OracleError,
};
use gatepass_gateway::{CredentialProvisioner, GatewayError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
	Add { label: String, secret: String, flow: String },
	Remove(String),
}

#[derive(Default)]
pub struct MockProvisioner {
	calls: Mutex<Vec<GatewayCall>>,
	fail_add: AtomicBool,
	fail_remove: AtomicBool,
}

impl MockProvisioner {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_add_error(self) -> Self {
		self.fail_add.store(true, Ordering::SeqCst);
		self
	}

	pub fn with_remove_error(self) -> Self {
		self.fail_remove.store(true, Ordering::SeqCst);
		self
	}

	pub fn calls(&self) -> Vec<GatewayCall> {
		self.calls.lock().unwrap().clone()
	}

	pub fn add_count(&self) -> usize {
		self
			.calls()
			.iter()
			.filter(|c| matches!(c, GatewayCall::Add { .. }))
			.count()
	}

	pub fn removes(&self) -> Vec<String> {
		self
			.calls()
			.into_iter()
			.filter_map(|c| match c {
				GatewayCall::Remove(label) => Some(label),
				GatewayCall::Add { .. } => None,
			})
			.collect()
	}
}

fn exhausted(reason: &str) -> GatewayError {
	GatewayError::Exhausted(vec![gatepass_gateway::StrategyFailure {
		strategy: "mock",
		message: reason.to_string(),
	}])
}

#[async_trait]
impl CredentialProvisioner for MockProvisioner {
	async fn add(&self, client: &GatewayClient) -> Result<(), GatewayError> {
		self.calls.lock().unwrap().push(GatewayCall::Add {
			label: client.label.clone(),
			secret: client.secret.expose().to_string(),
			flow: client.flow.clone(),
		});
		if self.fail_add.load(Ordering::SeqCst) {
			return Err(exhausted("add refused"));
		}
		Ok(())
	}

	async fn remove(&self, label: &str) -> Result<(), GatewayError> {
		self
			.calls
			.lock()
			.unwrap()
			.push(GatewayCall::Remove(label.to_string()));
		if self.fail_remove.load(Ordering::SeqCst) {
			return Err(exhausted("remove refused"));
		}
		Ok(())
	}
}

/// Answers from a fixed table; ids missing from the table are members.
#[derive(Default)]
pub struct MockOracle {
	answers: HashMap<IdentityId, Option<Membership>>,
	queries: Mutex<Vec<IdentityId>>,
}

impl MockOracle {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn not_member(mut self, id: i64) -> Self {
		self.answers.insert(IdentityId::new(id), Some(Membership::NotMember));
		self
	}

	pub fn failing_for(mut self, id: i64) -> Self {
		self.answers.insert(IdentityId::new(id), None);
		self
	}

	pub fn queries(&self) -> Vec<IdentityId> {
		self.queries.lock().unwrap().clone()
	}
}

#[async_trait]
impl MembershipOracle for MockOracle {
	async fn is_member(&self, id: IdentityId) -> Result<Membership, OracleError> {
		self.queries.lock().unwrap().push(id);
		match self.answers.get(&id) {
			Some(Some(membership)) => Ok(*membership),
			Some(None) => Err(OracleError::Query("Bad Request: chat not found".to_string())),
			None => Ok(Membership::Member),
		}
	}
}

#[derive(Default)]
pub struct MockSink {
	sent: Mutex<Vec<(IdentityId, String)>>,
	fail: bool,
}

impl MockSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing() -> Self {
		Self {
			sent: Mutex::new(Vec::new()),
			fail: true,
		}
	}

	pub fn sent(&self) -> Vec<(IdentityId, String)> {
		self.sent.lock().unwrap().clone()
	}
}

#[async_trait]
impl NotificationSink for MockSink {
	async fn send(&self, id: IdentityId, text: &str) -> Result<(), NotifyError> {
		self.sent.lock().unwrap().push((id, text.to_string()));
		if self.fail {
			return Err(NotifyError::Delivery("Forbidden: bot was blocked by the user".to_string()));
		}
		Ok(())
	}
}
