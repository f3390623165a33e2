// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ordered provisioning strategies.

use std::sync::Arc;

use async_trait::async_trait;
use gatepass_core::GatewayClient;
use tracing::{debug, error, instrument, warn};

use crate::error::{GatewayError, Result, StrategyFailure};

/// One way of applying a client change to the gateway.
#[async_trait]
pub trait ProvisioningStrategy: Send + Sync {
	fn name(&self) -> &'static str;
	async fn add(&self, client: &GatewayClient) -> Result<()>;
	/// Removing a label the gateway does not know is a success.
	async fn remove(&self, label: &str) -> Result<()>;
}

/// What the access engine sees of the gateway.
#[async_trait]
pub trait CredentialProvisioner: Send + Sync {
	async fn add(&self, client: &GatewayClient) -> Result<()>;
	async fn remove(&self, label: &str) -> Result<()>;
}

/// Tries each strategy in order until one succeeds.
///
/// Failures of earlier strategies are logged and swallowed when a later one
/// succeeds. Only when every strategy fails does the caller see an error,
/// [`GatewayError::Exhausted`], naming each failure.
pub struct GatewayProvisioner {
	strategies: Vec<Arc<dyn ProvisioningStrategy>>,
}

impl GatewayProvisioner {
	pub fn new(strategies: Vec<Arc<dyn ProvisioningStrategy>>) -> Self {
		Self { strategies }
	}

	pub fn strategy_names(&self) -> Vec<&'static str> {
		self.strategies.iter().map(|s| s.name()).collect()
	}
}

enum Op<'a> {
	Add(&'a GatewayClient),
	Remove(&'a str),
}

impl Op<'_> {
	fn label(&self) -> &str {
		match self {
			Op::Add(client) => &client.label,
			Op::Remove(label) => label,
		}
	}

	fn kind(&self) -> &'static str {
		match self {
			Op::Add(_) => "add",
			Op::Remove(_) => "remove",
		}
	}
}

impl GatewayProvisioner {
	async fn run(&self, op: Op<'_>) -> Result<()> {
		let mut failures = Vec::new();

		for strategy in &self.strategies {
			let result = match &op {
				Op::Add(client) => strategy.add(client).await,
				Op::Remove(label) => strategy.remove(label).await,
			};

			match result {
				Ok(()) => {
					debug!(
						strategy = strategy.name(),
						op = op.kind(),
						label = op.label(),
						"gateway change applied"
					);
					return Ok(());
				}
				Err(e) => {
					warn!(
						strategy = strategy.name(),
						op = op.kind(),
						label = op.label(),
						error = %e,
						"provisioning strategy failed"
					);
					failures.push(StrategyFailure {
						strategy: strategy.name(),
						message: e.to_string(),
					});
				}
			}
		}

		error!(
			op = op.kind(),
			label = op.label(),
			attempts = failures.len(),
			"every provisioning strategy failed"
		);
		Err(GatewayError::Exhausted(failures))
	}
}

#[async_trait]
impl CredentialProvisioner for GatewayProvisioner {
	#[instrument(skip(self, client), fields(label = %client.label))]
	async fn add(&self, client: &GatewayClient) -> Result<()> {
		self.run(Op::Add(client)).await
	}

	#[instrument(skip(self))]
	async fn remove(&self, label: &str) -> Result<()> {
		self.run(Op::Remove(label)).await
	}
}
