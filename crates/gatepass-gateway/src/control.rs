// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Live provisioning through the gateway's control API.
//!
//! The `xray api inbounduser` subcommands talk to the running gateway over
//! its local API listener. Changes apply immediately and nothing restarts,
//! which makes this the preferred strategy. It fails whenever the gateway
//! process is down or still starting.

use std::sync::Arc;

use async_trait::async_trait;
use gatepass_core::GatewayClient;
use tracing::{debug, instrument};

use crate::error::{GatewayError, Result};
use crate::process::CommandRunner;
use crate::strategy::ProvisioningStrategy;

pub struct ControlChannelStrategy {
	runner: Arc<dyn CommandRunner>,
	binary: String,
	api_address: String,
	inbound_tag: String,
}

impl ControlChannelStrategy {
	pub const NAME: &'static str = "control-channel";

	pub fn new(
		runner: Arc<dyn CommandRunner>,
		binary: impl Into<String>,
		api_address: impl Into<String>,
		inbound_tag: impl Into<String>,
	) -> Self {
		Self {
			runner,
			binary: binary.into(),
			api_address: api_address.into(),
			inbound_tag: inbound_tag.into(),
		}
	}

	/// Lists the users on the inbound. Used at startup to report whether the
	/// control channel is reachable.
	#[instrument(skip(self), fields(address = %self.api_address))]
	pub async fn probe(&self) -> Result<String> {
		let args = query_args(&self.api_address, &self.inbound_tag);
		let output = self.runner.run(&self.binary, &args).await?;
		if !output.success {
			return Err(GatewayError::ControlChannel {
				action: "query",
				message: output.combined(),
			});
		}
		Ok(output.stdout)
	}
}

#[async_trait]
impl ProvisioningStrategy for ControlChannelStrategy {
	fn name(&self) -> &'static str {
		Self::NAME
	}

	#[instrument(skip(self, client), fields(label = %client.label))]
	async fn add(&self, client: &GatewayClient) -> Result<()> {
		let args = add_args(&self.api_address, &self.inbound_tag, client);
		let output = self.runner.run(&self.binary, &args).await?;
		if !output.success {
			return Err(GatewayError::ControlChannel {
				action: "add",
				message: output.combined(),
			});
		}
		debug!(label = %client.label, "client added via control channel");
		Ok(())
	}

	#[instrument(skip(self))]
	async fn remove(&self, label: &str) -> Result<()> {
		let args = remove_args(&self.api_address, &self.inbound_tag, label);
		let output = self.runner.run(&self.binary, &args).await?;
		let combined = output.combined();
		if output.success || is_not_found(&combined) {
			debug!(label, "client removed via control channel");
			return Ok(());
		}
		Err(GatewayError::ControlChannel {
			action: "remove",
			message: combined,
		})
	}
}

fn is_not_found(output: &str) -> bool {
	output.to_ascii_lowercase().contains("not found")
}

fn add_args(address: &str, tag: &str, client: &GatewayClient) -> Vec<String> {
	vec![
		"api".to_string(),
		"inbounduser".to_string(),
		"add".to_string(),
		format!("--server={address}"),
		format!("-tag={tag}"),
		format!("-user={}", client.to_json()),
	]
}

fn remove_args(address: &str, tag: &str, label: &str) -> Vec<String> {
	vec![
		"api".to_string(),
		"inbounduser".to_string(),
		"remove".to_string(),
		format!("--server={address}"),
		format!("-tag={tag}"),
		format!("-email={label}"),
	]
}

fn query_args(address: &str, tag: &str) -> Vec<String> {
	vec![
		"api".to_string(),
		"inbounduser".to_string(),
		format!("--server={address}"),
		format!("-tag={tag}"),
	]
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::process::testing::MockRunner;
	use crate::process::CommandOutput;
	use gatepass_core::Credential;

	fn strategy(runner: Arc<MockRunner>) -> ControlChannelStrategy {
		ControlChannelStrategy::new(runner, "xray", "127.0.0.1:10085", "vless_tls")
	}

	fn client() -> GatewayClient {
		GatewayClient::new(
			"user_42@myserver",
			Credential::from_stored("c0ffee00-0000-4000-8000-000000000042"),
			"xtls-rprx-vision",
		)
	}

	#[tokio::test]
	async fn test_add_builds_inbounduser_command() {
		let runner = Arc::new(MockRunner::succeeding());
		strategy(runner.clone()).add(&client()).await.unwrap();

		let calls = runner.calls();
		assert_eq!(calls.len(), 1);
		let (program, args) = &calls[0];
		assert_eq!(program, "xray");
		assert_eq!(&args[..5], &[
			"api",
			"inbounduser",
			"add",
			"--server=127.0.0.1:10085",
			"-tag=vless_tls"
		]);
		let user: serde_json::Value =
			serde_json::from_str(args[5].strip_prefix("-user=").unwrap()).unwrap();
		assert_eq!(user["email"], "user_42@myserver");
		assert_eq!(user["id"], "c0ffee00-0000-4000-8000-000000000042");
		assert_eq!(user["flow"], "xtls-rprx-vision");
	}

	#[tokio::test]
	async fn test_add_failure_carries_output() {
		let runner = Arc::new(MockRunner::failing("failed to dial 127.0.0.1:10085"));
		let err = strategy(runner).add(&client()).await.unwrap_err();
		match err {
			GatewayError::ControlChannel { action, message } => {
				assert_eq!(action, "add");
				assert!(message.contains("failed to dial"));
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[tokio::test]
	async fn test_remove_builds_command() {
		let runner = Arc::new(MockRunner::succeeding());
		strategy(runner.clone())
			.remove("user_42@myserver")
			.await
			.unwrap();

		let (_, args) = &runner.calls()[0];
		assert_eq!(args[2], "remove");
		assert_eq!(args[5], "-email=user_42@myserver");
	}

	#[tokio::test]
	async fn test_remove_not_found_is_success() {
		let runner = Arc::new(MockRunner::failing("user user_42@myserver Not Found"));
		assert!(strategy(runner).remove("user_42@myserver").await.is_ok());
	}

	#[tokio::test]
	async fn test_remove_other_failure_errors() {
		let runner = Arc::new(MockRunner::failing("connection refused"));
		assert!(strategy(runner).remove("user_42@myserver").await.is_err());
	}

	#[tokio::test]
	async fn test_probe() {
		let runner = Arc::new(MockRunner::succeeding());
		runner.push(Ok(CommandOutput {
			success: true,
			stdout: "{\"users\":[]}".to_string(),
			stderr: String::new(),
		}));
		let out = strategy(runner.clone()).probe().await.unwrap();
		assert_eq!(out, "{\"users\":[]}");
		assert_eq!(runner.calls()[0].1, vec![
			"api",
			"inbounduser",
			"--server=127.0.0.1:10085",
			"-tag=vless_tls"
		]);
	}
}
