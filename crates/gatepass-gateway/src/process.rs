// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Child-process plumbing for the gateway CLI and its service manager.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, trace};

use crate::error::{GatewayError, Result};

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
	pub success: bool,
	pub stdout: String,
	pub stderr: String,
}

impl CommandOutput {
	pub fn combined(&self) -> String {
		match (self.stdout.is_empty(), self.stderr.is_empty()) {
			(false, false) => format!("{}\n{}", self.stdout, self.stderr),
			(false, true) => self.stdout.clone(),
			_ => self.stderr.clone(),
		}
	}
}

/// Runs external programs. Abstracted so the strategies can be tested
/// without an `xray` or `systemctl` binary on the host.
#[async_trait]
pub trait CommandRunner: Send + Sync {
	async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
pub struct TokioCommandRunner {
	timeout: Duration,
}

impl TokioCommandRunner {
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

	pub fn new(timeout: Duration) -> Self {
		Self { timeout }
	}
}

impl Default for TokioCommandRunner {
	fn default() -> Self {
		Self::new(Self::DEFAULT_TIMEOUT)
	}
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
	async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
		let mut cmd = Command::new(program);
		cmd.args(args).kill_on_drop(true);

		trace!(program, subcommand = %subcommand(args), "running command");

		let output = tokio::time::timeout(self.timeout, cmd.output())
			.await
			.map_err(|_| GatewayError::Timeout {
				program: program.to_string(),
				after: self.timeout,
			})?
			.map_err(|e| GatewayError::Spawn {
				program: program.to_string(),
				source: e,
			})?;

		let result = CommandOutput {
			success: output.status.success(),
			stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
			stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
		};
		debug!(program, success = result.success, "command finished");
		Ok(result)
	}
}

/// Leading non-flag arguments. Flags can carry client secrets and are left
/// out of logs.
fn subcommand(args: &[String]) -> String {
	args
		.iter()
		.take_while(|arg| !arg.starts_with('-'))
		.map(String::as_str)
		.collect::<Vec<_>>()
		.join(" ")
}

/// Whole-process control over the gateway. A restart drops every active
/// connection, not just the one being provisioned.
#[async_trait]
pub trait GatewayProcess: Send + Sync {
	async fn restart(&self) -> Result<()>;
}

/// Restarts the gateway through `systemctl restart <service>`.
pub struct SystemdGatewayProcess {
	runner: Arc<dyn CommandRunner>,
	service: String,
}

impl SystemdGatewayProcess {
	pub fn new(runner: Arc<dyn CommandRunner>, service: impl Into<String>) -> Self {
		Self {
			runner,
			service: service.into(),
		}
	}
}

#[async_trait]
impl GatewayProcess for SystemdGatewayProcess {
	#[tracing::instrument(skip(self), fields(service = %self.service))]
	async fn restart(&self) -> Result<()> {
		let args = vec!["restart".to_string(), self.service.clone()];
		let output = self.runner.run("systemctl", &args).await?;
		if !output.success {
			return Err(GatewayError::Restart(output.combined()));
		}
		info!(service = %self.service, "gateway restarted");
		Ok(())
	}
}


#[cfg(test)]
mod tests {
	use super::testing::MockRunner;
	use super::*;

	#[test]
	fn test_subcommand_omits_flags() {
		let args: Vec<String> = [
			"api",
			"inbounduser",
			"add",
			"--server=127.0.0.1:10085",
			"-tag=vless_tls",
			r#"-user={"id":"11111111-2222-4333-8444-555555555555"}"#,
		]
		.iter()
		.map(|s| s.to_string())
		.collect();
		let summary = subcommand(&args);
		assert_eq!(summary, "api inbounduser add");
		assert!(!summary.contains("11111111"));
	}

	#[test]
	fn test_combined_output() {
		let out = CommandOutput {
			success: false,
			stdout: "a".to_string(),
			stderr: "b".to_string(),
		};
		assert_eq!(out.combined(), "a\nb");
		assert_eq!(CommandOutput::default().combined(), "");
	}

	#[tokio::test]
	async fn test_systemd_restart_invocation() {
		let runner = Arc::new(MockRunner::succeeding());
		let process = SystemdGatewayProcess::new(runner.clone(), "xray");

		process.restart().await.unwrap();

		assert_eq!(
			runner.calls(),
			vec![(
				"systemctl".to_string(),
				vec!["restart".to_string(), "xray".to_string()]
			)]
		);
	}

	#[tokio::test]
	async fn test_systemd_restart_failure() {
		let runner = Arc::new(MockRunner::failing("Unit xray.service not found."));
		let process = SystemdGatewayProcess::new(runner, "xray");

		let err = process.restart().await.unwrap_err();
		assert!(matches!(err, GatewayError::Restart(msg) if msg.contains("not found")));
	}

	#[tokio::test]
	async fn test_tokio_runner_missing_binary() {
		let runner = TokioCommandRunner::default();
		let err = runner
			.run("gatepass-definitely-missing-binary", &[])
			.await
			.unwrap_err();
		assert!(matches!(err, GatewayError::Spawn { .. }));
	}
}
