// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wiring from resolved configuration to running services.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use gatepass_access::{AccessProfile, AccessService, ReconcileSchedule, Reconciler};
use gatepass_config::{GatepassConfig, GatewayConfig, ReconcileConfig};
use gatepass_core::{Endpoint, IdentityRecord, LabelScheme};
use gatepass_gateway::{
	bootstrap_api, CommandRunner, ControlChannelStrategy, DeclarativeConfigStrategy,
	GatewayProvisioner, ProvisioningStrategy, SystemdGatewayProcess, TokioCommandRunner,
};
use gatepass_store::{create_pool, run_migrations, IdentityRepository};
use gatepass_telegram::{messages, BotClient, BotNotifier, BotPoller, ChannelOracle, CommandHandler};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Everything the subcommands share.
pub struct App {
	pub config: GatepassConfig,
	pub access: Arc<AccessService>,
	pub control: Arc<ControlChannelStrategy>,
	pub bot: BotClient,
}

impl App {
	pub async fn build(config: GatepassConfig) -> Result<Self> {
		if let Some(dir) = config.database.data_dir() {
			tokio::fs::create_dir_all(&dir)
				.await
				.with_context(|| format!("creating data directory {}", dir.display()))?;
		}

		let pool = create_pool(&config.database.url)
			.await
			.with_context(|| format!("opening identity store {}", config.database.url))?;
		run_migrations(&pool)
			.await
			.context("running identity store migrations")?;

		let (provisioner, control) = build_provisioner(&config.gateway);
		info!(strategies = ?provisioner.strategy_names(), "gateway provisioner ready");

		let access = Arc::new(AccessService::new(
			Arc::new(IdentityRepository::new(pool)),
			Arc::new(provisioner),
			access_profile(&config),
		));

		let bot = BotClient::new(config.telegram.bot_token.clone())
			.context("building Telegram client")?
			.with_base_url(config.telegram.api_base_url.clone());

		Ok(Self {
			config,
			access,
			control,
			bot,
		})
	}

	/// Adds the control API to the gateway config if configured to, then
	/// reports whether the control channel answers. Neither step is fatal.
	pub async fn prepare_gateway(&self) {
		let gateway = &self.config.gateway;
		if gateway.bootstrap_api {
			match bootstrap_api(&gateway.config_path, &gateway.api_address).await {
				Ok(true) => {}
				Ok(false) => info!("gateway config already exposes the control API"),
				Err(e) => warn!(
					path = %gateway.config_path.display(),
					error = %e,
					"could not ensure control API in gateway config"
				),
			}
		}

		match self.control.probe().await {
			Ok(_) => info!(address = %gateway.api_address, "gateway control channel reachable"),
			Err(e) => warn!(
				address = %gateway.api_address,
				error = %e,
				"gateway control channel unreachable; changes will go through the config file"
			),
		}
	}

	pub fn reconciler(&self) -> Result<Reconciler> {
		let schedule = schedule(&self.config.reconcile)?;
		Ok(Reconciler::new(
			self.access.clone(),
			Arc::new(ChannelOracle::new(
				self.bot.clone(),
				self.config.telegram.channel.clone(),
			)),
			Arc::new(BotNotifier::new(self.bot.clone())),
			schedule,
			messages::revoked(&self.config.telegram.channel),
		))
	}

	/// Runs until `shutdown` resolves, then stops the poller and the
	/// reconciliation loop.
	pub async fn serve<F>(self, shutdown: F) -> Result<()>
	where
		F: std::future::Future<Output = ()>,
	{
		self.prepare_gateway().await;

		let reconciler = if self.config.reconcile.enabled {
			Some(Arc::new(self.reconciler()?).start())
		} else {
			info!("reconciliation loop disabled");
			None
		};

		let telegram = &self.config.telegram;
		let handler = Arc::new(CommandHandler::new(
			Arc::new(ChannelOracle::new(self.bot.clone(), telegram.channel.clone())),
			self.access.clone(),
			telegram.channel.clone(),
		));
		let poller = BotPoller::new(
			self.bot.clone(),
			handler,
			Duration::from_secs(telegram.poll_timeout_secs),
			telegram.max_concurrent_handlers,
		);

		let cancel = CancellationToken::new();
		let poll_task = tokio::spawn({
			let cancel = cancel.clone();
			async move { poller.run(cancel).await }
		});

		info!(channel = %telegram.channel, "gatepass running");
		shutdown.await;
		info!("Received shutdown signal");

		cancel.cancel();
		if let Err(e) = poll_task.await {
			error!(error = %e, "bot poller ended abnormally");
		}
		if let Some(handle) = reconciler {
			handle.shutdown().await;
		}

		info!("gatepass shutdown complete");
		Ok(())
	}

	/// One reconciliation pass, for `gatepass scan`.
	pub async fn scan(&self) -> Result<()> {
		let report = self.reconciler()?.run_once().await;
		if report.listing_failed {
			anyhow::bail!("could not list stored identities");
		}
		println!(
			"scanned {} retained {} revoked {} skipped {} notify_failures {}",
			report.scanned, report.retained, report.revoked, report.skipped, report.notify_failures
		);
		Ok(())
	}

	pub async fn list(&self) -> Result<()> {
		let records = self
			.access
			.list_all()
			.await
			.context("listing stored identities")?;
		for record in &records {
			println!("{}", format_record(record, &self.access.label_for(record.identity_id)));
		}
		Ok(())
	}
}

/// Control channel first, then the config file plus a restart.
pub fn build_provisioner(gateway: &GatewayConfig) -> (GatewayProvisioner, Arc<ControlChannelStrategy>) {
	let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner::new(TokioCommandRunner::DEFAULT_TIMEOUT));

	let control = Arc::new(ControlChannelStrategy::new(
		runner.clone(),
		gateway.xray_binary.clone(),
		gateway.api_address.clone(),
		gateway.inbound_tag.clone(),
	));
	let declarative = Arc::new(DeclarativeConfigStrategy::new(
		gateway.config_path.clone(),
		gateway.inbound_tag.clone(),
		Arc::new(SystemdGatewayProcess::new(runner, gateway.service_name.clone())),
	));

	let strategies: Vec<Arc<dyn ProvisioningStrategy>> = vec![control.clone(), declarative];
	(GatewayProvisioner::new(strategies), control)
}

pub fn access_profile(config: &GatepassConfig) -> AccessProfile {
	AccessProfile {
		labels: LabelScheme::new(config.gateway.label_realm.clone()),
		flow: config.gateway.flow.clone(),
		endpoint: Endpoint::new(config.endpoint.domain.clone(), config.endpoint.port),
	}
}

pub fn schedule(reconcile: &ReconcileConfig) -> Result<ReconcileSchedule> {
	ReconcileSchedule::new(reconcile.unit(), reconcile.min_units, reconcile.max_units)
		.context("invalid reconciliation schedule")
}

/// One `gatepass list` line. Credentials are never printed.
pub fn format_record(record: &IdentityRecord, label: &str) -> String {
	format!(
		"{}\t{}\t{}\t{}",
		record.identity_id,
		label,
		record.display_label,
		record.created_at.to_rfc3339()
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use gatepass_common_secret::SecretString;
	use gatepass_config::{
		DatabaseConfig, EndpointConfig, LoggingConfig, TelegramConfig,
	};
	use gatepass_core::{Credential, IdentityId};

	fn config(dir: &std::path::Path) -> GatepassConfig {
		GatepassConfig {
			telegram: TelegramConfig {
				bot_token: SecretString::new("1:abc".to_string()),
				channel: "@art_rom".to_string(),
				api_base_url: "http://127.0.0.1:1".to_string(),
				poll_timeout_secs: 1,
				max_concurrent_handlers: 2,
			},
			gateway: GatewayConfig {
				label_realm: "edge".to_string(),
				config_path: dir.join("config.json"),
				..Default::default()
			},
			endpoint: EndpointConfig {
				domain: "vpn.example.com".to_string(),
				port: 8443,
			},
			database: DatabaseConfig {
				url: format!("sqlite:{}", dir.join("data/users.db").display()),
			},
			reconcile: ReconcileConfig::default(),
			logging: LoggingConfig::default(),
		}
	}

	#[test]
	fn test_provisioner_order() {
		let (provisioner, _) = build_provisioner(&GatewayConfig::default());
		assert_eq!(
			provisioner.strategy_names(),
			vec![ControlChannelStrategy::NAME, DeclarativeConfigStrategy::NAME]
		);
	}

	#[test]
	fn test_access_profile_from_config() {
		let dir = tempfile::tempdir().unwrap();
		let profile = access_profile(&config(dir.path()));
		assert_eq!(profile.labels.label_for(IdentityId::new(9)), "user_9@edge");
		assert_eq!(profile.endpoint.port, 8443);
	}

	#[test]
	fn test_schedule_rejects_inverted_bounds() {
		let reconcile = ReconcileConfig {
			min_units: 5,
			max_units: 2,
			..Default::default()
		};
		assert!(schedule(&reconcile).is_err());
	}

	#[test]
	fn test_format_record_omits_credential() {
		let credential = Credential::from_stored("11111111-2222-4333-8444-555555555555");
		let record = IdentityRecord::new(IdentityId::new(7), "ann", credential);
		let line = format_record(&record, "user_7@edge");
		assert!(line.starts_with("7\tuser_7@edge\tann\t"));
		assert!(!line.contains("11111111"));
	}

	#[tokio::test]
	async fn test_build_creates_data_dir_and_lists_empty() {
		let dir = tempfile::tempdir().unwrap();
		let app = App::build(config(dir.path())).await.unwrap();
		assert!(dir.path().join("data").is_dir());
		assert!(app.access.list_all().await.unwrap().is_empty());
		app.list().await.unwrap();
	}
}
