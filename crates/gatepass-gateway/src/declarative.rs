// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioning by editing the gateway's static configuration.
//!
//! Always available as long as the config file is writable, but a change only
//! takes effect after a full gateway restart, which drops every active
//! connection. It sits last in the strategy chain.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use gatepass_core::GatewayClient;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::document;
use crate::error::Result;
use crate::process::GatewayProcess;
use crate::strategy::ProvisioningStrategy;

pub struct DeclarativeConfigStrategy {
	path: PathBuf,
	inbound_tag: String,
	process: Arc<dyn GatewayProcess>,
	// Serializes read-modify-write cycles from this process. Edits made by
	// other processes are not guarded.
	edit_lock: Mutex<()>,
}

impl DeclarativeConfigStrategy {
	pub const NAME: &'static str = "declarative-config";

	pub fn new(
		path: impl Into<PathBuf>,
		inbound_tag: impl Into<String>,
		process: Arc<dyn GatewayProcess>,
	) -> Self {
		Self {
			path: path.into(),
			inbound_tag: inbound_tag.into(),
			process,
			edit_lock: Mutex::new(()),
		}
	}

	/// A failed restart still leaves the new config on disk, where it takes
	/// effect the next time the gateway starts.
	async fn apply(&self) {
		if let Err(e) = self.process.restart().await {
			warn!(
				path = %self.path.display(),
				error = %e,
				"gateway restart failed; config change applies on next restart"
			);
		}
	}
}

#[async_trait]
impl ProvisioningStrategy for DeclarativeConfigStrategy {
	fn name(&self) -> &'static str {
		Self::NAME
	}

	#[instrument(skip(self, client), fields(label = %client.label, path = %self.path.display()))]
	async fn add(&self, client: &GatewayClient) -> Result<()> {
		{
			let _guard = self.edit_lock.lock().await;
			let mut doc = document::load(&self.path).await?;
			document::add_client(&mut doc, &self.inbound_tag, client)?;
			document::save(&self.path, &doc).await?;
		}
		info!(label = %client.label, "client written to gateway config");

		self.apply().await;
		Ok(())
	}

	#[instrument(skip(self), fields(path = %self.path.display()))]
	async fn remove(&self, label: &str) -> Result<()> {
		let changed = {
			let _guard = self.edit_lock.lock().await;
			let mut doc = document::load(&self.path).await?;
			let changed = document::remove_client(&mut doc, &self.inbound_tag, label)?;
			if changed {
				document::save(&self.path, &doc).await?;
			}
			changed
		};

		if !changed {
			debug!(label, "client absent from gateway config");
			return Ok(());
		}

		info!(label, "client removed from gateway config");
		self.apply().await;
		Ok(())
	}
}
