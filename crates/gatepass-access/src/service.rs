// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioning and deprovisioning orchestrators.
//!
//! Neither flow is transactional. Provisioning writes the gateway first and
//! the store second, compensating with a gateway remove when the store write
//! fails. Deprovisioning runs both removals unconditionally. Divergence left
//! behind by a failed step is tolerated: a stored record whose owner lost
//! membership is cleaned up by the next reconciliation cycle, while an orphan
//! gateway entry with no record is only logged.

use std::sync::Arc;

use gatepass_core::{
	ConnectionDescriptor, Credential, Endpoint, GatewayClient, IdentityId, IdentityRecord,
	LabelScheme,
};
use gatepass_gateway::CredentialProvisioner;
use gatepass_store::IdentityStore;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::error::Result;

/// Per-deployment constants that shape gateway entries and descriptors.
#[derive(Debug, Clone)]
pub struct AccessProfile {
	pub labels: LabelScheme,
	pub flow: String,
	pub endpoint: Endpoint,
}

/// Outcome of [`AccessService::get_or_create`].
#[derive(Debug, Clone)]
pub struct Provisioned {
	pub credential: Credential,
	pub descriptor: ConnectionDescriptor,
	/// `false` when an existing record was returned unchanged.
	pub created: bool,
}

pub struct AccessService {
	store: Arc<dyn IdentityStore>,
	provisioner: Arc<dyn CredentialProvisioner>,
	profile: AccessProfile,
	// Held across each whole get-or-create and remove sequence so two checks
	// for one identity cannot both miss the store and add the same label.
	mutation_lock: Mutex<()>,
}

impl AccessService {
	pub fn new(
		store: Arc<dyn IdentityStore>,
		provisioner: Arc<dyn CredentialProvisioner>,
		profile: AccessProfile,
	) -> Self {
		Self {
			store,
			provisioner,
			profile,
			mutation_lock: Mutex::new(()),
		}
	}

	pub fn profile(&self) -> &AccessProfile {
		&self.profile
	}

	pub fn label_for(&self, id: IdentityId) -> String {
		self.profile.labels.label_for(id)
	}

	fn descriptor(&self, id: IdentityId, credential: &Credential) -> ConnectionDescriptor {
		ConnectionDescriptor::vless(id, credential, &self.profile.endpoint, &self.profile.flow)
	}

	/// Returns the identity's credential, provisioning one if it has none.
	///
	/// The caller must already have confirmed eligibility. An existing
	/// credential is returned as-is and never regenerated. A new one is made
	/// live on the gateway before it is persisted.
	///
	/// # Errors
	/// - `AccessError::Gateway` if the gateway add failed; nothing was stored.
	/// - `AccessError::Store` if the lookup failed, or if the record could not
	///   be persisted after the gateway add (a compensating remove has been
	///   attempted by then).
	#[instrument(skip(self, display_label), fields(identity_id = %id))]
	pub async fn get_or_create(&self, id: IdentityId, display_label: &str) -> Result<Provisioned> {
		let _guard = self.mutation_lock.lock().await;

		if let Some(existing) = self.store.get_by_identity(id).await? {
			debug!(identity_id = %id, "returning existing credential");
			let descriptor = self.descriptor(id, &existing.credential);
			return Ok(Provisioned {
				credential: existing.credential,
				descriptor,
				created: false,
			});
		}

		let credential = Credential::generate();
		let label = self.label_for(id);
		let client = GatewayClient::new(label.clone(), credential.clone(), self.profile.flow.clone());

		if let Err(e) = self.provisioner.add(&client).await {
			error!(identity_id = %id, label = %label, error = %e, "gateway add failed");
			return Err(e.into());
		}

		let record = IdentityRecord::new(id, display_label, credential.clone());
		if let Err(e) = self.store.create(&record).await {
			error!(identity_id = %id, label = %label, error = %e, "storing new record failed");
			match self.provisioner.remove(&label).await {
				Ok(()) => warn!(identity_id = %id, label = %label, "gateway entry rolled back"),
				Err(comp) => error!(
					identity_id = %id,
					label = %label,
					error = %comp,
					"rollback failed; gateway entry has no owning record"
				),
			}
			return Err(e.into());
		}

		info!(identity_id = %id, label = %label, "access provisioned");
		let descriptor = self.descriptor(id, &credential);
		Ok(Provisioned {
			credential,
			descriptor,
			created: true,
		})
	}

	/// Revokes an identity's access. Best-effort: both the gateway remove
	/// and the store delete always run, failures are logged, and the call
	/// itself never fails.
	#[instrument(skip(self), fields(identity_id = %id))]
	pub async fn remove(&self, id: IdentityId) {
		let _guard = self.mutation_lock.lock().await;
		let label = self.label_for(id);

		if let Err(e) = self.provisioner.remove(&label).await {
			warn!(identity_id = %id, label = %label, error = %e, "gateway remove failed");
		}

		match self.store.delete(id).await {
			Ok(existed) => {
				info!(identity_id = %id, label = %label, had_record = existed, "access revoked")
			}
			Err(e) => warn!(identity_id = %id, error = %e, "deleting record failed"),
		}
	}

	/// Point-in-time snapshot of every stored record.
	pub async fn list_all(&self) -> Result<Vec<IdentityRecord>> {
		Ok(self.store.list_all().await?)
	}
}
