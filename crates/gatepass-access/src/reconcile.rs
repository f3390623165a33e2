// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Periodic re-validation of every stored identity.
//!
//! The loop sleeps a jittered interval, then walks one snapshot of the store
//! sequentially, asking the membership oracle about each identity. Members
//! are left alone. Non-members are deprovisioned and told why. An oracle
//! error skips that identity until the next cycle. The first scan happens
//! only after the first sleep.

use std::sync::Arc;
use std::time::Duration;

use gatepass_core::{Membership, MembershipOracle, NotificationSink};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{AccessError, Result};
use crate::service::AccessService;

/// Sleep between cycles: a whole number of `unit`s drawn uniformly from
/// `min_units..=max_units`, redrawn every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSchedule {
	unit: Duration,
	min_units: u32,
	max_units: u32,
}

impl ReconcileSchedule {
	pub fn new(unit: Duration, min_units: u32, max_units: u32) -> Result<Self> {
		if unit.is_zero() {
			return Err(AccessError::InvalidSchedule("unit must be non-zero".to_string()));
		}
		if min_units == 0 || min_units > max_units {
			return Err(AccessError::InvalidSchedule(format!(
				"expected 1 <= min_units <= max_units, got {min_units}..={max_units}"
			)));
		}
		if unit.checked_mul(max_units).is_none() {
			return Err(AccessError::InvalidSchedule(format!(
				"{max_units} units of {unit:?} overflows a duration"
			)));
		}
		Ok(Self {
			unit,
			min_units,
			max_units,
		})
	}

	pub fn next_delay(&self) -> Duration {
		self.unit * fastrand::u32(self.min_units..=self.max_units)
	}

	pub fn bounds(&self) -> (Duration, Duration) {
		(self.unit * self.min_units, self.unit * self.max_units)
	}
}

impl Default for ReconcileSchedule {
	fn default() -> Self {
		Self {
			unit: Duration::from_secs(60 * 60),
			min_units: 1,
			max_units: 23,
		}
	}
}

/// Tally of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
	pub scanned: usize,
	pub retained: usize,
	pub revoked: usize,
	pub skipped: usize,
	pub notify_failures: usize,
	/// Set when the snapshot could not be taken and nothing was scanned.
	pub listing_failed: bool,
	/// Set when shutdown interrupted the pass between identities.
	pub interrupted: bool,
}

pub struct Reconciler {
	access: Arc<AccessService>,
	oracle: Arc<dyn MembershipOracle>,
	sink: Arc<dyn NotificationSink>,
	schedule: ReconcileSchedule,
	revocation_text: String,
}

impl Reconciler {
	pub fn new(
		access: Arc<AccessService>,
		oracle: Arc<dyn MembershipOracle>,
		sink: Arc<dyn NotificationSink>,
		schedule: ReconcileSchedule,
		revocation_text: impl Into<String>,
	) -> Self {
		Self {
			access,
			oracle,
			sink,
			schedule,
			revocation_text: revocation_text.into(),
		}
	}

	/// Runs one full pass now.
	pub async fn run_once(&self) -> CycleReport {
		self.run_cycle(&CancellationToken::new()).await
	}

	/// Runs one pass, stopping early between identities once `cancel` fires.
	#[instrument(skip(self, cancel))]
	pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleReport {
		let mut report = CycleReport::default();

		let records = match self.access.list_all().await {
			Ok(records) => records,
			Err(e) => {
				error!(error = %e, "could not list identities; skipping cycle");
				report.listing_failed = true;
				return report;
			}
		};

		for record in records {
			if cancel.is_cancelled() {
				report.interrupted = true;
				break;
			}

			let id = record.identity_id;
			report.scanned += 1;

			match self.oracle.is_member(id).await {
				Ok(Membership::Member) => {
					report.retained += 1;
				}
				Ok(Membership::NotMember) => {
					info!(identity_id = %id, "membership lost; revoking access");
					self.access.remove(id).await;
					report.revoked += 1;

					if let Err(e) = self.sink.send(id, &self.revocation_text).await {
						warn!(identity_id = %id, error = %e, "revocation notice not delivered");
						report.notify_failures += 1;
					}
				}
				Err(e) => {
					warn!(identity_id = %id, error = %e, "membership check failed; retrying next cycle");
					report.skipped += 1;
				}
			}
		}

		info!(
			scanned = report.scanned,
			retained = report.retained,
			revoked = report.revoked,
			skipped = report.skipped,
			notify_failures = report.notify_failures,
			interrupted = report.interrupted,
			"reconciliation cycle finished"
		);
		report
	}

	/// Spawns the background loop. It runs until [`ReconcilerHandle::shutdown`].
	pub fn start(self: Arc<Self>) -> ReconcilerHandle {
		let cancel = CancellationToken::new();
		let token = cancel.clone();
		let (min, max) = self.schedule.bounds();
		info!(
			min_secs = min.as_secs(),
			max_secs = max.as_secs(),
			"reconciliation loop started"
		);

		let handle = tokio::spawn(async move {
			loop {
				let delay = self.schedule.next_delay();
				debug!(delay_secs = delay.as_secs(), "next reconciliation scheduled");

				tokio::select! {
					_ = tokio::time::sleep(delay) => {
						self.run_cycle(&token).await;
					}
					_ = token.cancelled() => {
						info!("Shutting down reconciliation loop");
						break;
					}
				}
			}
		});

		ReconcilerHandle { cancel, handle }
	}
}

pub struct ReconcilerHandle {
	cancel: CancellationToken,
	handle: JoinHandle<()>,
}

impl ReconcilerHandle {
	/// Signals the loop and waits for it to exit. A cycle in progress stops
	/// after the identity it is currently processing.
	pub async fn shutdown(self) {
		self.cancel.cancel();
		if let Err(e) = self.handle.await {
			error!(error = %e, "reconciliation task ended abnormally");
		}
	}
}
