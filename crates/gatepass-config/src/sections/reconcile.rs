// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reconciliation loop schedule.

use std::time::Duration;

use serde::Deserialize;

/// The wait between cycles is `unit_secs` times a whole number drawn
/// uniformly from `min_units..=max_units`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
	pub enabled: bool,
	pub unit_secs: u64,
	pub min_units: u32,
	pub max_units: u32,
}

impl Default for ReconcileConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			unit_secs: 3600,
			min_units: 1,
			max_units: 23,
		}
	}
}

impl ReconcileConfig {
	pub fn unit(&self) -> Duration {
		Duration::from_secs(self.unit_secs)
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileConfigLayer {
	#[serde(default)]
	pub enabled: Option<bool>,
	#[serde(default)]
	pub unit_secs: Option<u64>,
	#[serde(default)]
	pub min_units: Option<u32>,
	#[serde(default)]
	pub max_units: Option<u32>,
}

impl ReconcileConfigLayer {
	pub fn merge(&mut self, other: ReconcileConfigLayer) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.unit_secs.is_some() {
			self.unit_secs = other.unit_secs;
		}
		if other.min_units.is_some() {
			self.min_units = other.min_units;
		}
		if other.max_units.is_some() {
			self.max_units = other.max_units;
		}
	}

	pub fn finalize(self) -> ReconcileConfig {
		let defaults = ReconcileConfig::default();
		ReconcileConfig {
			enabled: self.enabled.unwrap_or(defaults.enabled),
			unit_secs: self.unit_secs.unwrap_or(defaults.unit_secs),
			min_units: self.min_units.unwrap_or(defaults.min_units),
			max_units: self.max_units.unwrap_or(defaults.max_units),
		}
	}
}
