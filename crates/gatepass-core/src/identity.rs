// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity keys and the gateway label derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Realm suffix used when a deployment does not configure one.
pub const DEFAULT_REALM: &str = "myserver";

/// Stable external account identifier (a Telegram user id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(i64);

impl IdentityId {
	pub const fn new(id: i64) -> Self {
		Self(id)
	}

	pub const fn get(self) -> i64 {
		self.0
	}

	/// Name shown to the user in connection descriptors.
	pub fn display_name(self) -> String {
		format!("user_{}", self.0)
	}
}

impl fmt::Display for IdentityId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<i64> for IdentityId {
	fn from(id: i64) -> Self {
		Self(id)
	}
}

impl FromStr for IdentityId {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.trim().parse().map(Self)
	}
}

/// Derives the gateway-side label for an identity.
///
/// The label is never persisted. Both the provisioning path and the
/// reconciliation loop recompute it from the identity id, so the scheme must
/// stay fixed for the lifetime of a deployment: changing the realm orphans
/// every existing gateway entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelScheme {
	realm: String,
}

impl LabelScheme {
	pub fn new(realm: impl Into<String>) -> Self {
		Self {
			realm: realm.into(),
		}
	}

	pub fn realm(&self) -> &str {
		&self.realm
	}

	pub fn label_for(&self, id: IdentityId) -> String {
		format!("user_{}@{}", id.0, self.realm)
	}
}

impl Default for LabelScheme {
	fn default() -> Self {
		Self::new(DEFAULT_REALM)
	}
}
