// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};

use crate::credential::Credential;
use crate::identity::IdentityId;

/// Persisted mapping from an identity to its gateway credential.
///
/// There is no update path: a record is created once and later deleted. The
/// credential therefore never changes while the record exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
	pub identity_id: IdentityId,
	pub display_label: String,
	pub credential: Credential,
	pub created_at: DateTime<Utc>,
}

impl IdentityRecord {
	pub fn new(identity_id: IdentityId, display_label: impl Into<String>, credential: Credential) -> Self {
		Self {
			identity_id,
			display_label: display_label.into(),
			credential,
			created_at: Utc::now(),
		}
	}
}
