// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Eligibility queries against the community channel.

use async_trait::async_trait;

use crate::identity::IdentityId;

/// Result of a membership query. Ephemeral, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
	Member,
	NotMember,
}

impl Membership {
	pub fn is_member(self) -> bool {
		matches!(self, Membership::Member)
	}
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
	#[error("membership query failed: {0}")]
	Query(String),
}

/// Answers whether an identity is currently eligible for access.
#[async_trait]
pub trait MembershipOracle: Send + Sync {
	async fn is_member(&self, id: IdentityId) -> Result<Membership, OracleError>;
}
