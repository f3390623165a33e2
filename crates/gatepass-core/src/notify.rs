// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::identity::IdentityId;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
	#[error("notification delivery failed: {0}")]
	Delivery(String),
}

/// Fire-and-forget text delivery to an identity. Callers log failures and
/// move on; nothing is retried.
#[async_trait]
pub trait NotificationSink: Send + Sync {
	async fn send(&self, id: IdentityId, text: &str) -> Result<(), NotifyError>;
}
