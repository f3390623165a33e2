// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gatepass_gateway::GatewayError;
use gatepass_store::DbError;

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
	#[error("identity store error: {0}")]
	Store(#[from] DbError),

	#[error("gateway error: {0}")]
	Gateway(#[from] GatewayError),

	#[error("invalid reconciliation schedule: {0}")]
	InvalidSchedule(String),
}

pub type Result<T> = std::result::Result<T, AccessError>;
