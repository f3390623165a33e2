// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Gateway provisioning errors.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
	#[error("control channel {action} failed: {message}")]
	ControlChannel {
		action: &'static str,
		message: String,
	},

	#[error("failed to run {program}: {source}")]
	Spawn {
		program: String,
		#[source]
		source: std::io::Error,
	},

	#[error("{program} did not finish within {after:?}")]
	Timeout { program: String, after: Duration },

	#[error("failed to read gateway config {path}: {source}")]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse gateway config {path}: {source}")]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("failed to write gateway config {path}: {source}")]
	ConfigWrite {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("no inbound with tag {0}")]
	InboundNotFound(String),

	#[error("client {0} already exists")]
	DuplicateLabel(String),

	#[error("malformed gateway config: {0}")]
	MalformedDocument(String),

	#[error("gateway restart failed: {0}")]
	Restart(String),

	#[error("all provisioning strategies failed: {}", StrategyFailures(.0))]
	Exhausted(Vec<StrategyFailure>),
}

/// One strategy's failure inside an exhausted chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
	pub strategy: &'static str,
	pub message: String,
}

struct StrategyFailures<'a>(&'a [StrategyFailure]);

impl fmt::Display for StrategyFailures<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, failure) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str("; ")?;
			}
			write!(f, "{}: {}", failure.strategy, failure.message)?;
		}
		Ok(())
	}
}

pub type Result<T> = std::result::Result<T, GatewayError>;
