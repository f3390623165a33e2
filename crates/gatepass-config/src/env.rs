// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret loading from environment variables with `*_FILE` support.
//!
//! For a variable `NAME`, `NAME_FILE` may instead point at a file holding the
//! value (the usual container secrets convention). Setting both is an error.

use std::path::PathBuf;

use gatepass_common_secret::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("both {var} and {var}_FILE are set")]
	Ambiguous { var: String },

	#[error("failed to read {var}_FILE at {path}: {source}")]
	FileRead {
		var: String,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Loads `name` from the process environment.
pub fn load_secret_env(name: &str) -> Result<Option<SecretString>, SecretEnvError> {
	load_secret_with(name, |key| std::env::var(key).ok())
}

/// Loads `name` through an arbitrary lookup. Empty values count as unset and
/// a trailing newline in a secret file is dropped.
pub fn load_secret_with<F>(name: &str, lookup: F) -> Result<Option<SecretString>, SecretEnvError>
where
	F: Fn(&str) -> Option<String>,
{
	let direct = lookup(name).filter(|v| !v.is_empty());
	let file = lookup(&format!("{name}_FILE")).filter(|v| !v.is_empty());

	match (direct, file) {
		(Some(_), Some(_)) => Err(SecretEnvError::Ambiguous {
			var: name.to_string(),
		}),
		(Some(value), None) => Ok(Some(SecretString::new(value))),
		(None, Some(path)) => {
			let path = PathBuf::from(path);
			let content = std::fs::read_to_string(&path).map_err(|source| SecretEnvError::FileRead {
				var: name.to_string(),
				path: path.clone(),
				source,
			})?;
			let value = content.trim_end_matches(['\r', '\n']).to_string();
			Ok((!value.is_empty()).then(|| SecretString::new(value)))
		}
		(None, None) => Ok(None),
	}
}
