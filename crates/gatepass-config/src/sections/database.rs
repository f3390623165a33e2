// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity store configuration.

use serde::Deserialize;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/users.db";

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_DATABASE_URL.to_string(),
		}
	}
}

impl DatabaseConfig {
	/// Directory the SQLite file lives in, if the URL names a file path.
	pub fn data_dir(&self) -> Option<std::path::PathBuf> {
		let path = self
			.url
			.strip_prefix("sqlite://")
			.or_else(|| self.url.strip_prefix("sqlite:"))?;
		let path = path.split('?').next().unwrap_or(path);
		if path.is_empty() || path.starts_with(":memory:") {
			return None;
		}
		std::path::Path::new(path)
			.parent()
			.filter(|p| !p.as_os_str().is_empty())
			.map(|p| p.to_path_buf())
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	pub fn finalize(self) -> DatabaseConfig {
		DatabaseConfig {
			url: self.url.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;

	#[test]
	fn test_default_url() {
		let config = DatabaseConfigLayer::default().finalize();
		assert_eq!(config.url, "sqlite:./data/users.db");
		assert_eq!(config.data_dir(), Some(PathBuf::from("./data")));
	}

	#[test]
	fn test_data_dir() {
		let config = |url: &str| DatabaseConfig {
			url: url.to_string(),
		};
		assert_eq!(
			config("sqlite:///var/lib/gatepass/users.db?mode=rwc").data_dir(),
			Some(PathBuf::from("/var/lib/gatepass"))
		);
		assert_eq!(config("sqlite::memory:").data_dir(), None);
		assert_eq!(config("sqlite:users.db").data_dir(), None);
	}
}
