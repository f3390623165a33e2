// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Xray gateway configuration.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
	/// Address of the gateway's control API (`host:port`).
	pub api_address: String,
	pub inbound_tag: String,
	pub flow: String,
	/// Suffix of every client label, `user_<id>@<label_realm>`.
	pub label_realm: String,
	pub config_path: PathBuf,
	pub xray_binary: String,
	pub service_name: String,
	/// Add the control API section to the config document at startup if
	/// it is missing.
	pub bootstrap_api: bool,
}

impl Default for GatewayConfig {
	fn default() -> Self {
		Self {
			api_address: "127.0.0.1:10085".to_string(),
			inbound_tag: "vless_tls".to_string(),
			flow: "xtls-rprx-vision".to_string(),
			label_realm: "myserver".to_string(),
			config_path: PathBuf::from("/usr/local/etc/xray/config.json"),
			xray_binary: "xray".to_string(),
			service_name: "xray".to_string(),
			bootstrap_api: true,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfigLayer {
	#[serde(default)]
	pub api_address: Option<String>,
	#[serde(default)]
	pub inbound_tag: Option<String>,
	#[serde(default)]
	pub flow: Option<String>,
	#[serde(default)]
	pub label_realm: Option<String>,
	#[serde(default)]
	pub config_path: Option<PathBuf>,
	#[serde(default)]
	pub xray_binary: Option<String>,
	#[serde(default)]
	pub service_name: Option<String>,
	#[serde(default)]
	pub bootstrap_api: Option<bool>,
}

impl GatewayConfigLayer {
	pub fn merge(&mut self, other: GatewayConfigLayer) {
		if other.api_address.is_some() {
			self.api_address = other.api_address;
		}
		if other.inbound_tag.is_some() {
			self.inbound_tag = other.inbound_tag;
		}
		if other.flow.is_some() {
			self.flow = other.flow;
		}
		if other.label_realm.is_some() {
			self.label_realm = other.label_realm;
		}
		if other.config_path.is_some() {
			self.config_path = other.config_path;
		}
		if other.xray_binary.is_some() {
			self.xray_binary = other.xray_binary;
		}
		if other.service_name.is_some() {
			self.service_name = other.service_name;
		}
		if other.bootstrap_api.is_some() {
			self.bootstrap_api = other.bootstrap_api;
		}
	}

	pub fn finalize(self) -> GatewayConfig {
		let defaults = GatewayConfig::default();
		GatewayConfig {
			api_address: self.api_address.unwrap_or(defaults.api_address),
			inbound_tag: self.inbound_tag.unwrap_or(defaults.inbound_tag),
			flow: self.flow.unwrap_or(defaults.flow),
			label_realm: self.label_realm.unwrap_or(defaults.label_realm),
			config_path: self.config_path.unwrap_or(defaults.config_path),
			xray_binary: self.xray_binary.unwrap_or(defaults.xray_binary),
			service_name: self.service_name.unwrap_or(defaults.service_name),
			bootstrap_api: self.bootstrap_api.unwrap_or(defaults.bootstrap_api),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = GatewayConfigLayer::default().finalize();
		assert_eq!(config, GatewayConfig::default());
		assert_eq!(config.api_address, "127.0.0.1:10085");
		assert!(config.bootstrap_api);
	}

	#[test]
	fn test_merge_overrides_only_set_fields() {
		let mut base = GatewayConfigLayer {
			inbound_tag: Some("vless_a".to_string()),
			flow: Some("flow-a".to_string()),
			..Default::default()
		};
		base.merge(GatewayConfigLayer {
			flow: Some("flow-b".to_string()),
			bootstrap_api: Some(false),
			..Default::default()
		});
		let config = base.finalize();
		assert_eq!(config.inbound_tag, "vless_a");
		assert_eq!(config.flow, "flow-b");
		assert!(!config.bootstrap_api);
	}
}
