// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Public endpoint advertised in connection descriptors.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
	pub domain: String,
	pub port: u16,
}

impl Default for EndpointConfig {
	fn default() -> Self {
		Self {
			domain: "artr.ignorelist.com".to_string(),
			port: 443,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfigLayer {
	#[serde(default)]
	pub domain: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
}

impl EndpointConfigLayer {
	pub fn merge(&mut self, other: EndpointConfigLayer) {
		if other.domain.is_some() {
			self.domain = other.domain;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
	}

	pub fn finalize(self) -> EndpointConfig {
		let defaults = EndpointConfig::default();
		EndpointConfig {
			domain: self.domain.unwrap_or(defaults.domain),
			port: self.port.unwrap_or(defaults.port),
		}
	}
}
