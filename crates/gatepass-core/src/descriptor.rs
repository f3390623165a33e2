// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connection descriptors handed back to the user.

use gatepass_common_secret::SecretString;

use crate::credential::Credential;
use crate::identity::IdentityId;

/// Public address clients dial to reach the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	pub domain: String,
	pub port: u16,
}

impl Endpoint {
	pub fn new(domain: impl Into<String>, port: u16) -> Self {
		Self {
			domain: domain.into(),
			port,
		}
	}
}

/// A VLESS URI embedding the credential. Treated as secret since it is
/// sufficient on its own to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor(SecretString);

impl ConnectionDescriptor {
	pub fn vless(id: IdentityId, credential: &Credential, endpoint: &Endpoint, flow: &str) -> Self {
		let uri = format!(
			"vless://{}@{}:{}?security=tls&type=tcp&flow={}&encryption=none#{}",
			credential.expose(),
			endpoint.domain,
			endpoint.port,
			flow,
			id.display_name(),
		);
		Self(SecretString::new(uri))
	}

	pub fn expose(&self) -> &str {
		self.0.expose()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_vless_uri() {
		let descriptor = ConnectionDescriptor::vless(
			IdentityId::new(42),
			&Credential::from_stored("0b6f2c4e-0000-4000-8000-000000000001"),
			&Endpoint::new("artr.ignorelist.com", 443),
			"xtls-rprx-vision",
		);
		assert_eq!(
			descriptor.expose(),
			"vless://0b6f2c4e-0000-4000-8000-000000000001@artr.ignorelist.com:443\
			 ?security=tls&type=tcp&flow=xtls-rprx-vision&encryption=none#user_42"
		);
	}

	#[test]
	fn test_descriptor_debug_redacted() {
		let descriptor = ConnectionDescriptor::vless(
			IdentityId::new(1),
			&Credential::from_stored("secret-id"),
			&Endpoint::new("example.org", 8443),
			"xtls-rprx-vision",
		);
		assert!(!format!("{descriptor:?}").contains("secret-id"));
	}
}
