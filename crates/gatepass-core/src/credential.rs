// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Gateway credentials and the client entry the gateway stores for them.

use gatepass_common_secret::SecretString;
use serde_json::{json, Value};
use uuid::Uuid;

/// Opaque secret granting access to the gated service.
///
/// New credentials are UUID v4 strings (122 random bits). Existing ones are
/// taken verbatim from the store and never regenerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential(SecretString);

impl Credential {
	pub fn generate() -> Self {
		Self(SecretString::new(Uuid::new_v4().to_string()))
	}

	pub fn from_stored(value: impl Into<String>) -> Self {
		Self(SecretString::new(value.into()))
	}

	pub fn expose(&self) -> &str {
		self.0.expose()
	}
}

/// One entry in the gateway's client list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayClient {
	pub label: String,
	pub secret: Credential,
	pub flow: String,
}

impl GatewayClient {
	pub fn new(label: impl Into<String>, secret: Credential, flow: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			secret,
			flow: flow.into(),
		}
	}

	/// JSON shape the gateway uses for a client: `{email, id, flow}`.
	pub fn to_json(&self) -> Value {
		json!({
			"email": self.label,
			"id": self.secret.expose(),
			"flow": self.flow,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_generated_credential_is_uuid_v4() {
		let credential = Credential::generate();
		let parsed = Uuid::parse_str(credential.expose()).unwrap();
		assert_eq!(parsed.get_version_num(), 4);
	}

	#[test]
	fn test_generated_credentials_differ() {
		assert_ne!(Credential::generate(), Credential::generate());
	}

	#[test]
	fn test_debug_does_not_leak() {
		let credential = Credential::from_stored("stored-value");
		assert!(!format!("{credential:?}").contains("stored-value"));
	}

	#[test]
	fn test_client_json_shape() {
		let client = GatewayClient::new(
			"user_42@myserver",
			Credential::from_stored("abc"),
			"xtls-rprx-vision",
		);
		assert_eq!(
			client.to_json(),
			json!({"email": "user_42@myserver", "id": "abc", "flow": "xtls-rprx-vision"})
		);
	}
}
