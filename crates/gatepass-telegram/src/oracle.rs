// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bot API implementations of the membership oracle and notification sink.

use async_trait::async_trait;
use gatepass_core::{IdentityId, Membership, MembershipOracle, NotificationSink, NotifyError, OracleError};
use tracing::{debug, instrument};

use crate::client::BotClient;

/// Answers membership questions with `getChatMember` against one channel.
pub struct ChannelOracle {
	client: BotClient,
	channel: String,
}

impl ChannelOracle {
	pub fn new(client: BotClient, channel: impl Into<String>) -> Self {
		Self {
			client,
			channel: channel.into(),
		}
	}

	pub fn channel(&self) -> &str {
		&self.channel
	}
}

#[async_trait]
impl MembershipOracle for ChannelOracle {
	#[instrument(skip(self), fields(identity_id = %id, channel = %self.channel))]
	async fn is_member(&self, id: IdentityId) -> Result<Membership, OracleError> {
		let member = self
			.client
			.get_chat_member(&self.channel, id.get())
			.await
			.map_err(|e| OracleError::Query(e.to_string()))?;
		debug!(identity_id = %id, status = %member.status, "membership status");
		Ok(member.membership())
	}
}

/// Delivers notifications as private messages. A private chat's id equals
/// the user's id.
pub struct BotNotifier {
	client: BotClient,
}

impl BotNotifier {
	pub fn new(client: BotClient) -> Self {
		Self { client }
	}
}

#[async_trait]
impl NotificationSink for BotNotifier {
	async fn send(&self, id: IdentityId, text: &str) -> Result<(), NotifyError> {
		self
			.client
			.send_message(id.get(), text, None)
			.await
			.map_err(|e| NotifyError::Delivery(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use gatepass_common_secret::SecretString;
	use serde_json::json;
	use wiremock::matchers::{body_partial_json, method, path_regex};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn client(server: &MockServer) -> BotClient {
		BotClient::new(SecretString::new("1:abc".to_string()))
			.unwrap()
			.with_base_url(server.uri())
	}

	async fn mount_status(server: &MockServer, user_id: i64, status: &str) {
		Mock::given(method("POST"))
			.and(path_regex(r"/getChatMember$"))
			.and(body_partial_json(json!({"user_id": user_id})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"ok": true,
				"result": {"status": status}
			})))
			.mount(server)
			.await;
	}

	#[tokio::test]
	async fn test_member_and_left() {
		let server = MockServer::start().await;
		mount_status(&server, 1, "member").await;
		mount_status(&server, 2, "left").await;
		let oracle = ChannelOracle::new(client(&server), "@art_rom");

		assert_eq!(
			oracle.is_member(IdentityId::new(1)).await.unwrap(),
			Membership::Member
		);
		assert_eq!(
			oracle.is_member(IdentityId::new(2)).await.unwrap(),
			Membership::NotMember
		);
	}

	#[tokio::test]
	async fn test_api_failure_is_oracle_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(403).set_body_json(json!({
				"ok": false,
				"error_code": 403,
				"description": "Forbidden: bot is not a member of the channel chat"
			})))
			.mount(&server)
			.await;
		let oracle = ChannelOracle::new(client(&server), "@art_rom");

		let err = oracle.is_member(IdentityId::new(1)).await.unwrap_err();
		assert!(err.to_string().contains("bot is not a member"));
	}

	#[tokio::test]
	async fn test_notifier_sends_private_message() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path_regex(r"/sendMessage$"))
			.and(body_partial_json(json!({"chat_id": 77, "text": "bye"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"ok": true,
				"result": {"message_id": 1}
			})))
			.expect(1)
			.mount(&server)
			.await;

		BotNotifier::new(client(&server))
			.send(IdentityId::new(77), "bye")
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn test_notifier_failure() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(403).set_body_json(json!({
				"ok": false,
				"error_code": 403,
				"description": "Forbidden: bot was blocked by the user"
			})))
			.mount(&server)
			.await;

		let err = BotNotifier::new(client(&server))
			.send(IdentityId::new(77), "bye")
			.await
			.unwrap_err();
		assert!(matches!(err, NotifyError::Delivery(_)));
	}
}
