// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Telegram Bot API client.

use std::time::Duration;

use gatepass_common_secret::SecretString;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, instrument, trace};

use crate::error::TelegramError;
use crate::types::{ApiResponse, ChatMember, Update};

pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the handful of Bot API methods gatepass calls.
#[derive(Debug, Clone)]
pub struct BotClient {
	http_client: Client,
	token: SecretString,
	base_url: String,
}

impl BotClient {
	pub fn new(token: SecretString) -> Result<Self, TelegramError> {
		let http_client = Client::builder()
			.user_agent(concat!("gatepass/", env!("CARGO_PKG_VERSION")))
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(|e| TelegramError::Network(e.without_url()))?;

		Ok(Self {
			http_client,
			token,
			base_url: DEFAULT_BASE_URL.to_string(),
		})
	}

	/// Sets a custom base URL for the API (useful for testing).
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into().trim_end_matches('/').to_string();
		self
	}

	fn method_url(&self, method: &str) -> String {
		format!("{}/bot{}/{}", self.base_url, self.token.expose(), method)
	}

	async fn call<B, T>(&self, method: &str, body: &B, timeout: Option<Duration>) -> Result<T, TelegramError>
	where
		B: Serialize + ?Sized,
		T: DeserializeOwned,
	{
		let mut request = self.http_client.post(self.method_url(method)).json(body);
		if let Some(timeout) = timeout {
			request = request.timeout(timeout);
		}

		let response = request
			.send()
			.await
			.map_err(|e| TelegramError::Network(e.without_url()))?;
		let status = response.status();
		debug!(method, status = %status, "Telegram response received");

		let body = response
			.text()
			.await
			.map_err(|e| TelegramError::Network(e.without_url()))?;
		if logs_response_body(method) {
			trace!(method, body = %body, "Telegram response body");
		}

		let envelope: ApiResponse<T> = serde_json::from_str(&body)
			.map_err(|e| TelegramError::InvalidResponse(format!("{method}: {e} (HTTP {status})")))?;

		if !envelope.ok {
			return Err(TelegramError::Api {
				code: envelope.error_code,
				description: envelope
					.description
					.unwrap_or_else(|| format!("HTTP {status}")),
			});
		}

		envelope
			.result
			.ok_or_else(|| TelegramError::InvalidResponse(format!("{method}: missing result")))
	}

	#[instrument(skip(self))]
	pub async fn get_chat_member(&self, chat: &str, user_id: i64) -> Result<ChatMember, TelegramError> {
		self
			.call(
				"getChatMember",
				&json!({"chat_id": chat, "user_id": user_id}),
				None,
			)
			.await
	}

	#[instrument(skip(self, text))]
	pub async fn send_message(
		&self,
		chat_id: i64,
		text: &str,
		parse_mode: Option<&str>,
	) -> Result<(), TelegramError> {
		let mut body = json!({"chat_id": chat_id, "text": text});
		if let Some(mode) = parse_mode {
			body["parse_mode"] = json!(mode);
		}
		let _: serde_json::Value = self.call("sendMessage", &body, None).await?;
		Ok(())
	}

	/// Long-polls for updates after `offset`, waiting up to `poll_timeout`
	/// server-side.
	#[instrument(skip(self))]
	pub async fn get_updates(
		&self,
		offset: Option<i64>,
		poll_timeout: Duration,
	) -> Result<Vec<Update>, TelegramError> {
		let mut body = json!({
			"timeout": poll_timeout.as_secs(),
			"allowed_updates": ["message"],
		});
		if let Some(offset) = offset {
			body["offset"] = json!(offset);
		}
		self
			.call("getUpdates", &body, Some(poll_timeout + REQUEST_TIMEOUT))
			.await
	}
}

/// `sendMessage` echoes the sent text, which can carry a credential.
fn logs_response_body(method: &str) -> bool {
	method != "sendMessage"
}
