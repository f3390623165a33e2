// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Telegram bot configuration.

use gatepass_common_secret::SecretString;
use serde::Deserialize;

pub const DEFAULT_CHANNEL: &str = "@art_rom";
pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramConfig {
	pub bot_token: SecretString,
	/// Channel whose members are granted access, e.g. `@art_rom`.
	pub channel: String,
	pub api_base_url: String,
	pub poll_timeout_secs: u64,
	pub max_concurrent_handlers: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfigLayer {
	#[serde(default)]
	pub bot_token: Option<SecretString>,
	#[serde(default)]
	pub channel: Option<String>,
	#[serde(default)]
	pub api_base_url: Option<String>,
	#[serde(default)]
	pub poll_timeout_secs: Option<u64>,
	#[serde(default)]
	pub max_concurrent_handlers: Option<usize>,
}

impl TelegramConfigLayer {
	pub fn merge(&mut self, other: TelegramConfigLayer) {
		if other.bot_token.is_some() {
			self.bot_token = other.bot_token;
		}
		if other.channel.is_some() {
			self.channel = other.channel;
		}
		if other.api_base_url.is_some() {
			self.api_base_url = other.api_base_url;
		}
		if other.poll_timeout_secs.is_some() {
			self.poll_timeout_secs = other.poll_timeout_secs;
		}
		if other.max_concurrent_handlers.is_some() {
			self.max_concurrent_handlers = other.max_concurrent_handlers;
		}
	}

	/// Returns `None` when no bot token was configured.
	pub fn finalize(self) -> Option<TelegramConfig> {
		Some(TelegramConfig {
			bot_token: self.bot_token?,
			channel: self.channel.unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
			api_base_url: self
				.api_base_url
				.unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
			poll_timeout_secs: self.poll_timeout_secs.unwrap_or(60),
			max_concurrent_handlers: self.max_concurrent_handlers.unwrap_or(32),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_missing_token_finalizes_to_none() {
		assert!(TelegramConfigLayer::default().finalize().is_none());
	}

	#[test]
	fn test_defaults_with_token() {
		let config = TelegramConfigLayer {
			bot_token: Some(SecretString::new("1:abc".to_string())),
			..Default::default()
		}
		.finalize()
		.unwrap();
		assert_eq!(config.channel, "@art_rom");
		assert_eq!(config.api_base_url, "https://api.telegram.org");
		assert_eq!(config.poll_timeout_secs, 60);
		assert_eq!(config.max_concurrent_handlers, 32);
	}

	#[test]
	fn test_debug_redacts_token() {
		let layer = TelegramConfigLayer {
			bot_token: Some(SecretString::new("1:super-secret".to_string())),
			..Default::default()
		};
		assert!(!format!("{layer:?}").contains("super-secret"));
	}
}
