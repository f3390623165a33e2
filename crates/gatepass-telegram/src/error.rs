// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Bot API client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelegramError {
	/// Transport failure. The request URL is stripped because it embeds the
	/// bot token.
	#[error("Network error: {0}")]
	Network(#[source] reqwest::Error),

	/// The API answered with `ok: false`.
	#[error("Telegram API error: {description}")]
	Api {
		code: Option<i64>,
		description: String,
	},

	#[error("Invalid response from Telegram: {0}")]
	InvalidResponse(String),
}
