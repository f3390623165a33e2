// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The subset of Bot API objects gatepass reads.

use gatepass_core::Membership;
use serde::Deserialize;

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
	pub ok: bool,
	pub result: Option<T>,
	pub description: Option<String>,
	pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
	pub update_id: i64,
	pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
	pub message_id: i64,
	pub from: Option<User>,
	pub chat: Chat,
	pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
	pub id: i64,
	#[serde(default)]
	pub first_name: String,
	pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
	pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMember {
	pub status: String,
}

impl ChatMember {
	/// Only current members, administrators and the creator count.
	/// `restricted`, `left` and `kicked` do not.
	pub fn membership(&self) -> Membership {
		match self.status.as_str() {
			"member" | "administrator" | "creator" => Membership::Member,
			_ => Membership::NotMember,
		}
	}
}
