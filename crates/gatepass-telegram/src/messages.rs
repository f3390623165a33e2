// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User-facing message text.

use gatepass_core::{ConnectionDescriptor, Credential};

pub const PARSE_MODE_MARKDOWN: &str = "Markdown";

pub const START: &str = "Hi! I check channel subscriptions. Send /check to verify your subscription and receive your VPN configuration.";

pub const HELP: &str = "Send /check to verify your subscription and receive your VPN configuration.";

pub const CHECK_FAILED: &str =
	"Something went wrong while checking your subscription. Please try again later.";

pub const PROVISIONING_FAILED: &str =
	"Something went wrong while generating your configuration. Please try again later.";

/// Markdown reply carrying the credential and connection descriptor.
pub fn subscribed(credential: &Credential, descriptor: &ConnectionDescriptor) -> String {
	format!(
		"You are subscribed to the channel!\n\nYour UUID: `{}`\n\nYour VLESS configuration:\n`{}`",
		credential.expose(),
		descriptor.expose()
	)
}

pub fn not_subscribed(channel: &str) -> String {
	format!("You are not subscribed to {channel}. Please subscribe and try again.")
}

pub fn revoked(channel: &str) -> String {
	format!(
		"You have left {channel}, so your VPN access has been revoked. To restore it, subscribe to the channel again and send /check."
	)
}
