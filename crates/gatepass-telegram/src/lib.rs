// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Telegram adapter for gatepass.
//!
//! Provides the channel-membership oracle and private-message notifier used
//! by the access engine, plus the long-poll `/check` command front end.

pub mod bot;
pub mod client;
pub mod error;
pub mod messages;
pub mod oracle;
pub mod types;

pub use bot::{BotPoller, Command, CommandHandler, Reply};
pub use client::{BotClient, DEFAULT_BASE_URL};
pub use error::TelegramError;
pub use oracle::{BotNotifier, ChannelOracle};
