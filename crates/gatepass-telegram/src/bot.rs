// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Long-poll command front end.
//!
//! [`BotPoller`] pulls updates with `getUpdates`, hands each text message to
//! its own task bounded by a semaphore, and stops when its cancellation token
//! fires. [`CommandHandler`] turns one message into one reply.

use std::sync::Arc;
use std::time::Duration;

use gatepass_access::AccessService;
use gatepass_core::{IdentityId, MembershipOracle};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::client::BotClient;
use crate::messages;
use crate::types::Message;

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
	Start,
	Check,
	Help,
}

impl Command {
	/// Parses the leading word of a message. `/check@somebot` is accepted;
	/// anything unrecognised is `Help`.
	pub fn parse(text: &str) -> Self {
		let word = text.split_whitespace().next().unwrap_or_default();
		let name = word.split('@').next().unwrap_or_default();
		match name {
			"/start" => Command::Start,
			"/check" => Command::Check,
			_ => Command::Help,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
	pub text: String,
	pub parse_mode: Option<&'static str>,
}

impl Reply {
	fn plain(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			parse_mode: None,
		}
	}
}

pub struct CommandHandler {
	oracle: Arc<dyn MembershipOracle>,
	access: Arc<AccessService>,
	channel: String,
}

impl CommandHandler {
	pub fn new(
		oracle: Arc<dyn MembershipOracle>,
		access: Arc<AccessService>,
		channel: impl Into<String>,
	) -> Self {
		Self {
			oracle,
			access,
			channel: channel.into(),
		}
	}

	/// Returns `None` for messages that need no reply (no sender or no text).
	pub async fn handle(&self, message: &Message) -> Option<Reply> {
		let user = message.from.as_ref()?;
		let text = message.text.as_deref()?;
		let id = IdentityId::new(user.id);

		let reply = match Command::parse(text) {
			Command::Start => Reply::plain(messages::START),
			Command::Help => Reply::plain(messages::HELP),
			Command::Check => {
				let display_label = user
					.username
					.clone()
					.unwrap_or_else(|| user.first_name.clone());
				self.check(id, &display_label).await
			}
		};
		Some(reply)
	}

	#[instrument(skip(self, display_label), fields(identity_id = %id))]
	async fn check(&self, id: IdentityId, display_label: &str) -> Reply {
		let membership = match self.oracle.is_member(id).await {
			Ok(m) => m,
			Err(e) => {
				error!(identity_id = %id, error = %e, "membership check failed");
				return Reply::plain(messages::CHECK_FAILED);
			}
		};

		if !membership.is_member() {
			self.access.remove(id).await;
			return Reply::plain(messages::not_subscribed(&self.channel));
		}

		match self.access.get_or_create(id, display_label).await {
			Ok(provisioned) => Reply {
				text: messages::subscribed(&provisioned.credential, &provisioned.descriptor),
				parse_mode: Some(messages::PARSE_MODE_MARKDOWN),
			},
			Err(e) => {
				error!(identity_id = %id, error = %e, "provisioning failed");
				Reply::plain(messages::PROVISIONING_FAILED)
			}
		}
	}
}

pub struct BotPoller {
	client: BotClient,
	handler: Arc<CommandHandler>,
	poll_timeout: Duration,
	max_concurrent: usize,
	permits: Arc<Semaphore>,
}

impl BotPoller {
	pub fn new(
		client: BotClient,
		handler: Arc<CommandHandler>,
		poll_timeout: Duration,
		max_concurrent: usize,
	) -> Self {
		let max_concurrent = max_concurrent.max(1);
		Self {
			client,
			handler,
			poll_timeout,
			max_concurrent,
			permits: Arc::new(Semaphore::new(max_concurrent)),
		}
	}

	/// Polls until `cancel` fires, then waits for in-flight handlers.
	pub async fn run(&self, cancel: CancellationToken) {
		info!(
			poll_timeout_secs = self.poll_timeout.as_secs(),
			max_concurrent = self.max_concurrent,
			"bot poller started"
		);
		let mut offset: Option<i64> = None;

		loop {
			let updates = tokio::select! {
				_ = cancel.cancelled() => break,
				result = self.client.get_updates(offset, self.poll_timeout) => result,
			};

			let updates = match updates {
				Ok(updates) => updates,
				Err(e) => {
					warn!(error = %e, backoff_secs = ERROR_BACKOFF.as_secs(), "getUpdates failed");
					tokio::select! {
						_ = cancel.cancelled() => break,
						_ = tokio::time::sleep(ERROR_BACKOFF) => continue,
					}
				}
			};

			for update in updates {
				offset = Some(update.update_id + 1);
				let Some(message) = update.message else {
					debug!(update_id = update.update_id, "skipping non-message update");
					continue;
				};

				let permit = tokio::select! {
					_ = cancel.cancelled() => break,
					permit = self.permits.clone().acquire_owned() => match permit {
						Ok(p) => p,
						Err(_) => break,
					},
				};
				let handler = self.handler.clone();
				let client = self.client.clone();
				tokio::spawn(async move {
					let _permit = permit;
					dispatch(&handler, &client, message).await;
				});
			}

			if cancel.is_cancelled() {
				break;
			}
		}

		self.drain().await;
		info!("bot poller stopped");
	}

	async fn drain(&self) {
		let total = u32::try_from(self.max_concurrent).unwrap_or(u32::MAX);
		if self.permits.acquire_many(total).await.is_err() {
			warn!("handler semaphore closed before drain");
		}
	}
}

async fn dispatch(handler: &CommandHandler, client: &BotClient, message: Message) {
	let Some(reply) = handler.handle(&message).await else {
		return;
	};
	if let Err(e) = client
		.send_message(message.chat.id, &reply.text, reply.parse_mode)
		.await
	{
		warn!(chat_id = message.chat.id, error = %e, "failed to send reply");
	}
}
