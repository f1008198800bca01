// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Long-polling dispatch loop.
//!
//! Updates are handled one at a time in the order the Bot API returns them.

use crate::media::{Fetcher, Replier, Resolver};
use crate::pipeline::{Pipeline, Request};
use crate::telegram::{ChatReplier, Message, TelegramClient, TelegramError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Reply to `/start`.
pub const GREETING: &str = "👋 Hey! Send me a KukuFM link and I’ll try to fetch the audio.";

/// Pause after a failed `getUpdates` call.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// What an inbound text asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incoming<'a> {
    /// The `/start` command
    Start,
    /// Any other `/command`; ignored
    OtherCommand,
    /// Plain text, handed to the pipeline
    Text(&'a str),
}

/// Classify a message text. `bot_username` is used to match
/// `/start@<username>` in group chats.
pub fn classify<'a>(text: &'a str, bot_username: Option<&str>) -> Incoming<'a> {
    let Some(command) = text.strip_prefix('/') else {
        return Incoming::Text(text);
    };

    let word = command.split_whitespace().next().unwrap_or("");
    let (name, target) = match word.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (word, None),
    };

    let addressed_to_us = match (target, bot_username) {
        (None, _) => true,
        (Some(target), Some(me)) => target.eq_ignore_ascii_case(me),
        (Some(_), None) => false,
    };

    if name == "start" && addressed_to_us {
        Incoming::Start
    } else {
        Incoming::OtherCommand
    }
}

/// Bot API polling loop feeding the pipeline.
pub struct Bot<R, F> {
    client: TelegramClient,
    pipeline: Pipeline<R, F>,
    username: Option<String>,
}

impl<R: Resolver, F: Fetcher> Bot<R, F> {
    pub fn new(client: TelegramClient, pipeline: Pipeline<R, F>, username: Option<String>) -> Self {
        Self {
            client,
            pipeline,
            username,
        }
    }

    /// Poll forever. Returns only if the Bot API rejects the token.
    pub async fn run(&self) -> Result<(), TelegramError> {
        let mut offset = 0;
        loop {
            let updates = match self.client.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) if e.is_unauthorized() => return Err(e),
                Err(e) => {
                    warn!(error = %e, "Polling failed, retrying");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                if let Some(message) = update.message {
                    let replier = ChatReplier::new(&self.client, message.chat.id);
                    self.dispatch(&message, &replier, Instant::now()).await;
                }
            }
        }
    }

    /// Route one message. Per-request failures are reported to the user and
    /// logged by the pipeline, never returned.
    pub async fn dispatch<P: Replier>(&self, message: &Message, replier: &P, received_at: Instant) {
        let (Some(text), Some(from)) = (message.text.as_deref(), message.from.as_ref()) else {
            debug!(message_id = message.message_id, "Ignoring message without text or sender");
            return;
        };

        match classify(text, self.username.as_deref()) {
            Incoming::Start => {
                if let Err(e) = replier.send_text(GREETING).await {
                    warn!(user = from.id, error = %e, "Failed to send greeting");
                } else {
                    info!(user = from.id, "Greeted user");
                }
            }
            Incoming::OtherCommand => {
                debug!(user = from.id, "Ignoring unknown command");
            }
            Incoming::Text(text) => {
                let request = Request::new(from.id, text, received_at);
                // Failures were already replied to and logged
                if let Ok(filename) = self.pipeline.handle(&request, replier).await {
                    debug!(user = from.id, %filename, "Request completed");
                }
            }
        }
    }
}
