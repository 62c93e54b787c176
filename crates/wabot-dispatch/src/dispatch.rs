// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch orchestrator for inbound customer messages.
//!
//! One inbound message becomes one conversation turn: the customer message is
//! appended, a reply is obtained from the completion service, the reply is
//! appended and sent through the gateway, usage is counted, and the
//! conversation is persisted once. Guard failures short-circuit with an
//! explicit [`DispatchOutcome`] and never mutate state.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use wabot_core::phone::phone_from_jid;
use wabot_core::{
    CompletionService, Message, MessagingGateway, StorageAdapter, WabotError,
};

use crate::content::extract_content;

/// Messages counted per answered turn: the customer's and the bot's.
pub const USAGE_PER_TURN: i64 = 2;

/// Outer bounds on the two downstream calls.
#[derive(Debug, Clone, Copy)]
pub struct DispatchTimeouts {
    pub completion: Duration,
    pub send: Duration,
}

impl Default for DispatchTimeouts {
    fn default() -> Self {
        Self {
            completion: Duration::from_secs(30),
            send: Duration::from_secs(15),
        }
    }
}

impl DispatchTimeouts {
    /// Reads both timeouts from configuration.
    pub fn from_config(config: &wabot_config::WabotConfig) -> Self {
        Self {
            completion: Duration::from_secs(config.completion.timeout_secs),
            send: Duration::from_secs(config.evolution.timeout_secs),
        }
    }
}

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// `data` carried no message.
    NoMessages,
    /// The message was sent by the bot's own number.
    FromMe,
    /// No phone could be read from `key.remoteJid`.
    NoPhone,
    /// No bot is bound to the instance.
    UnknownBot,
    /// The bound bot has been deactivated.
    InactiveBot,
    /// The message had no text the bot can answer.
    NoContent,
    /// A reply was produced; `delivered` reports the gateway send.
    Replied {
        conversation_id: String,
        delivered: bool,
    },
    /// A storage failure stopped or lost the turn.
    Failed { reason: String },
}

impl DispatchOutcome {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::NoMessages => "no_messages",
            DispatchOutcome::FromMe => "from_me",
            DispatchOutcome::NoPhone => "no_phone",
            DispatchOutcome::UnknownBot => "unknown_bot",
            DispatchOutcome::InactiveBot => "inactive_bot",
            DispatchOutcome::NoContent => "no_content",
            DispatchOutcome::Replied { delivered: true, .. } => "replied",
            DispatchOutcome::Replied { delivered: false, .. } => "reply_undelivered",
            DispatchOutcome::Failed { .. } => "failed",
        }
    }

    /// True for guard no-ops that leave all state untouched.
    pub fn is_noop(&self) -> bool {
        !matches!(
            self,
            DispatchOutcome::Replied { .. } | DispatchOutcome::Failed { .. }
        )
    }
}

/// First message of a `messages.upsert` body.
///
/// `data.messages` may be an array or the message itself may sit directly
/// under `data`.
pub fn first_message(data: &Value) -> Option<&Value> {
    match data.get("messages") {
        Some(Value::Array(messages)) => messages.first(),
        Some(message @ Value::Object(_)) => Some(message),
        _ if data.get("key").is_some_and(Value::is_object) => Some(data),
        _ => None,
    }
}

/// Runs conversation turns against the injected capabilities.
pub struct Dispatcher {
    storage: Arc<dyn StorageAdapter>,
    gateway: Arc<dyn MessagingGateway>,
    completion: Arc<dyn CompletionService>,
    timeouts: DispatchTimeouts,
    turn_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl Dispatcher {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        gateway: Arc<dyn MessagingGateway>,
        completion: Arc<dyn CompletionService>,
        timeouts: DispatchTimeouts,
    ) -> Self {
        Self {
            storage,
            gateway,
            completion,
            timeouts,
            turn_locks: DashMap::new(),
        }
    }

    /// Handles a `messages.upsert` body received for `instance`.
    pub async fn handle_message(&self, instance: &str, data: &Value) -> DispatchOutcome {
        let outcome = self.dispatch(instance, data).await;
        match &outcome {
            DispatchOutcome::Replied { .. } => {}
            DispatchOutcome::Failed { reason } => {
                error!(instance, reason = %reason, "message dispatch failed");
            }
            noop => warn!(instance, outcome = noop.label(), "message ignored"),
        }
        wabot_prometheus::record_dispatch_outcome(outcome.label());
        outcome
    }

    async fn dispatch(&self, instance: &str, data: &Value) -> DispatchOutcome {
        let Some(message) = first_message(data) else {
            return DispatchOutcome::NoMessages;
        };
        let key = message.get("key").unwrap_or(&Value::Null);
        if key.get("fromMe").and_then(Value::as_bool).unwrap_or(false) {
            return DispatchOutcome::FromMe;
        }
        let Some(phone) = key
            .get("remoteJid")
            .and_then(Value::as_str)
            .and_then(phone_from_jid)
        else {
            return DispatchOutcome::NoPhone;
        };

        let bot = match self.storage.find_bot_by_instance(instance).await {
            Ok(Some(bot)) if bot.is_active => bot,
            Ok(Some(_)) => return DispatchOutcome::InactiveBot,
            Ok(None) => return DispatchOutcome::UnknownBot,
            Err(e) => return failed(e),
        };

        let Some(text) = message.get("message").and_then(extract_content) else {
            return DispatchOutcome::NoContent;
        };

        let push_name = message
            .get("pushName")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let message_id = key.get("id").and_then(Value::as_str).map(str::to_string);

        let lock = self.turn_lock(&bot.id, &phone);
        let outcome = {
            let _turn = lock.lock().await;
            self.run_turn(instance, &bot, &phone, push_name, &text, message_id)
                .await
        };
        drop(lock);
        self.release_turn_lock(&bot.id, &phone);
        outcome
    }

    async fn run_turn(
        &self,
        instance: &str,
        bot: &wabot_core::Bot,
        phone: &str,
        push_name: Option<&str>,
        text: &str,
        message_id: Option<String>,
    ) -> DispatchOutcome {
        let display_name = push_name.unwrap_or(phone);
        let mut conversation = match self
            .storage
            .find_or_create_active_conversation(bot, phone, display_name)
            .await
        {
            Ok(c) => c,
            Err(e) => return failed(e),
        };
        if let Some(name) = push_name {
            conversation.customer_name = Some(name.to_string());
        }
        debug!(conversation_id = %conversation.id, bot_id = %bot.id, phone, "turn started");

        conversation.append(Message::from_customer(text, message_id));

        let reply = match tokio::time::timeout(
            self.timeouts.completion,
            self.completion.complete(&bot.persona(), text),
        )
        .await
        {
            Ok(reply) => reply,
            Err(_) => {
                warn!(bot_id = %bot.id, timeout = ?self.timeouts.completion, "completion timed out");
                wabot_prometheus::record_completion_fallback();
                self.completion.fallback_reply()
            }
        };
        conversation.append(Message::from_bot(&reply));

        // JID numbers already carry their country code.
        let recipient = format!("+{phone}");
        let delivered = tokio::time::timeout(
            self.timeouts.send,
            self.gateway.send_text(instance, &recipient, &reply),
        )
        .await
        .unwrap_or(false);
        if !delivered {
            warn!(instance, phone, conversation_id = %conversation.id, "reply not delivered");
            wabot_prometheus::record_send_failure();
        }

        if let Err(e) = self
            .storage
            .increment_usage(&bot.user_id, USAGE_PER_TURN)
            .await
        {
            error!(user_id = %bot.user_id, error = %e, "failed to record usage");
        }

        if let Err(e) = self.storage.save_conversation(&conversation).await {
            return failed(e);
        }

        info!(
            conversation_id = %conversation.id,
            bot_id = %bot.id,
            phone,
            delivered,
            "turn completed"
        );
        DispatchOutcome::Replied {
            conversation_id: conversation.id,
            delivered,
        }
    }

    fn turn_lock(&self, bot_id: &str, phone: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.turn_locks
            .entry(turn_key(bot_id, phone))
            .or_default()
            .clone()
    }

    // Entries are dropped once no other turn holds a clone.
    fn release_turn_lock(&self, bot_id: &str, phone: &str) {
        self.turn_locks
            .remove_if(&turn_key(bot_id, phone), |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Number of (bot, phone) keys with a turn in flight.
    pub fn in_flight_turns(&self) -> usize {
        self.turn_locks.len()
    }
}

fn turn_key(bot_id: &str, phone: &str) -> String {
    format!("{bot_id}:{phone}")
}

fn failed(e: WabotError) -> DispatchOutcome {
    DispatchOutcome::Failed {
        reason: e.to_string(),
    }
}
