// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and the Wabot pipeline.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Timestamp format used for every persisted record (RFC 3339, millisecond precision, UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Current UTC time formatted with [`TIMESTAMP_FORMAT`].
pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Gateway,
    Completion,
    Storage,
    Observability,
}

// --- Bots ---

/// The persona used to steer completion replies for a bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub company: String,
    pub tone: String,
    pub instructions: String,
}

/// Externally visible connection status of a bot's WhatsApp instance.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    Inactive,
    Connecting,
    Connected,
    Error,
}

/// A configured WhatsApp bot owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bot {
    pub id: String,
    pub user_id: String,
    pub company: String,
    pub tone: String,
    pub instructions: String,
    /// Gateway instance this bot answers for.
    pub instance_id: Option<String>,
    pub status: BotStatus,
    /// Pending QR payload while the instance is pairing.
    pub qr_code: Option<String>,
    /// Cleared on soft delete.
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Bot {
    /// Creates a new inactive bot with a fresh id.
    pub fn new(user_id: &str, persona: Persona, instance_id: Option<String>) -> Self {
        let now = now_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            company: persona.company,
            tone: persona.tone,
            instructions: persona.instructions,
            instance_id,
            status: BotStatus::Inactive,
            qr_code: None,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Returns the persona triple for completion requests.
    pub fn persona(&self) -> Persona {
        Persona {
            company: self.company.clone(),
            tone: self.tone.clone(),
            instructions: self.instructions.clone(),
        }
    }
}

/// How a status update treats the stored QR payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrCodeChange {
    Keep,
    Set(String),
    Clear,
}

// --- Conversations ---

/// Lifecycle of a conversation thread.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Closed,
}

/// Kind of content a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Audio,
    Document,
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Customer,
    Bot,
}

/// A single message embedded in a [`Conversation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    pub sender: Sender,
    pub timestamp: String,
    /// Gateway-side message id, kept for tracing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl Message {
    /// A text message received from the customer.
    pub fn from_customer(content: &str, message_id: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            message_type: MessageType::Text,
            content: content.to_string(),
            sender: Sender::Customer,
            timestamp: now_timestamp(),
            message_id,
        }
    }

    /// A text reply produced by the bot.
    pub fn from_bot(content: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            message_type: MessageType::Text,
            content: content.to_string(),
            sender: Sender::Bot,
            timestamp: now_timestamp(),
            message_id: None,
        }
    }
}

/// The message thread between one bot and one customer phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub bot_id: String,
    pub user_id: String,
    /// Digits-only phone number.
    pub customer_phone: String,
    pub customer_name: Option<String>,
    pub messages: Vec<Message>,
    pub status: ConversationStatus,
    pub last_message_at: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Conversation {
    /// Creates a new, empty, active conversation.
    pub fn new(bot: &Bot, customer_phone: &str, customer_name: &str) -> Self {
        let now = now_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            bot_id: bot.id.clone(),
            user_id: bot.user_id.clone(),
            customer_phone: customer_phone.to_string(),
            customer_name: Some(customer_name.to_string()),
            messages: Vec::new(),
            status: ConversationStatus::Active,
            last_message_at: now.clone(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Appends a message and advances `last_message_at` to its timestamp.
    pub fn append(&mut self, message: Message) {
        self.last_message_at = message.timestamp.clone();
        self.updated_at = message.timestamp.clone();
        self.messages.push(message);
    }
}

// --- Users ---

/// Account owning bots. Only usage accounting lives here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub messages_used: i64,
    pub created_at: String,
}

impl User {
    /// Creates a user with zero usage.
    pub fn new(id: &str, email: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            email,
            messages_used: 0,
            created_at: now_timestamp(),
        }
    }
}
