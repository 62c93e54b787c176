// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Wabot WhatsApp bot backend.
//!
//! Provides the domain model (bots, conversations, messages), the error type,
//! and the capability traits the dispatch pipeline is written against. Concrete
//! gateway, completion, and storage adapters implement traits defined here.

pub mod error;
pub mod fallback;
pub mod phone;
pub mod traits;
pub mod types;

pub use error::WabotError;
pub use fallback::FallbackReplies;
pub use types::{
    AdapterType, Bot, BotStatus, Conversation, ConversationStatus, HealthStatus, Message,
    MessageType, Persona, QrCodeChange, Sender, User,
};

pub use traits::{CompletionService, MessagingGateway, PluginAdapter, StorageAdapter};
