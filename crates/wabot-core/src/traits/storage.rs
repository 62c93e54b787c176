// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::WabotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Bot, BotStatus, Conversation, QrCodeChange, User};

/// Adapter for storage and persistence backends.
///
/// The conversation aggregate (thread plus embedded messages) is the unit of
/// atomic update: [`save_conversation`](Self::save_conversation) replaces it
/// in a single write.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), WabotError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), WabotError>;

    // --- Users ---

    /// Creates a user. Existing ids are left untouched.
    async fn create_user(&self, user: &User) -> Result<(), WabotError>;

    /// Gets a user by id.
    async fn get_user(&self, id: &str) -> Result<Option<User>, WabotError>;

    /// Adds `amount` to a user's message usage counter.
    async fn increment_usage(&self, user_id: &str, amount: i64) -> Result<(), WabotError>;

    // --- Bots ---

    /// Creates a bot.
    async fn create_bot(&self, bot: &Bot) -> Result<(), WabotError>;

    /// Gets a bot by id.
    async fn get_bot(&self, id: &str) -> Result<Option<Bot>, WabotError>;

    /// Lists bots, optionally only active ones.
    async fn list_bots(&self, active_only: bool) -> Result<Vec<Bot>, WabotError>;

    /// Finds the bot bound to a gateway instance, preferring active bots.
    async fn find_bot_by_instance(&self, instance_id: &str) -> Result<Option<Bot>, WabotError>;

    /// Updates a bot's connection status and its stored QR payload.
    async fn update_bot_status(
        &self,
        id: &str,
        status: BotStatus,
        qr_code: QrCodeChange,
    ) -> Result<(), WabotError>;

    /// Soft-deletes a bot by clearing its activity flag.
    async fn deactivate_bot(&self, id: &str) -> Result<(), WabotError>;

    // --- Conversations ---

    /// Returns the active conversation for (bot, phone), creating it when absent.
    ///
    /// Creation is race-free: concurrent callers converge on one row.
    async fn find_or_create_active_conversation(
        &self,
        bot: &Bot,
        customer_phone: &str,
        customer_name: &str,
    ) -> Result<Conversation, WabotError>;

    /// Gets a conversation by id.
    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, WabotError>;

    /// Persists the full conversation (messages, timestamps, name) in one write.
    async fn save_conversation(&self, conversation: &Conversation) -> Result<(), WabotError>;

    /// Lists conversations for a bot, most recent first.
    async fn list_conversations(&self, bot_id: &str) -> Result<Vec<Conversation>, WabotError>;

    /// Marks a conversation closed; the next inbound message opens a new one.
    async fn close_conversation(&self, id: &str) -> Result<(), WabotError>;
}
