// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage wrapper with switchable write and lookup failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use wabot_core::traits::adapter::PluginAdapter;
use wabot_core::traits::storage::StorageAdapter;
use wabot_core::types::{AdapterType, Bot, BotStatus, Conversation, HealthStatus, QrCodeChange, User};
use wabot_core::WabotError;

/// Delegates to a real [`StorageAdapter`] until a failure switch is flipped.
///
/// - [`set_fail_saves`](Self::set_fail_saves) makes `save_conversation` error.
/// - [`set_fail_lookups`](Self::set_fail_lookups) makes `find_bot_by_instance` error.
pub struct FaultyStorage {
    inner: Arc<dyn StorageAdapter>,
    fail_saves: AtomicBool,
    fail_lookups: AtomicBool,
}

impl FaultyStorage {
    pub fn new(inner: Arc<dyn StorageAdapter>) -> Self {
        Self {
            inner,
            fail_saves: AtomicBool::new(false),
            fail_lookups: AtomicBool::new(false),
        }
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    fn injected(operation: &str) -> WabotError {
        WabotError::Storage {
            source: format!("injected {operation} failure").into(),
        }
    }
}

#[async_trait]
impl PluginAdapter for FaultyStorage {
    fn name(&self) -> &str {
        "faulty-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, WabotError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), WabotError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl StorageAdapter for FaultyStorage {
    async fn initialize(&self) -> Result<(), WabotError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), WabotError> {
        self.inner.close().await
    }

    async fn create_user(&self, user: &User) -> Result<(), WabotError> {
        self.inner.create_user(user).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, WabotError> {
        self.inner.get_user(id).await
    }

    async fn increment_usage(&self, user_id: &str, amount: i64) -> Result<(), WabotError> {
        self.inner.increment_usage(user_id, amount).await
    }

    async fn create_bot(&self, bot: &Bot) -> Result<(), WabotError> {
        self.inner.create_bot(bot).await
    }

    async fn get_bot(&self, id: &str) -> Result<Option<Bot>, WabotError> {
        self.inner.get_bot(id).await
    }

    async fn list_bots(&self, active_only: bool) -> Result<Vec<Bot>, WabotError> {
        self.inner.list_bots(active_only).await
    }

    async fn find_bot_by_instance(&self, instance_id: &str) -> Result<Option<Bot>, WabotError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Self::injected("lookup"));
        }
        self.inner.find_bot_by_instance(instance_id).await
    }

    async fn update_bot_status(
        &self,
        id: &str,
        status: BotStatus,
        qr_code: QrCodeChange,
    ) -> Result<(), WabotError> {
        self.inner.update_bot_status(id, status, qr_code).await
    }

    async fn deactivate_bot(&self, id: &str) -> Result<(), WabotError> {
        self.inner.deactivate_bot(id).await
    }

    async fn find_or_create_active_conversation(
        &self,
        bot: &Bot,
        customer_phone: &str,
        customer_name: &str,
    ) -> Result<Conversation, WabotError> {
        self.inner
            .find_or_create_active_conversation(bot, customer_phone, customer_name)
            .await
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, WabotError> {
        self.inner.get_conversation(id).await
    }

    async fn save_conversation(&self, conversation: &Conversation) -> Result<(), WabotError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Self::injected("save"));
        }
        self.inner.save_conversation(conversation).await
    }

    async fn list_conversations(&self, bot_id: &str) -> Result<Vec<Conversation>, WabotError> {
        self.inner.list_conversations(bot_id).await
    }

    async fn close_conversation(&self, id: &str) -> Result<(), WabotError> {
        self.inner.close_conversation(id).await
    }
}
