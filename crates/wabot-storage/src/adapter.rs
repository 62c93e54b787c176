// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use wabot_config::model::StorageConfig;
use wabot_core::{
    AdapterType, Bot, BotStatus, Conversation, HealthStatus, PluginAdapter, QrCodeChange,
    StorageAdapter, User, WabotError,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened on the first call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage. Nothing is opened until `initialize`.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, WabotError> {
        self.db.get().ok_or_else(|| WabotError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, WabotError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WabotError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("storage shut down");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), WabotError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| WabotError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), WabotError> {
        self.db()?.close().await
    }

    // --- Users ---

    async fn create_user(&self, user: &User) -> Result<(), WabotError> {
        queries::users::create_user(self.db()?, user).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, WabotError> {
        queries::users::get_user(self.db()?, id).await
    }

    async fn increment_usage(&self, user_id: &str, amount: i64) -> Result<(), WabotError> {
        queries::users::increment_usage(self.db()?, user_id, amount).await
    }

    // --- Bots ---

    async fn create_bot(&self, bot: &Bot) -> Result<(), WabotError> {
        queries::bots::create_bot(self.db()?, bot).await
    }

    async fn get_bot(&self, id: &str) -> Result<Option<Bot>, WabotError> {
        queries::bots::get_bot(self.db()?, id).await
    }

    async fn list_bots(&self, active_only: bool) -> Result<Vec<Bot>, WabotError> {
        queries::bots::list_bots(self.db()?, active_only).await
    }

    async fn find_bot_by_instance(&self, instance_id: &str) -> Result<Option<Bot>, WabotError> {
        queries::bots::find_bot_by_instance(self.db()?, instance_id).await
    }

    async fn update_bot_status(
        &self,
        id: &str,
        status: BotStatus,
        qr_code: QrCodeChange,
    ) -> Result<(), WabotError> {
        queries::bots::update_bot_status(self.db()?, id, status, qr_code).await
    }

    async fn deactivate_bot(&self, id: &str) -> Result<(), WabotError> {
        queries::bots::deactivate_bot(self.db()?, id).await
    }

    // --- Conversations ---

    async fn find_or_create_active_conversation(
        &self,
        bot: &Bot,
        customer_phone: &str,
        customer_name: &str,
    ) -> Result<Conversation, WabotError> {
        queries::conversations::find_or_create_active(self.db()?, bot, customer_phone, customer_name)
            .await
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, WabotError> {
        queries::conversations::get_conversation(self.db()?, id).await
    }

    async fn save_conversation(&self, conversation: &Conversation) -> Result<(), WabotError> {
        queries::conversations::save_conversation(self.db()?, conversation).await
    }

    async fn list_conversations(&self, bot_id: &str) -> Result<Vec<Conversation>, WabotError> {
        queries::conversations::list_conversations(self.db()?, bot_id).await
    }

    async fn close_conversation(&self, id: &str) -> Result<(), WabotError> {
        queries::conversations::close_conversation(self.db()?, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_in(dir: &tempfile::TempDir) -> StorageConfig {
        StorageConfig {
            database_path: dir.path().join("adapter.db").to_string_lossy().into_owned(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config_in(&dir));
        assert!(storage.get_bot("x").await.is_err());
        assert!(storage.health_check().await.is_err());
        // Shutdown without a database is a no-op.
        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn initialize_twice_is_an_error() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config_in(&dir));
        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn adapter_delegates_to_queries() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config_in(&dir));
        storage.initialize().await.unwrap();

        storage.create_user(&User::new("u1", None)).await.unwrap();
        let bot = Bot::new(
            "u1",
            wabot_core::Persona {
                company: "Acme".into(),
                tone: "formal".into(),
                instructions: String::new(),
            },
            Some("inst-1".into()),
        );
        storage.create_bot(&bot).await.unwrap();

        let found = storage.find_bot_by_instance("inst-1").await.unwrap().unwrap();
        assert_eq!(found.id, bot.id);

        let conversation = storage
            .find_or_create_active_conversation(&bot, "5511999999999", "5511999999999")
            .await
            .unwrap();
        assert_eq!(conversation.bot_id, bot.id);

        storage.increment_usage("u1", 2).await.unwrap();
        assert_eq!(storage.get_user("u1").await.unwrap().unwrap().messages_used, 2);
    }
}
