// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline testing.
//!
//! `TestHarness` assembles temp SQLite storage behind a [`FaultyStorage`]
//! wrapper, mock gateway and completion adapters, a seeded user and bot, and
//! the webhook [`Pipeline`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use wabot_config::model::StorageConfig;
use wabot_core::{Bot, Conversation, Persona, StorageAdapter, User, WabotError};
use wabot_dispatch::{DispatchTimeouts, Pipeline, WebhookOutcome};
use wabot_storage::SqliteStorage;

use crate::faulty_storage::FaultyStorage;
use crate::mock_completion::MockCompletion;
use crate::mock_gateway::MockGateway;

/// Instance id the seeded bot is bound to.
pub const TEST_INSTANCE: &str = "test-instance";
/// Id of the seeded user.
pub const TEST_USER: &str = "test-user";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    timeouts: DispatchTimeouts,
    persona: Persona,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            timeouts: DispatchTimeouts::default(),
            persona: Persona {
                company: "Acme Store".into(),
                tone: "friendly".into(),
                instructions: "Help customers with their orders.".into(),
            },
        }
    }

    /// Queue completion replies.
    pub fn with_responses(mut self, responses: Vec<&str>) -> Self {
        self.responses = responses.into_iter().map(str::to_string).collect();
        self
    }

    /// Override the orchestrator timeouts.
    pub fn with_timeouts(mut self, completion: Duration, send: Duration) -> Self {
        self.timeouts = DispatchTimeouts { completion, send };
        self
    }

    /// Build the harness, creating storage and seeding a user and bot.
    pub async fn build(self) -> Result<TestHarness, WabotError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| WabotError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let faults = Arc::new(FaultyStorage::new(Arc::new(storage)));
        let storage: Arc<dyn StorageAdapter> = faults.clone();

        storage.create_user(&User::new(TEST_USER, None)).await?;
        let bot = Bot::new(TEST_USER, self.persona, Some(TEST_INSTANCE.to_string()));
        storage.create_bot(&bot).await?;

        let gateway = Arc::new(MockGateway::new());
        let completion = Arc::new(MockCompletion::with_responses(self.responses));
        let pipeline = Arc::new(Pipeline::new(
            Arc::clone(&storage),
            gateway.clone(),
            completion.clone(),
            self.timeouts,
        ));

        Ok(TestHarness {
            storage,
            faults,
            gateway,
            completion,
            pipeline,
            bot,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    /// Failure switches for the same storage.
    pub faults: Arc<FaultyStorage>,
    pub gateway: Arc<MockGateway>,
    pub completion: Arc<MockCompletion>,
    pub pipeline: Arc<Pipeline>,
    /// The seeded bot, bound to [`TEST_INSTANCE`].
    pub bot: Bot,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default settings.
    pub async fn new() -> Result<Self, WabotError> {
        Self::builder().build().await
    }

    /// Deliver a webhook body on the seeded bot's instance path.
    pub async fn deliver(&self, payload: &Value) -> Result<WebhookOutcome, WabotError> {
        self.pipeline.handle_webhook(TEST_INSTANCE, payload).await
    }

    /// All conversations of the seeded bot, most recent first.
    pub async fn conversations(&self) -> Vec<Conversation> {
        self.storage
            .list_conversations(&self.bot.id)
            .await
            .unwrap_or_default()
    }

    /// Current state of the seeded bot.
    pub async fn reload_bot(&self) -> Option<Bot> {
        self.storage.get_bot(&self.bot.id).await.ok().flatten()
    }

    /// Usage counter of the seeded user.
    pub async fn messages_used(&self) -> i64 {
        self.storage
            .get_user(TEST_USER)
            .await
            .ok()
            .flatten()
            .map(|u| u.messages_used)
            .unwrap_or_default()
    }
}
