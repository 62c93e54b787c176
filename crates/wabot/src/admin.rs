// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator commands: bot provisioning, status sync, conversation close.

use std::sync::Arc;

use tracing::info;
use wabot_config::WabotConfig;
use wabot_core::{Bot, MessagingGateway, Persona, StorageAdapter, User, WabotError};
use wabot_dispatch::{SyncReport, sync_statuses};
use wabot_evolution::EvolutionGateway;
use wabot_storage::SqliteStorage;

use crate::BotAddArgs;

async fn open_storage(config: &WabotConfig) -> Result<Arc<dyn StorageAdapter>, WabotError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

/// Creates the owning user if needed, then a new bot in `inactive` status.
pub async fn add_bot(storage: &dyn StorageAdapter, args: BotAddArgs) -> Result<Bot, WabotError> {
    if let Some(instance) = args.instance.as_deref() {
        let existing = storage.find_bot_by_instance(instance).await?;
        if let Some(existing) = existing.filter(|b| b.is_active) {
            return Err(WabotError::Internal(format!(
                "instance {instance} is already bound to active bot {}",
                existing.id
            )));
        }
    }

    storage.create_user(&User::new(&args.user, None)).await?;
    let bot = Bot::new(
        &args.user,
        Persona {
            company: args.company,
            tone: args.tone,
            instructions: args.instructions,
        },
        args.instance,
    );
    storage.create_bot(&bot).await?;
    info!(bot_id = %bot.id, user_id = %bot.user_id, "bot created");
    Ok(bot)
}

/// One line of `wabot bot list` output.
pub fn format_bot_row(bot: &Bot) -> String {
    format!(
        "{}  {:<10} {:<8} {:<20} {}",
        bot.id,
        bot.status,
        if bot.is_active { "active" } else { "inactive" },
        bot.instance_id.as_deref().unwrap_or("-"),
        bot.company,
    )
}

/// One line of `wabot sync-status` output.
pub fn format_sync_report(report: &SyncReport) -> String {
    match &report.result {
        Ok(status) => format!("{}  {}  {status}", report.bot_id, report.instance),
        Err(reason) => format!("{}  {}  failed: {reason}", report.bot_id, report.instance),
    }
}

pub async fn run_bot_add(config: &WabotConfig, args: BotAddArgs) -> Result<(), WabotError> {
    let storage = open_storage(config).await?;
    let result = add_bot(storage.as_ref(), args).await;
    storage.close().await?;
    let bot = result?;
    println!("{}", bot.id);
    Ok(())
}

pub async fn run_bot_list(config: &WabotConfig, include_inactive: bool) -> Result<(), WabotError> {
    let storage = open_storage(config).await?;
    let result = storage.list_bots(!include_inactive).await;
    storage.close().await?;
    let bots = result?;
    if bots.is_empty() {
        println!("no bots");
    }
    for bot in &bots {
        println!("{}", format_bot_row(bot));
    }
    Ok(())
}

pub async fn run_bot_deactivate(config: &WabotConfig, id: &str) -> Result<(), WabotError> {
    let storage = open_storage(config).await?;
    let result = storage.deactivate_bot(id).await;
    storage.close().await?;
    result?;
    println!("bot {id} deactivated");
    Ok(())
}

pub async fn run_sync_status(config: &WabotConfig) -> Result<(), WabotError> {
    let storage = open_storage(config).await?;
    let gateway: Arc<dyn MessagingGateway> = Arc::new(EvolutionGateway::new(&config.evolution)?);
    let result = sync_statuses(&storage, &gateway).await;
    storage.close().await?;
    for report in result? {
        println!("{}", format_sync_report(&report));
    }
    Ok(())
}

pub async fn run_conversation_close(config: &WabotConfig, id: &str) -> Result<(), WabotError> {
    let storage = open_storage(config).await?;
    let result = storage.close_conversation(id).await;
    storage.close().await?;
    result?;
    println!("conversation {id} closed");
    Ok(())
}
