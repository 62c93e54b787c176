// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot CRUD and connection status updates.

use rusqlite::params;
use wabot_core::types::now_timestamp;
use wabot_core::{Bot, BotStatus, QrCodeChange, WabotError};

use crate::database::{Database, map_tr_err};
use crate::queries::parse_column;

const BOT_COLUMNS: &str = "id, user_id, company, tone, instructions, instance_id, status, \
                           qr_code, is_active, created_at, updated_at";

fn row_to_bot(row: &rusqlite::Row<'_>) -> rusqlite::Result<Bot> {
    Ok(Bot {
        id: row.get(0)?,
        user_id: row.get(1)?,
        company: row.get(2)?,
        tone: row.get(3)?,
        instructions: row.get(4)?,
        instance_id: row.get(5)?,
        status: parse_column(row, 6)?,
        qr_code: row.get(7)?,
        is_active: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Insert a new bot.
pub async fn create_bot(db: &Database, bot: &Bot) -> Result<(), WabotError> {
    let bot = bot.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bots (id, user_id, company, tone, instructions, instance_id, \
                 status, qr_code, is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    bot.id,
                    bot.user_id,
                    bot.company,
                    bot.tone,
                    bot.instructions,
                    bot.instance_id,
                    bot.status.as_ref(),
                    bot.qr_code,
                    bot.is_active,
                    bot.created_at,
                    bot.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a bot by id.
pub async fn get_bot(db: &Database, id: &str) -> Result<Option<Bot>, WabotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {BOT_COLUMNS} FROM bots WHERE id = ?1");
            match conn.query_row(&sql, params![id], row_to_bot) {
                Ok(bot) => Ok(Some(bot)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List bots, newest first.
pub async fn list_bots(db: &Database, active_only: bool) -> Result<Vec<Bot>, WabotError> {
    db.connection()
        .call(move |conn| {
            let filter = if active_only { "WHERE is_active = 1" } else { "" };
            let sql = format!("SELECT {BOT_COLUMNS} FROM bots {filter} ORDER BY created_at DESC");
            let mut stmt = conn.prepare(&sql)?;
            let bots = stmt
                .query_map([], row_to_bot)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(bots)
        })
        .await
        .map_err(map_tr_err)
}

/// Find the bot bound to `instance_id`. Active bots win over deactivated ones.
pub async fn find_bot_by_instance(
    db: &Database,
    instance_id: &str,
) -> Result<Option<Bot>, WabotError> {
    let instance_id = instance_id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {BOT_COLUMNS} FROM bots WHERE instance_id = ?1
                 ORDER BY is_active DESC, updated_at DESC LIMIT 1"
            );
            match conn.query_row(&sql, params![instance_id], row_to_bot) {
                Ok(bot) => Ok(Some(bot)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Update status and QR payload. Errors with `NotFound` for unknown ids.
pub async fn update_bot_status(
    db: &Database,
    id: &str,
    status: BotStatus,
    qr_code: QrCodeChange,
) -> Result<(), WabotError> {
    let bot_id = id.to_string();
    let now = now_timestamp();
    let changed = db
        .connection()
        .call(move |conn| {
            let changed = match qr_code {
                QrCodeChange::Keep => conn.execute(
                    "UPDATE bots SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    params![status.as_ref(), now, bot_id],
                )?,
                QrCodeChange::Set(qr) => conn.execute(
                    "UPDATE bots SET status = ?1, qr_code = ?2, updated_at = ?3 WHERE id = ?4",
                    params![status.as_ref(), qr, now, bot_id],
                )?,
                QrCodeChange::Clear => conn.execute(
                    "UPDATE bots SET status = ?1, qr_code = NULL, updated_at = ?2 WHERE id = ?3",
                    params![status.as_ref(), now, bot_id],
                )?,
            };
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(WabotError::not_found("bot", id));
    }
    Ok(())
}

/// Soft delete: clear `is_active`, keep the row and its history.
pub async fn deactivate_bot(db: &Database, id: &str) -> Result<(), WabotError> {
    let bot_id = id.to_string();
    let now = now_timestamp();
    let changed = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE bots SET is_active = 0, updated_at = ?1 WHERE id = ?2",
                params![now, bot_id],
            )?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(WabotError::not_found("bot", id));
    }
    Ok(())
}
