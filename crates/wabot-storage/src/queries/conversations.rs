// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation aggregate persistence.
//!
//! The message list is stored as a JSON array in a single column so the whole
//! aggregate is written by one UPDATE.

use rusqlite::params;
use rusqlite::types::Type;
use wabot_core::types::now_timestamp;
use wabot_core::{Bot, Conversation, ConversationStatus, Message, WabotError};

use crate::database::{Database, map_tr_err};
use crate::queries::parse_column;

const CONVERSATION_COLUMNS: &str = "id, bot_id, user_id, customer_phone, customer_name, \
                                    messages, status, last_message_at, created_at, updated_at";

fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let raw_messages: String = row.get(5)?;
    let messages: Vec<Message> = serde_json::from_str(&raw_messages)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
    Ok(Conversation {
        id: row.get(0)?,
        bot_id: row.get(1)?,
        user_id: row.get(2)?,
        customer_phone: row.get(3)?,
        customer_name: row.get(4)?,
        messages,
        status: parse_column(row, 6)?,
        last_message_at: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn messages_json(messages: &[Message]) -> rusqlite::Result<String> {
    serde_json::to_string(messages).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Return the active conversation for (bot, phone), creating it if none exists.
///
/// The insert is `OR IGNORE` against the partial unique index on active
/// threads, so concurrent callers all read back the same row.
pub async fn find_or_create_active(
    db: &Database,
    bot: &Bot,
    customer_phone: &str,
    customer_name: &str,
) -> Result<Conversation, WabotError> {
    let candidate = Conversation::new(bot, customer_phone, customer_name);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO conversations (id, bot_id, user_id, customer_phone, \
                 customer_name, messages, status, last_message_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, '[]', 'active', ?6, ?7, ?8)",
                params![
                    candidate.id,
                    candidate.bot_id,
                    candidate.user_id,
                    candidate.customer_phone,
                    candidate.customer_name,
                    candidate.last_message_at,
                    candidate.created_at,
                    candidate.updated_at,
                ],
            )?;
            let sql = format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations
                 WHERE bot_id = ?1 AND customer_phone = ?2 AND status = 'active'"
            );
            let conversation = tx.query_row(
                &sql,
                params![candidate.bot_id, candidate.customer_phone],
                row_to_conversation,
            )?;
            tx.commit()?;
            if inserted > 0 {
                tracing::debug!(conversation_id = %conversation.id, "conversation created");
            }
            Ok(conversation)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a conversation by id.
pub async fn get_conversation(db: &Database, id: &str) -> Result<Option<Conversation>, WabotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1");
            match conn.query_row(&sql, params![id], row_to_conversation) {
                Ok(c) => Ok(Some(c)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Write messages, name and timestamps back in one statement.
pub async fn save_conversation(db: &Database, conversation: &Conversation) -> Result<(), WabotError> {
    let id = conversation.id.clone();
    let customer_name = conversation.customer_name.clone();
    let last_message_at = conversation.last_message_at.clone();
    let updated_at = conversation.updated_at.clone();
    let messages = conversation.messages.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            let json = messages_json(&messages)?;
            let changed = conn.execute(
                "UPDATE conversations
                 SET messages = ?1, customer_name = ?2, last_message_at = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![json, customer_name, last_message_at, updated_at, id],
            )?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(WabotError::not_found("conversation", &conversation.id));
    }
    Ok(())
}

/// Conversations of one bot, most recently active first.
pub async fn list_conversations(
    db: &Database,
    bot_id: &str,
) -> Result<Vec<Conversation>, WabotError> {
    let bot_id = bot_id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations
                 WHERE bot_id = ?1 ORDER BY last_message_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![bot_id], row_to_conversation)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Close a conversation. Closing an already closed one is a no-op.
pub async fn close_conversation(db: &Database, id: &str) -> Result<(), WabotError> {
    let conversation_id = id.to_string();
    let now = now_timestamp();
    let changed = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE conversations SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![ConversationStatus::Closed.as_ref(), now, conversation_id],
            )?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(WabotError::not_found("conversation", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::bots::create_bot;
    use crate::queries::users::create_user;
    use std::sync::Arc;
    use tempfile::tempdir;
    use wabot_core::{Persona, Sender, User};

    async fn setup() -> (Database, Bot, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        create_user(&db, &User::new("u1", None)).await.unwrap();
        let bot = Bot::new(
            "u1",
            Persona {
                company: "Acme".into(),
                tone: "friendly".into(),
                instructions: "Be brief.".into(),
            },
            Some("acme-main".into()),
        );
        create_bot(&db, &bot).await.unwrap();
        (db, bot, dir)
    }

    #[tokio::test]
    async fn find_or_create_returns_same_thread() {
        let (db, bot, _dir) = setup().await;
        let first = find_or_create_active(&db, &bot, "5511999999999", "Ana")
            .await
            .unwrap();
        let second = find_or_create_active(&db, &bot, "5511999999999", "Ana")
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.user_id, "u1");
        assert_eq!(first.status, ConversationStatus::Active);
        assert!(first.messages.is_empty());
        assert_eq!(first.customer_name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn concurrent_find_or_create_converges() {
        let (db, bot, _dir) = setup().await;
        let db = Arc::new(db);
        let bot = Arc::new(bot);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = Arc::clone(&db);
            let bot = Arc::clone(&bot);
            handles.push(tokio::spawn(async move {
                find_or_create_active(&db, &bot, "5511888888888", "Bia")
                    .await
                    .unwrap()
                    .id
            }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(list_conversations(&db, &bot.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_round_trips_messages_in_order() {
        let (db, bot, _dir) = setup().await;
        let mut conversation = find_or_create_active(&db, &bot, "5511999999999", "Ana")
            .await
            .unwrap();
        conversation.append(Message::from_customer("Hi", Some("wamid-1".into())));
        conversation.append(Message::from_bot("Hello! How can I help?"));
        conversation.customer_name = Some("Ana Souza".into());
        save_conversation(&db, &conversation).await.unwrap();

        let loaded = get_conversation(&db, &conversation.id).await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded.messages[0].sender, Sender::Customer);
        assert_eq!(loaded.messages[0].message_id.as_deref(), Some("wamid-1"));
        assert_eq!(loaded.messages[1].content, "Hello! How can I help?");
        assert_eq!(loaded.last_message_at, conversation.last_message_at);
        assert_eq!(loaded.customer_name.as_deref(), Some("Ana Souza"));
    }

    #[tokio::test]
    async fn closing_allows_a_new_active_thread() {
        let (db, bot, _dir) = setup().await;
        let first = find_or_create_active(&db, &bot, "5511999999999", "Ana")
            .await
            .unwrap();
        close_conversation(&db, &first.id).await.unwrap();

        let second = find_or_create_active(&db, &bot, "5511999999999", "Ana")
            .await
            .unwrap();
        assert_ne!(first.id, second.id);

        let closed = get_conversation(&db, &first.id).await.unwrap().unwrap();
        assert_eq!(closed.status, ConversationStatus::Closed);
        assert_eq!(list_conversations(&db, &bot.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_conversation_is_not_found() {
        let (db, bot, _dir) = setup().await;
        assert!(get_conversation(&db, "nope").await.unwrap().is_none());
        assert!(matches!(
            close_conversation(&db, "nope").await.unwrap_err(),
            WabotError::NotFound { .. }
        ));
        let ghost = Conversation::new(&bot, "1", "1");
        assert!(matches!(
            save_conversation(&db, &ghost).await.unwrap_err(),
            WabotError::NotFound { .. }
        ));
    }
}
