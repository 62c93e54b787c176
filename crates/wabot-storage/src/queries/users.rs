// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User rows and message usage accounting.

use rusqlite::params;
use wabot_core::types::now_timestamp;
use wabot_core::{User, WabotError};

use crate::database::{Database, map_tr_err};

/// Create a user; an existing id is left untouched.
pub async fn create_user(db: &Database, user: &User) -> Result<(), WabotError> {
    let user = user.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO users (id, email, messages_used, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user.id, user.email, user.messages_used, user.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a user by id.
pub async fn get_user(db: &Database, id: &str) -> Result<Option<User>, WabotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, email, messages_used, created_at FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        messages_used: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            );
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Add `amount` to a user's usage counter, creating the row if needed.
pub async fn increment_usage(db: &Database, user_id: &str, amount: i64) -> Result<(), WabotError> {
    let user_id = user_id.to_string();
    let now = now_timestamp();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, messages_used, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET messages_used = messages_used + excluded.messages_used",
                params![user_id, amount, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
