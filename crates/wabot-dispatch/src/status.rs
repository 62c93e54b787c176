// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Projection of gateway connection events onto bot status.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use wabot_core::{Bot, BotStatus, QrCodeChange, StorageAdapter};

/// Maps a raw gateway connection state onto a bot status.
///
/// `open` is connected, `connecting` is connecting, `close`/`closed` is
/// inactive, and anything else is an error. Matching ignores case and
/// surrounding whitespace.
pub fn map_connection_state(state: &str) -> BotStatus {
    match state.trim().to_ascii_lowercase().as_str() {
        "open" => BotStatus::Connected,
        "connecting" => BotStatus::Connecting,
        "close" | "closed" => BotStatus::Inactive,
        _ => BotStatus::Error,
    }
}

/// Connection state carried by a `connection.update` body.
pub fn connection_state_of(data: &Value) -> Option<&str> {
    data.get("state")
        .and_then(Value::as_str)
        .or_else(|| data.get("connection").and_then(Value::as_str))
}

/// QR payload carried by a `qrcode.updated` body.
pub fn qr_payload_of(data: &Value) -> Option<&str> {
    let qrcode = data.get("qrcode");
    qrcode
        .and_then(|q| q.get("base64"))
        .and_then(Value::as_str)
        .or_else(|| qrcode.and_then(Value::as_str))
        .or_else(|| data.get("base64").and_then(Value::as_str))
        .filter(|s| !s.is_empty())
}

/// Result of projecting one connection or QR event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionOutcome {
    Updated { bot_id: String, status: BotStatus },
    /// No bot is bound to the instance.
    UnknownInstance,
    /// The event carried no usable state or QR payload.
    NothingToProject,
    /// Storage rejected the update.
    Failed { reason: String },
}

/// Persists bot status changes derived from gateway events.
#[derive(Clone)]
pub struct StatusProjector {
    storage: Arc<dyn StorageAdapter>,
}

impl StatusProjector {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Handles a `connection.update` body for `instance`.
    pub async fn project_connection(&self, instance: &str, data: &Value) -> ProjectionOutcome {
        let Some(state) = connection_state_of(data) else {
            warn!(instance, "connection update without state");
            return ProjectionOutcome::NothingToProject;
        };
        let bot = match self.bot_for(instance).await {
            Ok(Some(bot)) => bot,
            Ok(None) => return ProjectionOutcome::UnknownInstance,
            Err(outcome) => return outcome,
        };
        self.apply_state(&bot, state).await
    }

    /// Handles a `qrcode.updated` body for `instance`.
    ///
    /// A present QR payload is stored and forces the bot into `connecting`.
    pub async fn project_qr_code(&self, instance: &str, data: &Value) -> ProjectionOutcome {
        let Some(qr) = qr_payload_of(data) else {
            debug!(instance, "QR event without payload");
            return ProjectionOutcome::NothingToProject;
        };
        let bot = match self.bot_for(instance).await {
            Ok(Some(bot)) => bot,
            Ok(None) => return ProjectionOutcome::UnknownInstance,
            Err(outcome) => return outcome,
        };

        let status = BotStatus::Connecting;
        match self
            .storage
            .update_bot_status(&bot.id, status, QrCodeChange::Set(qr.to_string()))
            .await
        {
            Ok(()) => {
                info!(instance, bot_id = %bot.id, "pairing QR code stored");
                ProjectionOutcome::Updated {
                    bot_id: bot.id,
                    status,
                }
            }
            Err(e) => {
                warn!(instance, bot_id = %bot.id, error = %e, "failed to store QR code");
                ProjectionOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Applies a raw gateway state to `bot`. Shared with status sync.
    pub async fn apply_state(&self, bot: &Bot, state: &str) -> ProjectionOutcome {
        let status = map_connection_state(state);
        let qr = if status == BotStatus::Connected {
            QrCodeChange::Clear
        } else {
            QrCodeChange::Keep
        };

        match self.storage.update_bot_status(&bot.id, status, qr).await {
            Ok(()) => {
                info!(bot_id = %bot.id, state, status = %status, "bot status updated");
                ProjectionOutcome::Updated {
                    bot_id: bot.id.clone(),
                    status,
                }
            }
            Err(e) => {
                warn!(bot_id = %bot.id, error = %e, "failed to update bot status");
                ProjectionOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn bot_for(&self, instance: &str) -> Result<Option<Bot>, ProjectionOutcome> {
        match self.storage.find_bot_by_instance(instance).await {
            Ok(Some(bot)) => Ok(Some(bot)),
            Ok(None) => {
                debug!(instance, "no bot bound to instance");
                Ok(None)
            }
            Err(e) => {
                warn!(instance, error = %e, "bot lookup failed");
                Err(ProjectionOutcome::Failed {
                    reason: e.to_string(),
                })
            }
        }
    }
}
