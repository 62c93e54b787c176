// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-demand reconciliation of bot status with the gateway.

use std::sync::Arc;

use tracing::{info, warn};
use wabot_core::{BotStatus, MessagingGateway, StorageAdapter, WabotError};

use crate::status::{ProjectionOutcome, StatusProjector};

/// Result of syncing one bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub bot_id: String,
    pub instance: String,
    pub result: Result<BotStatus, String>,
}

/// Queries the gateway for every active bot bound to an instance and
/// projects the reported state.
///
/// Per-bot gateway or storage failures are reported, not propagated. Only a
/// failure to list bots is an error.
pub async fn sync_statuses(
    storage: &Arc<dyn StorageAdapter>,
    gateway: &Arc<dyn MessagingGateway>,
) -> Result<Vec<SyncReport>, WabotError> {
    let projector = StatusProjector::new(Arc::clone(storage));
    let bots = storage.list_bots(true).await?;
    let mut reports = Vec::with_capacity(bots.len());

    for bot in bots {
        let Some(instance) = bot.instance_id.clone() else {
            continue;
        };

        let result = match gateway.connection_state(&instance).await {
            Ok(state) => match projector.apply_state(&bot, &state).await {
                ProjectionOutcome::Updated { status, .. } => Ok(status),
                ProjectionOutcome::Failed { reason } => Err(reason),
                other => Err(format!("unexpected projection outcome: {other:?}")),
            },
            Err(e) => {
                warn!(bot_id = %bot.id, instance = %instance, error = %e, "connection state query failed");
                Err(e.to_string())
            }
        };

        reports.push(SyncReport {
            bot_id: bot.id,
            instance,
            result,
        });
    }

    info!(bots = reports.len(), "status sync finished");
    Ok(reports)
}
