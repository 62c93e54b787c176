// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook entry point: classify, then route to the orchestrator or projector.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use wabot_core::{CompletionService, MessagingGateway, StorageAdapter, WabotError};

use crate::dispatch::{DispatchOutcome, DispatchTimeouts, Dispatcher};
use crate::event::{InboundEvent, body_instance, classify};
use crate::status::{ProjectionOutcome, StatusProjector};

/// What a webhook delivery resulted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Message(DispatchOutcome),
    Status(ProjectionOutcome),
    Ignored { event: String },
}

/// The classified-event router shared by all webhook requests.
pub struct Pipeline {
    dispatcher: Dispatcher,
    projector: StatusProjector,
}

impl Pipeline {
    /// Wires the pipeline from capabilities constructed once at startup.
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        gateway: Arc<dyn MessagingGateway>,
        completion: Arc<dyn CompletionService>,
        timeouts: DispatchTimeouts,
    ) -> Self {
        Self {
            projector: StatusProjector::new(Arc::clone(&storage)),
            dispatcher: Dispatcher::new(storage, gateway, completion, timeouts),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handles one webhook body delivered on `path_instance`.
    ///
    /// The path decides which bot is addressed; an `instance` field in the
    /// body is only checked against it.
    ///
    /// Only malformed bodies are errors; every classified event, including
    /// ignored ones, yields an outcome.
    pub async fn handle_webhook(
        &self,
        path_instance: &str,
        payload: &Value,
    ) -> Result<WebhookOutcome, WabotError> {
        let event = classify(payload)?;
        let instance = path_instance;
        if let Some(claimed) = body_instance(payload).filter(|b| *b != path_instance) {
            warn!(instance, claimed, "body instance does not match webhook path, using path");
        }
        wabot_prometheus::record_webhook_event(event.kind());
        debug!(instance, event = event.kind(), "webhook classified");

        let outcome = match event {
            InboundEvent::MessageReceived(data) => {
                WebhookOutcome::Message(self.dispatcher.handle_message(instance, &data).await)
            }
            InboundEvent::ConnectionChanged(data) => {
                WebhookOutcome::Status(self.projector.project_connection(instance, &data).await)
            }
            InboundEvent::QrCodeIssued(data) => {
                WebhookOutcome::Status(self.projector.project_qr_code(instance, &data).await)
            }
            InboundEvent::Unrecognized(tag) => {
                info!(instance, event = %tag, "unrecognized webhook event acknowledged");
                WebhookOutcome::Ignored { event: tag }
            }
        };
        Ok(outcome)
    }
}
