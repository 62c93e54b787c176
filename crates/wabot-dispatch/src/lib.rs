// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook ingestion and conversation dispatch for Wabot.
//!
//! - [`event`] classifies loosely typed gateway webhooks into [`InboundEvent`]s.
//! - [`content`] extracts answerable text from a WhatsApp message.
//! - [`dispatch`] runs a conversation turn for an inbound message.
//! - [`status`] projects connection and QR events onto bot status.
//! - [`sync`] reconciles bot status with the gateway on demand.
//! - [`pipeline`] ties them together behind a single webhook entry point.

pub mod content;
pub mod dispatch;
pub mod event;
pub mod pipeline;
pub mod status;
pub mod sync;

pub use content::extract_content;
pub use dispatch::{DispatchOutcome, DispatchTimeouts, Dispatcher};
pub use event::{InboundEvent, classify};
pub use pipeline::{Pipeline, WebhookOutcome};
pub use status::{ProjectionOutcome, StatusProjector, map_connection_state};
pub use sync::{SyncReport, sync_statuses};
