// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface of the Wabot backend.
//!
//! Receives gateway webhooks on `/webhook/whatsapp/{instance_id}` and hands
//! them to the dispatch [`Pipeline`](wabot_dispatch::Pipeline). Also serves
//! `/health` and, when enabled, Prometheus `/metrics`.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, HealthState, ServerConfig, WEBHOOK_PATH, build_router, start_server};
