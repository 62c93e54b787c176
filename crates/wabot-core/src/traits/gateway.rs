// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging gateway trait for WhatsApp instance providers.

use async_trait::async_trait;

use crate::error::WabotError;
use crate::traits::adapter::PluginAdapter;

/// Capability to deliver text through a gateway-managed WhatsApp instance.
#[async_trait]
pub trait MessagingGateway: PluginAdapter {
    /// Sends `text` to `phone` through `instance`.
    ///
    /// Returns `false` on any delivery failure. Implementations normalize the
    /// phone number (see [`normalize_phone`](crate::phone::normalize_phone);
    /// pass `+` for numbers that already carry a country code) and bound the
    /// call with their own timeout.
    async fn send_text(&self, instance: &str, phone: &str, text: &str) -> bool;

    /// Queries the raw connection state (`open`, `connecting`, `close`, ...) of `instance`.
    async fn connection_state(&self, instance: &str) -> Result<String, WabotError>;
}
