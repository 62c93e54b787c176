// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion service trait for AI reply generation.

use async_trait::async_trait;

use crate::traits::adapter::PluginAdapter;
use crate::types::Persona;

/// Produces a reply for a customer utterance in a bot's persona.
///
/// Infallible by contract: failures are turned into a fallback reply so the
/// customer always receives something.
#[async_trait]
pub trait CompletionService: PluginAdapter {
    /// Returns the model reply, or a fallback phrase when the service fails.
    async fn complete(&self, persona: &Persona, input: &str) -> String;

    /// Returns the next phrase from the fallback rotation.
    ///
    /// Callers that abandon [`complete`](Self::complete) (outer timeout) use
    /// this to keep the reply guarantee.
    fn fallback_reply(&self) -> String;
}
