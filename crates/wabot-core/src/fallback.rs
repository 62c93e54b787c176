// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rotation of apology phrases used when no model reply is available.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default fallback phrases.
pub const DEFAULT_FALLBACK_REPLIES: [&str; 4] = [
    "Sorry, I couldn't process your message right now. Could you try again in a moment?",
    "Apologies, I'm having trouble answering at the moment. Please send your message again shortly.",
    "Sorry for the inconvenience! I'm temporarily unavailable, but I'll be back soon.",
    "I'm sorry, something went wrong on my side. Could you repeat your question?",
];

/// Round-robin rotation over a fixed, non-empty list of phrases.
#[derive(Debug)]
pub struct FallbackReplies {
    phrases: Vec<String>,
    cursor: AtomicUsize,
}

impl FallbackReplies {
    /// Builds a rotation from `phrases`; an empty list falls back to the defaults.
    pub fn new(phrases: Vec<String>) -> Self {
        let phrases = if phrases.is_empty() {
            DEFAULT_FALLBACK_REPLIES.iter().map(|p| p.to_string()).collect()
        } else {
            phrases
        };
        Self {
            phrases,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Returns the next phrase.
    pub fn next(&self) -> String {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.phrases.len();
        self.phrases[idx].clone()
    }

    /// Returns true when `text` is one of the rotation's phrases.
    pub fn contains(&self, text: &str) -> bool {
        self.phrases.iter().any(|p| p == text)
    }

    /// All phrases in rotation order.
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

impl Default for FallbackReplies {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
