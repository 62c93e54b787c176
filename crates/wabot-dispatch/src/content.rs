// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text extraction from WhatsApp message payloads.

use serde_json::Value;

/// Produces the text the bot should answer, or `None` when the message has
/// nothing it can read.
///
/// Checked in order: plain conversation text, extended text, image, video and
/// document captions, then audio and sticker placeholders. Empty strings
/// count as absent.
pub fn extract_content(message: &Value) -> Option<String> {
    if let Some(text) = non_empty(message.get("conversation")) {
        return Some(text.to_string());
    }
    if let Some(text) = non_empty(message.pointer("/extendedTextMessage/text")) {
        return Some(text.to_string());
    }

    const CAPTIONED: [(&str, &str); 3] = [
        ("/imageMessage/caption", "[Image] "),
        ("/videoMessage/caption", "[Video] "),
        ("/documentMessage/caption", "[Document] "),
    ];
    for (pointer, prefix) in CAPTIONED {
        if let Some(caption) = non_empty(message.pointer(pointer)) {
            return Some(format!("{prefix}{caption}"));
        }
    }

    if present(message.get("audioMessage")) {
        return Some("[Audio Message]".to_string());
    }
    if present(message.get("stickerMessage")) {
        return Some("[Sticker]".to_string());
    }
    None
}

fn non_empty(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn present(value: Option<&Value>) -> bool {
    matches!(value, Some(v) if !v.is_null())
}
