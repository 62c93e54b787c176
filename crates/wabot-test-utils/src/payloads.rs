// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for gateway webhook bodies in the shapes the gateway emits.

use serde_json::{Value, json};

/// JID for a phone number on the WhatsApp user domain.
pub fn jid(phone: &str) -> String {
    format!("{phone}@s.whatsapp.net")
}

/// `messages.upsert` carrying `message` from `phone`.
pub fn message_upsert(instance: &str, phone: &str, push_name: Option<&str>, message: Value) -> Value {
    let mut entry = json!({
        "key": {
            "remoteJid": jid(phone),
            "fromMe": false,
            "id": format!("WAMID-{}", uuid::Uuid::new_v4().simple()),
        },
        "message": message,
        "messageTimestamp": 1_700_000_000,
    });
    if let Some(name) = push_name {
        entry["pushName"] = json!(name);
    }
    json!({
        "event": "messages.upsert",
        "instance": instance,
        "data": {"messages": [entry]},
    })
}

/// `messages.upsert` with a plain text message.
pub fn text_message(instance: &str, phone: &str, text: &str) -> Value {
    message_upsert(instance, phone, Some("Ana"), json!({"conversation": text}))
}

/// `messages.upsert` with only a sticker.
pub fn sticker_message(instance: &str, phone: &str) -> Value {
    message_upsert(instance, phone, None, json!({"stickerMessage": {"mimetype": "image/webp"}}))
}

/// Text message echoed back from the bot's own number.
pub fn from_me_message(instance: &str, phone: &str, text: &str) -> Value {
    let mut payload = text_message(instance, phone, text);
    payload["data"]["messages"][0]["key"]["fromMe"] = json!(true);
    payload
}

/// `connection.update` reporting `state`.
pub fn connection_update(instance: &str, state: &str) -> Value {
    json!({
        "event": "connection.update",
        "instance": instance,
        "data": {"instance": instance, "state": state, "statusReason": 200},
    })
}

/// `qrcode.updated` carrying a base64 QR image.
pub fn qrcode_updated(instance: &str, base64: &str) -> Value {
    json!({
        "event": "qrcode.updated",
        "instance": instance,
        "data": {"qrcode": {"instance": instance, "code": "2@pairing", "base64": base64}},
    })
}
