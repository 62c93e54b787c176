// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event classification for inbound gateway webhooks.
//!
//! Webhook bodies are loosely typed `{event, instance?, data}` envelopes. They
//! are decoded into [`InboundEvent`] before any business logic runs.

use serde_json::Value;
use wabot_core::WabotError;

/// Canonical tag of an inbound message event.
pub const MESSAGES_UPSERT: &str = "messages.upsert";
/// Canonical tag of a connection state change.
pub const CONNECTION_UPDATE: &str = "connection.update";
/// Canonical tag of a freshly issued pairing QR code.
pub const QRCODE_UPDATED: &str = "qrcode.updated";

/// A classified webhook event carrying its `data` body.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    MessageReceived(Value),
    ConnectionChanged(Value),
    QrCodeIssued(Value),
    /// Any other tag, kept as received.
    Unrecognized(String),
}

impl InboundEvent {
    /// Metric label for this event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::MessageReceived(_) => MESSAGES_UPSERT,
            InboundEvent::ConnectionChanged(_) => CONNECTION_UPDATE,
            InboundEvent::QrCodeIssued(_) => QRCODE_UPDATED,
            InboundEvent::Unrecognized(_) => "unrecognized",
        }
    }
}

/// Normalizes an event tag: lowercase, `_` read as `.`.
///
/// `MESSAGES_UPSERT` and `messages.upsert` both become `messages.upsert`.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_lowercase().replace('_', ".")
}

/// Classifies a webhook body.
///
/// Errors with [`WabotError::InvalidPayload`] when the body is not a JSON
/// object or carries no `data`.
pub fn classify(payload: &Value) -> Result<InboundEvent, WabotError> {
    let body = payload
        .as_object()
        .ok_or_else(|| WabotError::InvalidPayload("webhook body must be a JSON object".into()))?;

    let data = match body.get("data") {
        Some(Value::Null) | None => {
            return Err(WabotError::InvalidPayload("missing data".into()));
        }
        Some(data) => data.clone(),
    };

    let tag = body.get("event").and_then(Value::as_str).unwrap_or_default();
    let event = match normalize_tag(tag).as_str() {
        MESSAGES_UPSERT => InboundEvent::MessageReceived(data),
        CONNECTION_UPDATE => InboundEvent::ConnectionChanged(data),
        QRCODE_UPDATED => InboundEvent::QrCodeIssued(data),
        _ => InboundEvent::Unrecognized(tag.to_string()),
    };
    Ok(event)
}

/// Instance named in the body, if any. Callers fall back to the URL path.
pub fn body_instance(payload: &Value) -> Option<&str> {
    payload
        .get("instance")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_known_tags() {
        let data = json!({"messages": []});
        assert_eq!(
            classify(&json!({"event": "messages.upsert", "data": data})).unwrap(),
            InboundEvent::MessageReceived(data.clone())
        );
        assert!(matches!(
            classify(&json!({"event": "connection.update", "data": {"state": "open"}})).unwrap(),
            InboundEvent::ConnectionChanged(_)
        ));
        assert!(matches!(
            classify(&json!({"event": "qrcode.updated", "data": {}})).unwrap(),
            InboundEvent::QrCodeIssued(_)
        ));
    }

    #[test]
    fn upper_snake_case_tags_are_accepted() {
        assert!(matches!(
            classify(&json!({"event": "MESSAGES_UPSERT", "data": {}})).unwrap(),
            InboundEvent::MessageReceived(_)
        ));
        assert!(matches!(
            classify(&json!({"event": "CONNECTION_UPDATE", "data": {}})).unwrap(),
            InboundEvent::ConnectionChanged(_)
        ));
        assert!(matches!(
            classify(&json!({"event": "QRCODE_UPDATED", "data": {}})).unwrap(),
            InboundEvent::QrCodeIssued(_)
        ));
    }

    #[test]
    fn unknown_tag_is_unrecognized() {
        let event = classify(&json!({"event": "presence.update", "data": {}})).unwrap();
        assert_eq!(event, InboundEvent::Unrecognized("presence.update".into()));
        assert_eq!(event.kind(), "unrecognized");
    }

    #[test]
    fn missing_event_tag_is_unrecognized() {
        assert_eq!(
            classify(&json!({"data": {}})).unwrap(),
            InboundEvent::Unrecognized(String::new())
        );
    }

    #[test]
    fn missing_or_null_data_is_invalid() {
        for payload in [
            json!({"event": "messages.upsert"}),
            json!({"event": "messages.upsert", "data": null}),
            json!(["not", "an", "object"]),
            json!("string"),
        ] {
            assert!(
                matches!(classify(&payload), Err(WabotError::InvalidPayload(_))),
                "payload {payload} should be rejected"
            );
        }
    }

    #[test]
    fn body_instance_ignores_empty() {
        assert_eq!(body_instance(&json!({"instance": "acme"})), Some("acme"));
        assert_eq!(body_instance(&json!({"instance": ""})), None);
        assert_eq!(body_instance(&json!({})), None);
    }
}
