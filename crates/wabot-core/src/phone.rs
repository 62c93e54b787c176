// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number canonicalization.
//!
//! Conversations are keyed by digits-only phone numbers. Inbound numbers
//! arrive as WhatsApp JIDs (`5511999999999@s.whatsapp.net`); outbound numbers
//! must carry a country code before they reach the gateway.

/// Extracts the digits-only phone number from a WhatsApp remote JID.
///
/// Strips the `@domain` suffix and any `:device` suffix. Returns `None` when
/// no digits remain.
pub fn phone_from_jid(jid: &str) -> Option<String> {
    let user = jid.split('@').next().unwrap_or_default();
    let user = user.split(':').next().unwrap_or_default();
    let digits: String = user.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() { None } else { Some(digits) }
}

/// Normalizes a phone number to digits with country code.
///
/// A leading `+` or `00` marks the number as international: only its digits
/// are kept. Otherwise non-digits are stripped, leading trunk zeros dropped,
/// and numbers of national length (10 or 11 digits) get
/// `default_country_code` prepended. Bare 11-digit international numbers
/// (`+1`, `+7`) are indistinguishable from national ones, so callers holding
/// an international number must pass it with `+`.
pub fn normalize_phone(raw: &str, default_country_code: &str) -> String {
    let raw = raw.trim();
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if raw.starts_with('+') {
        return digits;
    }
    if let Some(rest) = digits.strip_prefix("00") {
        return rest.to_string();
    }
    let digits = digits.trim_start_matches('0');
    match digits.len() {
        10 | 11 => format!("{default_country_code}{digits}"),
        _ => digits.to_string(),
    }
}
