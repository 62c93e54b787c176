// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is a no-op.

use metrics::{describe_counter, describe_histogram};

/// Register all Wabot metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "wabot_webhook_events_total",
        "Webhook events received, by classified event kind"
    );
    describe_counter!(
        "wabot_dispatch_outcomes_total",
        "Inbound message dispatch outcomes"
    );
    describe_counter!(
        "wabot_completion_fallbacks_total",
        "Replies answered with a fallback phrase"
    );
    describe_counter!(
        "wabot_send_failures_total",
        "Replies the messaging gateway failed to deliver"
    );
    describe_histogram!(
        "wabot_completion_latency_seconds",
        "Completion service latency in seconds"
    );
}

/// Record a classified webhook event.
pub fn record_webhook_event(event: &str) {
    metrics::counter!("wabot_webhook_events_total", "event" => event.to_string()).increment(1);
}

/// Record the outcome of one inbound message dispatch.
pub fn record_dispatch_outcome(outcome: &str) {
    metrics::counter!("wabot_dispatch_outcomes_total", "outcome" => outcome.to_string())
        .increment(1);
}

/// Record a reply that fell back to an apology phrase.
pub fn record_completion_fallback() {
    metrics::counter!("wabot_completion_fallbacks_total").increment(1);
}

/// Record a failed reply delivery.
pub fn record_send_failure() {
    metrics::counter!("wabot_send_failures_total").increment(1);
}

/// Record completion latency.
pub fn record_completion_latency(seconds: f64) {
    metrics::histogram!("wabot_completion_latency_seconds").record(seconds);
}
