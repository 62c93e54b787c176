// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the webhook pipeline over temp SQLite and mock adapters.

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::json;
use wabot_core::{BotStatus, ConversationStatus, MessagingGateway, Sender, StorageAdapter, WabotError};
use wabot_dispatch::{DispatchOutcome, ProjectionOutcome, WebhookOutcome, sync_statuses};
use wabot_test_utils::payloads::{
    connection_update, from_me_message, message_upsert, qrcode_updated, sticker_message,
    text_message,
};
use wabot_test_utils::{TEST_INSTANCE, TestHarness};

const PHONE: &str = "5511999999999";

fn replied(outcome: &WebhookOutcome) -> bool {
    matches!(outcome, WebhookOutcome::Message(DispatchOutcome::Replied { .. }))
}

#[tokio::test]
async fn text_message_creates_conversation_and_replies() {
    let h = TestHarness::builder()
        .with_responses(vec!["Hello! How can I help?"])
        .build()
        .await
        .unwrap();

    let outcome = h.deliver(&text_message(TEST_INSTANCE, PHONE, "Hi")).await.unwrap();
    assert!(replied(&outcome), "got {outcome:?}");

    let conversations = h.conversations().await;
    assert_eq!(conversations.len(), 1);
    let c = &conversations[0];
    assert_eq!(c.customer_phone, PHONE);
    assert_eq!(c.customer_name.as_deref(), Some("Ana"));
    assert_eq!(c.status, ConversationStatus::Active);
    assert_eq!(c.messages.len(), 2);
    assert_eq!(c.messages[0].sender, Sender::Customer);
    assert_eq!(c.messages[0].content, "Hi");
    assert!(c.messages[0].message_id.as_deref().is_some_and(|id| id.starts_with("WAMID-")));
    assert_eq!(c.messages[1].sender, Sender::Bot);
    assert_eq!(c.messages[1].content, "Hello! How can I help?");
    assert_eq!(c.last_message_at, c.messages[1].timestamp);

    let calls = h.completion.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.company, "Acme Store");
    assert_eq!(calls[0].1, "Hi");

    let sent = h.gateway.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].instance, TEST_INSTANCE);
    assert_eq!(sent[0].phone, format!("+{PHONE}"));
    assert_eq!(sent[0].text, "Hello! How can I help?");

    assert_eq!(h.messages_used().await, 2);
}

#[tokio::test]
async fn completion_failure_still_replies_with_fallback() {
    let h = TestHarness::new().await.unwrap();
    h.completion.set_failing(true);

    let outcome = h.deliver(&text_message(TEST_INSTANCE, PHONE, "Hi")).await.unwrap();
    assert!(replied(&outcome), "got {outcome:?}");

    let sent = h.gateway.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(h.completion.fallback().contains(&sent[0].text));

    let c = &h.conversations().await[0];
    assert_eq!(c.messages[1].content, sent[0].text);
}

#[tokio::test]
async fn completion_timeout_falls_back() {
    let h = TestHarness::builder()
        .with_timeouts(Duration::from_millis(50), Duration::from_secs(5))
        .build()
        .await
        .unwrap();
    h.completion.set_delay(Duration::from_secs(2)).await;

    let outcome = h.deliver(&text_message(TEST_INSTANCE, PHONE, "Hi")).await.unwrap();
    assert!(replied(&outcome));
    let sent = h.gateway.sent().await;
    assert!(h.completion.fallback().contains(&sent[0].text));
}

#[tokio::test]
async fn completion_timeout_counts_a_single_fallback() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let _guard = metrics::set_default_local_recorder(&recorder);

    let h = TestHarness::builder()
        .with_timeouts(Duration::from_millis(50), Duration::from_secs(5))
        .build()
        .await
        .unwrap();
    h.completion.set_delay(Duration::from_secs(2)).await;

    let outcome = h.deliver(&text_message(TEST_INSTANCE, PHONE, "Hi")).await.unwrap();
    assert!(replied(&outcome));
    let text = handle.render();
    assert!(text.contains("wabot_completion_fallbacks_total 1"), "{text}");
}

#[tokio::test]
async fn undelivered_reply_is_kept_and_counted() {
    let h = TestHarness::new().await.unwrap();
    h.gateway.set_deliver(false);

    let outcome = h.deliver(&text_message(TEST_INSTANCE, PHONE, "Hi")).await.unwrap();
    match outcome {
        WebhookOutcome::Message(DispatchOutcome::Replied { delivered, .. }) => assert!(!delivered),
        other => panic!("expected Replied, got {other:?}"),
    }
    assert_eq!(h.conversations().await[0].messages.len(), 2);
    assert_eq!(h.messages_used().await, 2);
}

#[tokio::test]
async fn slow_send_times_out_as_undelivered() {
    let h = TestHarness::builder()
        .with_timeouts(Duration::from_secs(5), Duration::from_millis(50))
        .build()
        .await
        .unwrap();
    h.gateway.set_send_delay(Duration::from_secs(2)).await;

    let outcome = h.deliver(&text_message(TEST_INSTANCE, PHONE, "Hi")).await.unwrap();
    assert!(matches!(
        outcome,
        WebhookOutcome::Message(DispatchOutcome::Replied { delivered: false, .. })
    ));
}

#[tokio::test]
async fn second_message_reuses_conversation() {
    let h = TestHarness::builder()
        .with_responses(vec!["first reply", "second reply"])
        .build()
        .await
        .unwrap();

    h.deliver(&text_message(TEST_INSTANCE, PHONE, "Hi")).await.unwrap();
    h.deliver(&text_message(TEST_INSTANCE, PHONE, "Where is my order?"))
        .await
        .unwrap();

    let conversations = h.conversations().await;
    assert_eq!(conversations.len(), 1);
    let contents: Vec<&str> = conversations[0]
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(
        contents,
        vec!["Hi", "first reply", "Where is my order?", "second reply"]
    );
    assert_eq!(h.messages_used().await, 4);
}

#[tokio::test]
async fn sticker_only_message_is_answered_as_placeholder() {
    let h = TestHarness::new().await.unwrap();
    let outcome = h.deliver(&sticker_message(TEST_INSTANCE, PHONE)).await.unwrap();
    assert!(replied(&outcome));

    let c = &h.conversations().await[0];
    assert_eq!(c.messages[0].content, "[Sticker]");
    // Without a pushName the display name is the phone number.
    assert_eq!(c.customer_name.as_deref(), Some(PHONE));
    assert_eq!(h.completion.calls().await[0].1, "[Sticker]");
}

#[tokio::test]
async fn self_authored_message_is_a_noop() {
    let h = TestHarness::new().await.unwrap();
    let payload = from_me_message(TEST_INSTANCE, PHONE, "sent from phone");

    for _ in 0..2 {
        let outcome = h.deliver(&payload).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Message(DispatchOutcome::FromMe));
    }
    assert!(h.conversations().await.is_empty());
    assert!(h.completion.calls().await.is_empty());
    assert_eq!(h.gateway.sent_count().await, 0);
    assert_eq!(h.messages_used().await, 0);
}

#[tokio::test]
async fn guard_noops_create_no_state() {
    let h = TestHarness::new().await.unwrap();

    let cases = [
        (
            json!({"event": "messages.upsert", "data": {"messages": []}}),
            DispatchOutcome::NoMessages,
        ),
        (
            message_upsert(TEST_INSTANCE, PHONE, None, json!({"reactionMessage": {"text": "+1"}})),
            DispatchOutcome::NoContent,
        ),
        (
            json!({"event": "messages.upsert", "data": {"messages": [
                {"key": {"remoteJid": "@s.whatsapp.net", "fromMe": false}, "message": {"conversation": "hi"}}
            ]}}),
            DispatchOutcome::NoPhone,
        ),
        (
            message_upsert("other-instance", PHONE, None, json!({"conversation": "hi"})),
            DispatchOutcome::UnknownBot,
        ),
    ];

    for (payload, expected) in cases {
        for _ in 0..2 {
            let outcome = h.deliver(&payload).await.unwrap();
            assert_eq!(outcome, WebhookOutcome::Message(expected.clone()));
        }
    }
    assert!(h.conversations().await.is_empty());
    assert_eq!(h.gateway.sent_count().await, 0);
    assert_eq!(h.messages_used().await, 0);
}

#[tokio::test]
async fn deactivated_bot_does_not_answer() {
    let h = TestHarness::new().await.unwrap();
    h.storage.deactivate_bot(&h.bot.id).await.unwrap();

    let outcome = h.deliver(&text_message(TEST_INSTANCE, PHONE, "Hi")).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Message(DispatchOutcome::InactiveBot));
    assert!(h.conversations().await.is_empty());
}

#[tokio::test]
async fn missing_data_is_rejected_before_storage() {
    let h = TestHarness::new().await.unwrap();
    let err = h
        .deliver(&json!({"event": "messages.upsert"}))
        .await
        .unwrap_err();
    assert!(matches!(err, WabotError::InvalidPayload(_)));
    assert!(h.conversations().await.is_empty());
}

#[tokio::test]
async fn unknown_event_is_acknowledged() {
    let h = TestHarness::new().await.unwrap();
    let outcome = h
        .deliver(&json!({"event": "presence.update", "data": {"id": "x"}}))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        WebhookOutcome::Ignored {
            event: "presence.update".into()
        }
    );
}

#[tokio::test]
async fn path_instance_is_used_when_body_has_none() {
    let h = TestHarness::new().await.unwrap();
    let mut payload = text_message(TEST_INSTANCE, PHONE, "Hi");
    payload.as_object_mut().unwrap().remove("instance");

    let outcome = h.pipeline.handle_webhook(TEST_INSTANCE, &payload).await.unwrap();
    assert!(replied(&outcome));
}

#[tokio::test]
async fn body_instance_cannot_reroute_a_delivery() {
    let h = TestHarness::new().await.unwrap();

    let mismatched = text_message("some-other-instance", PHONE, "Hi");
    let outcome = h.pipeline.handle_webhook(TEST_INSTANCE, &mismatched).await.unwrap();
    assert!(replied(&outcome));
    assert_eq!(h.gateway.sent().await[0].instance, TEST_INSTANCE);

    let spoofed = text_message(TEST_INSTANCE, "5511888888888", "Hi");
    let outcome = h.pipeline.handle_webhook("unbound-path", &spoofed).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Message(DispatchOutcome::UnknownBot));
    assert_eq!(h.gateway.sent_count().await, 1);
    assert_eq!(h.conversations().await.len(), 1);

    let status = connection_update(TEST_INSTANCE, "open");
    let outcome = h.pipeline.handle_webhook("unbound-path", &status).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Status(ProjectionOutcome::UnknownInstance));
    assert_eq!(h.reload_bot().await.unwrap().status, BotStatus::Inactive);
}

#[tokio::test]
async fn failed_save_is_reported_but_reply_and_usage_stand() {
    let h = TestHarness::builder()
        .with_responses(vec!["We open at 9."])
        .build()
        .await
        .unwrap();
    h.faults.set_fail_saves(true);

    let outcome = h.deliver(&text_message(TEST_INSTANCE, PHONE, "When do you open?")).await.unwrap();
    match outcome {
        WebhookOutcome::Message(DispatchOutcome::Failed { reason }) => {
            assert!(reason.contains("injected save failure"), "got: {reason}");
        }
        other => panic!("expected a failed turn, got {other:?}"),
    }

    // The reply went out before the write failed; no rollback.
    let sent = h.gateway.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, "We open at 9.");
    assert_eq!(h.messages_used().await, 2);

    // The thread exists but holds none of the turn's messages.
    let conversations = h.conversations().await;
    assert_eq!(conversations.len(), 1);
    assert!(conversations[0].messages.is_empty());

    h.faults.set_fail_saves(false);
    let outcome = h.deliver(&text_message(TEST_INSTANCE, PHONE, "Thanks")).await.unwrap();
    assert!(replied(&outcome));
    let conversations = h.conversations().await;
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].messages.len(), 2);
}

#[tokio::test]
async fn failed_bot_lookup_is_reported_without_side_effects() {
    let h = TestHarness::new().await.unwrap();
    h.faults.set_fail_lookups(true);

    let outcome = h.deliver(&text_message(TEST_INSTANCE, PHONE, "Hi")).await.unwrap();
    assert!(matches!(
        outcome,
        WebhookOutcome::Message(DispatchOutcome::Failed { .. })
    ));
    assert_eq!(h.gateway.sent_count().await, 0);
    assert!(h.completion.calls().await.is_empty());
    assert_eq!(h.messages_used().await, 0);
}

#[tokio::test]
async fn reply_recipient_keeps_the_jid_country_code() {
    let h = TestHarness::new().await.unwrap();
    let outcome = h.deliver(&text_message(TEST_INSTANCE, "12125551234", "Hello")).await.unwrap();
    assert!(replied(&outcome));

    let sent = h.gateway.sent().await;
    assert_eq!(sent[0].phone, "+12125551234");
    assert_eq!(
        wabot_core::phone::normalize_phone(&sent[0].phone, "55"),
        "12125551234"
    );
    assert_eq!(h.conversations().await[0].customer_phone, "12125551234");
}

#[tokio::test]
async fn closed_conversation_starts_a_new_thread() {
    let h = TestHarness::new().await.unwrap();
    h.deliver(&text_message(TEST_INSTANCE, PHONE, "Hi")).await.unwrap();
    let first = h.conversations().await[0].id.clone();
    h.storage.close_conversation(&first).await.unwrap();

    h.deliver(&text_message(TEST_INSTANCE, PHONE, "Hi again")).await.unwrap();
    let conversations = h.conversations().await;
    assert_eq!(conversations.len(), 2);
    let active: Vec<_> = conversations
        .iter()
        .filter(|c| c.status == ConversationStatus::Active)
        .collect();
    assert_eq!(active.len(), 1);
    assert_ne!(active[0].id, first);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_messages_share_one_conversation() {
    let h = Arc::new(TestHarness::new().await.unwrap());

    let mut handles = Vec::new();
    for i in 0..6 {
        let h = Arc::clone(&h);
        handles.push(tokio::spawn(async move {
            h.deliver(&text_message(TEST_INSTANCE, PHONE, &format!("message {i}")))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        assert!(replied(&handle.await.unwrap()));
    }

    let conversations = h.conversations().await;
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].messages.len(), 12);
    // Turns never interleave: each customer message is followed by its reply.
    for pair in conversations[0].messages.chunks(2) {
        assert_eq!(pair[0].sender, Sender::Customer);
        assert_eq!(pair[1].sender, Sender::Bot);
    }
    assert_eq!(h.messages_used().await, 12);
    assert_eq!(h.pipeline.dispatcher().in_flight_turns(), 0);
}

#[tokio::test]
async fn connection_open_marks_connected_and_clears_qr() {
    let h = TestHarness::new().await.unwrap();
    h.deliver(&qrcode_updated(TEST_INSTANCE, "data:image/png;base64,QR"))
        .await
        .unwrap();
    let bot = h.reload_bot().await.unwrap();
    assert_eq!(bot.status, BotStatus::Connecting);
    assert_eq!(bot.qr_code.as_deref(), Some("data:image/png;base64,QR"));

    let outcome = h.deliver(&connection_update(TEST_INSTANCE, "open")).await.unwrap();
    assert_eq!(
        outcome,
        WebhookOutcome::Status(ProjectionOutcome::Updated {
            bot_id: h.bot.id.clone(),
            status: BotStatus::Connected
        })
    );
    let bot = h.reload_bot().await.unwrap();
    assert_eq!(bot.status, BotStatus::Connected);
    assert!(bot.qr_code.is_none());
}

#[tokio::test]
async fn connection_states_follow_the_table() {
    let h = TestHarness::new().await.unwrap();
    for (state, expected) in [
        ("connecting", BotStatus::Connecting),
        ("close", BotStatus::Inactive),
        ("refused", BotStatus::Error),
    ] {
        h.deliver(&connection_update(TEST_INSTANCE, state)).await.unwrap();
        assert_eq!(h.reload_bot().await.unwrap().status, expected, "state {state}");
    }
}

#[tokio::test]
async fn status_events_for_unknown_instance_are_noops() {
    let h = TestHarness::new().await.unwrap();
    let outcome = h.deliver(&connection_update("ghost", "open")).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Status(ProjectionOutcome::UnknownInstance));
    assert_eq!(h.reload_bot().await.unwrap().status, BotStatus::Inactive);

    let outcome = h
        .deliver(&json!({"event": "qrcode.updated", "instance": TEST_INSTANCE, "data": {"qrcode": {}}}))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Status(ProjectionOutcome::NothingToProject));
}

#[tokio::test]
async fn sync_projects_gateway_states() {
    let h = TestHarness::new().await.unwrap();
    h.gateway.set_state(TEST_INSTANCE, "open").await;

    let storage: Arc<dyn StorageAdapter> = Arc::clone(&h.storage);
    let gateway: Arc<dyn MessagingGateway> = h.gateway.clone();
    let reports = sync_statuses(&storage, &gateway).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].result, Ok(BotStatus::Connected));
    assert_eq!(h.reload_bot().await.unwrap().status, BotStatus::Connected);

    let silent = wabot_test_utils::MockGateway::new();
    let silent: Arc<dyn MessagingGateway> = Arc::new(silent);
    let reports = sync_statuses(&storage, &silent).await.unwrap();
    assert!(reports[0].result.is_err());
    assert_eq!(h.reload_bot().await.unwrap().status, BotStatus::Connected);
}
