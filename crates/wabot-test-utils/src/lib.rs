// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Wabot integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without a gateway or completion API.
//!
//! # Components
//!
//! - [`MockGateway`] - records sent replies, scripted connection states
//! - [`MockCompletion`] - queued replies, failure mode with fallback rotation
//! - [`FaultyStorage`] - storage wrapper with switchable save and lookup failures
//! - [`TestHarness`] - temp SQLite storage, a seeded bot, and the webhook pipeline
//! - [`payloads`] - builders for gateway webhook bodies

pub mod faulty_storage;
pub mod harness;
pub mod mock_completion;
pub mod mock_gateway;
pub mod payloads;

pub use faulty_storage::FaultyStorage;
pub use harness::{TEST_INSTANCE, TEST_USER, TestHarness};
pub use mock_completion::MockCompletion;
pub use mock_gateway::{MockGateway, SentText};
