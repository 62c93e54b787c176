// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod completion;
pub mod gateway;
pub mod storage;

pub use adapter::PluginAdapter;
pub use completion::CompletionService;
pub use gateway::MessagingGateway;
pub use storage::StorageAdapter;
