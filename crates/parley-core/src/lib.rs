// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley chat client.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Parley workspace. The identity client,
//! agent service client and key-value store all implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ParleyError;
pub use types::{
    Account, AdapterType, AgentRun, AgentThread, ChatSettings, Message, Role, RunStatus,
    SettingsPatch, ThreadMessage,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    AgentConnector, AgentService, CredentialProvider, IdentityClient, KeyValueStore,
    PromptSink, ServiceAdapter,
};
