// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the seams between Parley components.
//!
//! Network-facing adapters extend the [`ServiceAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod agent;
pub mod credential;
pub mod identity;
pub mod storage;

// Re-export all traits at the traits module level for convenience.
pub use adapter::ServiceAdapter;
pub use agent::{AgentConnector, AgentService};
pub use credential::CredentialProvider;
pub use identity::{IdentityClient, PromptSink};
pub use storage::KeyValueStore;
