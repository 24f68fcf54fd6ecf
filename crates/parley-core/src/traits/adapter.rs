// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all network-facing adapters implement.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::AdapterType;

/// The base trait for Parley's network-facing adapters.
///
/// Provides identity for log lines and an explicit teardown hook.
#[async_trait]
pub trait ServiceAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the type of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Releases held resources and aborts background work.
    async fn shutdown(&self) -> Result<(), ParleyError>;
}
