// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value persistence trait for settings and the token cache.

use crate::error::ParleyError;

/// A flat string-to-string persistent store.
///
/// Values are opaque to the store; callers serialize them (JSON in practice).
/// Operations are synchronous: every value is a small document read or
/// replaced whole.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, ParleyError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), ParleyError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), ParleyError>;
}
