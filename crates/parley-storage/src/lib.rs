// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence layer for the Parley chat client.
//!
//! Provides the file-backed [`FileStore`] (one JSON document per key,
//! replaced atomically), an in-memory [`MemoryStore`] for tests, and the
//! [`SettingsStore`] that keeps the user's chat configuration.

pub mod file;
pub mod memory;
pub mod settings;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use settings::{SETTINGS_KEY, SettingsStore};
