// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The user's chat configuration, persisted through a [`KeyValueStore`].
//!
//! Reads and writes never fail outward: a missing or unreadable record
//! yields defaults, and a failed write leaves the in-memory value updated.
//! Both cases are logged.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use parley_core::{ChatSettings, KeyValueStore, SettingsPatch};
use tracing::{debug, warn};

/// Key the settings record is stored under.
pub const SETTINGS_KEY: &str = "azure-chat-config";

/// Owns the current [`ChatSettings`] and mirrors complete records to storage.
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<ChatSettings>,
}

impl SettingsStore {
    /// Loads the persisted record merged over defaults.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let current = read_persisted(store.as_ref());
        Self {
            store,
            current: RwLock::new(current),
        }
    }

    /// A copy of the current settings.
    pub fn current(&self) -> ChatSettings {
        self.read().clone()
    }

    pub fn is_configured(&self) -> bool {
        self.read().is_configured()
    }

    /// Merges `patch` and persists the result if it carries a full identity.
    ///
    /// Returns the merged settings.
    pub fn update(&self, patch: SettingsPatch) -> ChatSettings {
        let merged = {
            let mut current = self.write();
            current.apply(patch);
            current.clone()
        };

        if !merged.has_identity() {
            debug!("settings incomplete; not persisting");
            return merged;
        }

        match serde_json::to_string(&merged) {
            Ok(json) => {
                if let Err(e) = self.store.set(SETTINGS_KEY, &json) {
                    warn!(error = %e, "failed to save settings");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize settings"),
        }
        merged
    }

    /// Restores defaults and erases the persisted record.
    pub fn reset(&self) {
        *self.write() = ChatSettings::default();
        if let Err(e) = self.store.remove(SETTINGS_KEY) {
            warn!(error = %e, "failed to erase saved settings");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ChatSettings> {
        self.current.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ChatSettings> {
        self.current.write().unwrap_or_else(|p| p.into_inner())
    }
}

fn read_persisted(store: &dyn KeyValueStore) -> ChatSettings {
    let raw = match store.get(SETTINGS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return ChatSettings::default(),
        Err(e) => {
            warn!(error = %e, "failed to load settings; using defaults");
            return ChatSettings::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load settings; using defaults");
        ChatSettings::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use proptest::prelude::*;
    use tracing_test::traced_test;

    fn complete_patch() -> SettingsPatch {
        SettingsPatch {
            endpoint: Some("https://proj.services.ai.azure.com/api/projects/demo".into()),
            client_id: Some("00000000-0000-0000-0000-000000000001".into()),
            tenant_id: Some("contoso.onmicrosoft.com".into()),
            ..SettingsPatch::default()
        }
    }

    #[test]
    fn fresh_store_yields_defaults() {
        let settings = SettingsStore::load(Arc::new(MemoryStore::new()));
        assert_eq!(settings.current(), ChatSettings::default());
        assert!(!settings.is_configured());
    }

    #[test]
    fn complete_update_persists_and_reloads() {
        let kv = Arc::new(MemoryStore::new());
        let settings = SettingsStore::load(kv.clone());
        settings.update(complete_patch());
        settings.update(SettingsPatch {
            agent_id: Some(Some("asst_abc".into())),
            ..SettingsPatch::default()
        });

        let reloaded = SettingsStore::load(kv);
        assert!(reloaded.is_configured());
        assert_eq!(reloaded.current().agent_id(), Some("asst_abc"));
    }

    #[test]
    fn partial_update_stays_in_memory() {
        let kv = Arc::new(MemoryStore::new());
        let settings = SettingsStore::load(kv.clone());
        let merged = settings.update(SettingsPatch {
            endpoint: Some("https://example".into()),
            ..SettingsPatch::default()
        });

        assert_eq!(merged.endpoint, "https://example");
        assert_eq!(settings.current().endpoint, "https://example");
        assert!(kv.is_empty());
    }

    #[test]
    fn reset_then_load_returns_defaults() {
        let kv = Arc::new(MemoryStore::new());
        let settings = SettingsStore::load(kv.clone());
        settings.update(complete_patch());
        settings.reset();

        assert_eq!(settings.current(), ChatSettings::default());
        assert_eq!(SettingsStore::load(kv).current(), ChatSettings::default());
    }

    #[test]
    fn stored_record_merges_over_defaults() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(
            SETTINGS_KEY,
            r#"{"azureEndpoint":"https://e","clientId":"c","tenantId":"t"}"#,
        )
        .unwrap();
        let settings = SettingsStore::load(kv).current();
        assert_eq!(settings.scopes, ChatSettings::default().scopes);
        assert!(settings.is_configured());
    }

    #[traced_test]
    #[test]
    fn corrupt_record_falls_back_to_defaults() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(SETTINGS_KEY, "{not json").unwrap();

        let settings = SettingsStore::load(kv);
        assert_eq!(settings.current(), ChatSettings::default());
        assert!(logs_contain("failed to load settings"));
    }

    fn field() -> impl Strategy<Value = Option<String>> {
        prop_oneof![Just(None), Just(Some(String::new())), "[a-z]{1,8}".prop_map(Some)]
    }

    proptest! {
        #[test]
        fn persisted_only_with_full_identity(
            endpoint in field(),
            client_id in field(),
            tenant_id in field(),
        ) {
            let kv = Arc::new(MemoryStore::new());
            let settings = SettingsStore::load(kv.clone());
            let merged = settings.update(SettingsPatch {
                endpoint,
                client_id,
                tenant_id,
                ..SettingsPatch::default()
            });
            prop_assert_eq!(kv.get(SETTINGS_KEY).unwrap().is_some(), merged.has_identity());
            prop_assert_eq!(settings.is_configured(), merged.has_identity());
        }
    }
}
