// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composition root: storage, settings, the identity session and the engine.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use parley_auth::{AuthStatus, SessionManager, SessionSlot};
use parley_chat::{ChatEngine, PollPolicy, TurnOutcome};
use parley_config::ParleyConfig;
use parley_core::{ChatSettings, KeyValueStore, ParleyError, PromptSink, SettingsPatch};
use parley_entra::{EntraConfig, EntraIdentityClient};
use parley_foundry::FoundryConnector;
use parley_storage::{FileStore, SettingsStore};

/// Everything the shell and the one-shot subcommands share.
pub struct App {
    pub config: ParleyConfig,
    pub settings: SettingsStore,
    pub engine: ChatEngine,
    data_dir: PathBuf,
    store: Arc<dyn KeyValueStore>,
    slot: SessionSlot,
    connector: FoundryConnector,
    prompts: Arc<dyn PromptSink>,
}

impl App {
    pub fn new(config: ParleyConfig, prompts: Arc<dyn PromptSink>) -> Self {
        let data_dir = PathBuf::from(&config.storage.data_dir);
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&data_dir));
        let settings = SettingsStore::load(store.clone());
        let engine = ChatEngine::new(PollPolicy::from(&config.polling));
        let connector = FoundryConnector::new(config.service.clone());
        info!(data_dir = %data_dir.display(), "parley started");
        Self {
            config,
            settings,
            engine,
            data_dir,
            store,
            slot: SessionSlot::new(),
            connector,
            prompts,
        }
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// The session, if it has been built.
    pub fn built_session(&self) -> Option<Arc<SessionManager>> {
        self.slot.get()
    }

    /// Returns the session, building it from the current settings on first use.
    ///
    /// The identity client keeps the client id and tenant it was built with
    /// for the life of the process.
    pub async fn session(&self) -> Result<Arc<SessionManager>, ParleyError> {
        let settings = self.settings.current();
        if !settings.has_identity() {
            return Err(ParleyError::Config(
                "endpoint, client ID and tenant ID must be set first (/settings)".into(),
            ));
        }
        let store = self.store.clone();
        let prompts = self.prompts.clone();
        let identity = self.config.identity.clone();
        self.slot
            .get_or_init(move || async move {
                let client = EntraIdentityClient::new(
                    EntraConfig {
                        client_id: settings.client_id,
                        tenant_id: settings.tenant_id,
                        authority_host: identity.authority_host,
                        request_timeout: Duration::from_secs(identity.request_timeout_secs),
                    },
                    store,
                    prompts,
                )?;
                Ok(SessionManager::new(Arc::new(client), settings.scopes))
            })
            .await
    }

    pub async fn auth_status(&self) -> Option<AuthStatus> {
        match self.slot.get() {
            Some(session) => Some(session.status().await),
            None => None,
        }
    }

    /// Saves edited settings and refreshes the session's scopes.
    pub fn save_settings(&self, patch: SettingsPatch) -> ChatSettings {
        let saved = self.settings.update(patch);
        if let Some(session) = self.slot.get() {
            session.set_scopes(saved.scopes.clone());
        }
        saved
    }

    /// Runs one chat turn with the current settings.
    pub async fn send(&self, content: &str) -> Result<TurnOutcome, ParleyError> {
        let session = self.session().await?;
        let settings = self.settings.current();
        Ok(self
            .engine
            .submit(content, &settings, session.as_ref(), &self.connector)
            .await)
    }

    pub async fn shutdown(&self) {
        self.engine.cancel_turn();
        if let Err(e) = self.slot.shutdown().await {
            warn!(error = %e, "identity session shutdown failed");
        }
    }
}
