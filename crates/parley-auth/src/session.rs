// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session manager over an identity client.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::{debug, error, info, warn};

use parley_core::types::{Account, InteractionStatus};
use parley_core::{CredentialProvider, IdentityClient, ParleyError};

/// Lifecycle phase of a [`SessionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionPhase {
    /// Constructed; the identity client has not been touched.
    Uninitialized = 0,
    /// Loading the token cache and resolving a pending interaction.
    Initializing = 1,
    /// Accepting sign-in and token requests.
    Ready = 2,
}

impl SessionPhase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SessionPhase::Initializing,
            2 => SessionPhase::Ready,
            _ => SessionPhase::Uninitialized,
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Uninitialized => write!(f, "uninitialized"),
            SessionPhase::Initializing => write!(f, "initializing"),
            SessionPhase::Ready => write!(f, "ready"),
        }
    }
}

/// Snapshot of the session used for view selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStatus {
    pub ready: bool,
    pub interaction_in_progress: bool,
    pub account: Option<Account>,
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        self.account.is_some()
    }
}

/// Wraps one identity client with the configured scopes.
///
/// Until [`initialize`](SessionManager::initialize) finishes, `get_token`
/// yields nothing and no account is reported.
pub struct SessionManager {
    client: Arc<dyn IdentityClient>,
    scopes: RwLock<Vec<String>>,
    phase: AtomicU8,
}

impl SessionManager {
    pub fn new(client: Arc<dyn IdentityClient>, scopes: Vec<String>) -> Self {
        Self {
            client,
            scopes: RwLock::new(scopes),
            phase: AtomicU8::new(SessionPhase::Uninitialized as u8),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == SessionPhase::Ready
    }

    fn set_phase(&self, phase: SessionPhase) {
        debug!(%phase, "session phase");
        self.phase.store(phase as u8, Ordering::Release);
    }

    /// Runs the client's startup handshake and settles any pending interaction.
    ///
    /// A failed pending interaction is logged and does not block readiness.
    /// A failed handshake returns the manager to `Uninitialized`.
    pub async fn initialize(&self) -> Result<(), ParleyError> {
        if self.phase() != SessionPhase::Uninitialized {
            return Ok(());
        }
        self.set_phase(SessionPhase::Initializing);

        if let Err(e) = self.client.initialize().await {
            self.set_phase(SessionPhase::Uninitialized);
            return Err(e);
        }
        if let Err(e) = self.client.complete_pending_interaction().await {
            error!(error = %e, "pending sign-in failed");
        }

        self.set_phase(SessionPhase::Ready);
        info!(client = self.client.name(), "session ready");
        Ok(())
    }

    /// Scopes requested for the agent service token.
    pub fn scopes(&self) -> Vec<String> {
        self.scopes.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Replaces the requested scopes. Client id and tenant stay as built.
    pub fn set_scopes(&self, scopes: Vec<String>) {
        *self.scopes.write().unwrap_or_else(|p| p.into_inner()) = scopes;
    }

    /// A bearer token for the configured scopes, if one can be had silently.
    ///
    /// When silent acquisition fails and no interaction is running, starts an
    /// interactive flow for the first account; this call still returns `None`
    /// and the caller retries after the user completes it.
    pub async fn get_token(&self) -> Option<SecretString> {
        if !self.is_ready() {
            return None;
        }
        let account = self.client.accounts().await.into_iter().next()?;
        let scopes = self.scopes();

        match self.client.acquire_token_silent(&scopes, &account).await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, "silent token acquisition failed");
                if self.client.interaction_status() == InteractionStatus::None {
                    if let Err(e) = self.client.acquire_token_interactive(&scopes, &account).await {
                        error!(error = %e, "interactive token acquisition failed to start");
                    }
                }
                None
            }
        }
    }

    /// Starts interactive sign-in for the configured scopes.
    pub async fn login(&self) -> Result<(), ParleyError> {
        let scopes = self.scopes();
        self.client.login_interactive(&scopes).await.inspect_err(|e| {
            error!(error = %e, "login failed");
        })
    }

    /// Signs out. Failures are logged, not returned.
    pub async fn logout(&self) {
        if let Err(e) = self.client.logout().await {
            warn!(error = %e, "logout failed");
        }
    }

    /// Waits for the running interactive flow and reports its account.
    pub async fn wait_for_interaction(&self) -> Result<Option<Account>, ParleyError> {
        self.client.complete_pending_interaction().await
    }

    pub async fn active_account(&self) -> Option<Account> {
        if !self.is_ready() {
            return None;
        }
        self.client.accounts().await.into_iter().next()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.active_account().await.is_some()
    }

    pub fn interaction_in_progress(&self) -> bool {
        self.client.interaction_status() != InteractionStatus::None
    }

    pub async fn status(&self) -> AuthStatus {
        AuthStatus {
            ready: self.is_ready(),
            interaction_in_progress: self.interaction_in_progress(),
            account: self.active_account().await,
        }
    }

    /// Tears the identity client down.
    pub async fn shutdown(&self) -> Result<(), ParleyError> {
        self.client.shutdown().await
    }
}

#[async_trait]
impl CredentialProvider for SessionManager {
    async fn access_token(&self) -> Option<SecretString> {
        self.get_token().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_round_trips_through_u8() {
        for phase in [
            SessionPhase::Uninitialized,
            SessionPhase::Initializing,
            SessionPhase::Ready,
        ] {
            assert_eq!(SessionPhase::from_u8(phase as u8), phase);
        }
    }

    #[test]
    fn phase_display_is_lowercase() {
        assert_eq!(SessionPhase::Initializing.to_string(), "initializing");
    }
}
