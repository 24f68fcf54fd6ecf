// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity provider client trait (Entra ID public client and mocks).

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::ParleyError;
use crate::traits::adapter::ServiceAdapter;
use crate::types::{Account, IdentityPrompt, InteractionStatus};

/// A public-client identity provider with a local token cache.
///
/// Interactive flows are started by `login_interactive` and
/// `acquire_token_interactive` and finish in the background; the caller
/// observes them through [`interaction_status`](IdentityClient::interaction_status)
/// and [`complete_pending_interaction`](IdentityClient::complete_pending_interaction).
#[async_trait]
pub trait IdentityClient: ServiceAdapter {
    /// Startup handshake: loads the persistent token cache.
    async fn initialize(&self) -> Result<(), ParleyError>;

    /// Waits for a pending interactive flow to finish.
    ///
    /// Returns the account that signed in, or `None` when nothing was pending.
    async fn complete_pending_interaction(&self) -> Result<Option<Account>, ParleyError>;

    /// Accounts present in the token cache, in sign-in order.
    async fn accounts(&self) -> Vec<Account>;

    /// Returns a cached or refreshed access token without user interaction.
    async fn acquire_token_silent(
        &self,
        scopes: &[String],
        account: &Account,
    ) -> Result<SecretString, ParleyError>;

    /// Starts an interactive flow to obtain a token for `account`.
    async fn acquire_token_interactive(
        &self,
        scopes: &[String],
        account: &Account,
    ) -> Result<(), ParleyError>;

    /// Starts an interactive sign-in for `scopes`.
    async fn login_interactive(&self, scopes: &[String]) -> Result<(), ParleyError>;

    /// Signs every cached account out.
    async fn logout(&self) -> Result<(), ParleyError>;

    /// The interactive flow currently running.
    fn interaction_status(&self) -> InteractionStatus;
}

/// Receives prompts the identity client needs to show the user.
pub trait PromptSink: Send + Sync {
    fn show(&self, prompt: &IdentityPrompt);
}
