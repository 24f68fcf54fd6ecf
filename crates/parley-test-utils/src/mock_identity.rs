// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable identity client and fixed credential sources.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use secrecy::SecretString;

use parley_core::types::{AdapterType, InteractionStatus};
use parley_core::{Account, CredentialProvider, IdentityClient, ParleyError, ServiceAdapter};

/// The account mock sign-ins produce unless told otherwise.
pub fn test_account() -> Account {
    Account {
        home_account_id: "oid-test.tenant-test".into(),
        username: "tester@contoso.com".into(),
        tenant_id: "tenant-test".into(),
    }
}

/// An [`IdentityClient`] whose behaviour is set up front and whose calls are counted.
///
/// Interactive flows complete when
/// [`complete_pending_interaction`](IdentityClient::complete_pending_interaction)
/// is awaited: the scripted outcome is applied and the status returns to `None`.
pub struct MockIdentityClient {
    accounts: Mutex<Vec<Account>>,
    silent_token: Mutex<Option<String>>,
    status: Mutex<InteractionStatus>,
    pending: Mutex<Option<Result<Account, String>>>,
    next_sign_in: Mutex<Result<Account, String>>,
    initialize_error: Option<String>,
    login_calls: AtomicUsize,
    interactive_calls: AtomicUsize,
    silent_calls: AtomicUsize,
    logout_calls: AtomicUsize,
}

impl Default for MockIdentityClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIdentityClient {
    /// No accounts, silent acquisition fails, sign-in yields [`test_account`].
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
            silent_token: Mutex::new(None),
            status: Mutex::new(InteractionStatus::None),
            pending: Mutex::new(None),
            next_sign_in: Mutex::new(Ok(test_account())),
            initialize_error: None,
            login_calls: AtomicUsize::new(0),
            interactive_calls: AtomicUsize::new(0),
            silent_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }

    /// Signed in as [`test_account`] with a working silent token.
    pub fn signed_in(token: &str) -> Self {
        Self::new().with_account(test_account()).with_token(token)
    }

    pub fn with_account(self, account: Account) -> Self {
        self.accounts.lock().unwrap().push(account);
        self
    }

    /// Silent acquisition returns `token`.
    pub fn with_token(self, token: &str) -> Self {
        *self.silent_token.lock().unwrap() = Some(token.to_string());
        self
    }

    /// An interaction is already running when the test starts.
    pub fn with_status(self, status: InteractionStatus) -> Self {
        *self.status.lock().unwrap() = status;
        self
    }

    /// The next interactive flow fails with `message`.
    pub fn failing_sign_in(self, message: &str) -> Self {
        *self.next_sign_in.lock().unwrap() = Err(message.to_string());
        self
    }

    /// A flow is pending from before startup and resolves with `outcome`.
    pub fn with_pending(self, outcome: Result<Account, String>) -> Self {
        *self.pending.lock().unwrap() = Some(outcome);
        self
    }

    pub fn failing_initialize(mut self, message: &str) -> Self {
        self.initialize_error = Some(message.to_string());
        self
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn interactive_calls(&self) -> usize {
        self.interactive_calls.load(Ordering::SeqCst)
    }

    pub fn silent_calls(&self) -> usize {
        self.silent_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    fn start(&self, kind: InteractionStatus) -> Result<(), ParleyError> {
        let mut status = self.status.lock().unwrap();
        if *status != InteractionStatus::None {
            return Err(ParleyError::auth("interaction already in progress"));
        }
        *status = kind;
        *self.pending.lock().unwrap() = Some(self.next_sign_in.lock().unwrap().clone());
        Ok(())
    }
}

#[async_trait]
impl ServiceAdapter for MockIdentityClient {
    fn name(&self) -> &str {
        "mock-identity"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        *self.status.lock().unwrap() = InteractionStatus::None;
        Ok(())
    }
}

#[async_trait]
impl IdentityClient for MockIdentityClient {
    async fn initialize(&self) -> Result<(), ParleyError> {
        match &self.initialize_error {
            Some(message) => Err(ParleyError::auth(message.clone())),
            None => Ok(()),
        }
    }

    async fn complete_pending_interaction(&self) -> Result<Option<Account>, ParleyError> {
        let outcome = self.pending.lock().unwrap().take();
        *self.status.lock().unwrap() = InteractionStatus::None;
        match outcome {
            None => Ok(None),
            Some(Ok(account)) => {
                let mut accounts = self.accounts.lock().unwrap();
                if !accounts.contains(&account) {
                    accounts.push(account.clone());
                }
                Ok(Some(account))
            }
            Some(Err(message)) => Err(ParleyError::auth(message)),
        }
    }

    async fn accounts(&self) -> Vec<Account> {
        self.accounts.lock().unwrap().clone()
    }

    async fn acquire_token_silent(
        &self,
        _scopes: &[String],
        _account: &Account,
    ) -> Result<SecretString, ParleyError> {
        self.silent_calls.fetch_add(1, Ordering::SeqCst);
        match self.silent_token.lock().unwrap().as_deref() {
            Some(token) => Ok(SecretString::from(token)),
            None => Err(ParleyError::auth("interaction required")),
        }
    }

    async fn acquire_token_interactive(
        &self,
        _scopes: &[String],
        _account: &Account,
    ) -> Result<(), ParleyError> {
        self.interactive_calls.fetch_add(1, Ordering::SeqCst);
        self.start(InteractionStatus::AcquireToken)
    }

    async fn login_interactive(&self, _scopes: &[String]) -> Result<(), ParleyError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.start(InteractionStatus::Login)
    }

    async fn logout(&self) -> Result<(), ParleyError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.accounts.lock().unwrap().clear();
        Ok(())
    }

    fn interaction_status(&self) -> InteractionStatus {
        *self.status.lock().unwrap()
    }
}

/// A [`CredentialProvider`] that always answers the same way.
pub struct StaticCredential(Option<String>);

impl StaticCredential {
    pub fn token(token: &str) -> Self {
        Self(Some(token.to_string()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn access_token(&self) -> Option<SecretString> {
        self.0.as_deref().map(SecretString::from)
    }
}
