// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entra ID public client over the OAuth 2.0 v2 endpoints.
//!
//! Interactive sign-in uses the device authorization grant: the user code is
//! handed to a [`PromptSink`] and a background task polls the token endpoint
//! until the user finishes in a browser. Silent acquisition serves cached
//! access tokens and falls back to the refresh token grant.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use parley_core::types::{Account, AdapterType, IdentityPrompt, InteractionStatus};
use parley_core::{IdentityClient, KeyValueStore, ParleyError, PromptSink, ServiceAdapter};

use crate::cache::TokenCache;
use crate::types::{
    DeviceCodeResponse, TokenErrorResponse, TokenResponse, account_from_id_token,
    login_scope_param, token_expiry,
};

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Extra wait the server asks for with `slow_down`.
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

/// Longest a device code is waited on, whatever the server reports.
const MAX_DEVICE_CODE_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Construction parameters for [`EntraIdentityClient`].
#[derive(Debug, Clone)]
pub struct EntraConfig {
    pub client_id: String,
    pub tenant_id: String,
    /// e.g. `https://login.microsoftonline.com`
    pub authority_host: String,
    pub request_timeout: Duration,
}

type PendingFlow = JoinHandle<Result<Account, ParleyError>>;

/// State shared with the background device-code poller.
struct Inner {
    http: reqwest::Client,
    authority: String,
    client_id: String,
    store: Arc<dyn KeyValueStore>,
    cache: Mutex<TokenCache>,
    status: Mutex<InteractionStatus>,
    prompts: Arc<dyn PromptSink>,
}

/// Entra ID client with a persistent token cache.
pub struct EntraIdentityClient {
    inner: Arc<Inner>,
    pending: tokio::sync::Mutex<Option<PendingFlow>>,
}

impl EntraIdentityClient {
    pub fn new(
        config: EntraConfig,
        store: Arc<dyn KeyValueStore>,
        prompts: Arc<dyn PromptSink>,
    ) -> Result<Self, ParleyError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ParleyError::Auth {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let authority = format!(
            "{}/{}",
            config.authority_host.trim_end_matches('/'),
            config.tenant_id
        );
        debug!(%authority, client_id = %config.client_id, "entra client created");

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                authority,
                client_id: config.client_id,
                store,
                cache: Mutex::new(TokenCache::default()),
                status: Mutex::new(InteractionStatus::None),
                prompts,
            }),
            pending: tokio::sync::Mutex::new(None),
        })
    }

    pub fn authority(&self) -> &str {
        &self.inner.authority
    }

    /// Requests a device code and spawns the poller that redeems it.
    async fn start_device_flow(
        &self,
        scopes: &[String],
        kind: InteractionStatus,
    ) -> Result<(), ParleyError> {
        self.inner.begin_interaction(kind)?;

        let device = match self.inner.request_device_code(scopes).await {
            Ok(device) => device,
            Err(e) => {
                self.inner.end_interaction();
                return Err(e);
            }
        };
        info!(kind = %kind, "device code sign-in started");
        self.inner.prompts.show(&IdentityPrompt::DeviceCode {
            verification_uri: device.verification_uri.clone(),
            user_code: device.user_code.clone(),
            message: device.message.clone(),
            expires_in: device_code_lifetime(&device),
        });

        let inner = Arc::clone(&self.inner);
        let scopes = scopes.to_vec();
        let handle = tokio::spawn(async move {
            let result = inner.redeem_device_code(&device, &scopes).await;
            inner.end_interaction();
            result
        });
        *self.pending.lock().await = Some(handle);
        Ok(())
    }

    async fn abort_pending(&self) {
        if let Some(handle) = self.pending.lock().await.take() {
            handle.abort();
        }
    }
}

impl Inner {
    fn token_url(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority)
    }

    fn cache(&self) -> MutexGuard<'_, TokenCache> {
        self.cache.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn status(&self) -> MutexGuard<'_, InteractionStatus> {
        self.status.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn begin_interaction(&self, kind: InteractionStatus) -> Result<(), ParleyError> {
        let mut status = self.status();
        if *status != InteractionStatus::None {
            return Err(ParleyError::auth(format!(
                "another sign-in interaction is in progress ({})",
                *status
            )));
        }
        *status = kind;
        Ok(())
    }

    fn end_interaction(&self) {
        *self.status() = InteractionStatus::None;
    }

    fn persist_cache(&self) {
        if let Err(e) = self.cache().save(self.store.as_ref()) {
            warn!(error = %e, "failed to persist token cache");
        }
    }

    async fn request_device_code(&self, scopes: &[String]) -> Result<DeviceCodeResponse, ParleyError> {
        let scope = login_scope_param(scopes);
        let response = self
            .http
            .post(format!("{}/oauth2/v2.0/devicecode", self.authority))
            .form(&[("client_id", self.client_id.as_str()), ("scope", scope.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let err = read_error(response).await;
            return Err(ParleyError::auth(format!("sign-in could not start: {}", err.summary())));
        }
        response.json().await.map_err(|e| ParleyError::Auth {
            message: "malformed device code response".into(),
            source: Some(Box::new(e)),
        })
    }

    /// Polls the token endpoint until the user completes or abandons sign-in.
    async fn redeem_device_code(
        &self,
        device: &DeviceCodeResponse,
        scopes: &[String],
    ) -> Result<Account, ParleyError> {
        let deadline = Instant::now() + device_code_lifetime(device);
        let mut interval = Duration::from_secs(device.interval);

        loop {
            tokio::time::sleep(interval).await;
            if Instant::now() >= deadline {
                return Err(ParleyError::auth("device code expired before sign-in completed"));
            }

            let response = self
                .http
                .post(self.token_url())
                .form(&[
                    ("grant_type", DEVICE_CODE_GRANT),
                    ("client_id", self.client_id.as_str()),
                    ("device_code", device.device_code.as_str()),
                ])
                .send()
                .await
                .map_err(transport_error)?;

            if response.status().is_success() {
                let grant: TokenResponse = response.json().await.map_err(|e| ParleyError::Auth {
                    message: "malformed token response".into(),
                    source: Some(Box::new(e)),
                })?;
                return self.finish_sign_in(grant, scopes);
            }

            let err = read_error(response).await;
            match err.error.as_str() {
                "authorization_pending" => debug!("waiting for the user to enter the code"),
                "slow_down" => {
                    interval += SLOW_DOWN_STEP;
                    debug!(?interval, "token endpoint asked to slow down");
                }
                "authorization_declined" => {
                    return Err(ParleyError::auth("sign-in was declined"));
                }
                "expired_token" => {
                    return Err(ParleyError::auth("device code expired before sign-in completed"));
                }
                _ => return Err(ParleyError::auth(err.summary())),
            }
        }
    }

    fn finish_sign_in(&self, grant: TokenResponse, scopes: &[String]) -> Result<Account, ParleyError> {
        let id_token = grant
            .id_token
            .as_deref()
            .ok_or_else(|| ParleyError::auth("sign-in response carried no id token"))?;
        let account = account_from_id_token(id_token)?;

        self.cache().store_grant(
            account.clone(),
            scopes,
            SecretString::from(grant.access_token),
            token_expiry(Utc::now(), grant.expires_in),
            grant.refresh_token.map(SecretString::from),
        );
        self.persist_cache();
        info!(username = %account.username, "signed in");
        Ok(account)
    }
}

fn device_code_lifetime(device: &DeviceCodeResponse) -> Duration {
    Duration::from_secs(device.expires_in).min(MAX_DEVICE_CODE_LIFETIME)
}

fn transport_error(e: reqwest::Error) -> ParleyError {
    ParleyError::Auth {
        message: format!("token request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

async fn read_error(response: reqwest::Response) -> TokenErrorResponse {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<TokenErrorResponse>(&body) {
        Ok(err) => err,
        Err(_) => TokenErrorResponse {
            error: format!("http_{}", status.as_u16()),
            error_description: (!body.is_empty()).then_some(body),
        },
    }
}

#[async_trait]
impl ServiceAdapter for EntraIdentityClient {
    fn name(&self) -> &str {
        "entra"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        self.abort_pending().await;
        self.inner.end_interaction();
        debug!("entra client shut down");
        Ok(())
    }
}

#[async_trait]
impl IdentityClient for EntraIdentityClient {
    async fn initialize(&self) -> Result<(), ParleyError> {
        *self.inner.status() = InteractionStatus::Startup;
        let cache = TokenCache::load(self.inner.store.as_ref());
        let accounts = cache.accounts().len();
        *self.inner.cache() = cache;
        self.inner.end_interaction();
        info!(accounts, "token cache loaded");
        Ok(())
    }

    async fn complete_pending_interaction(&self) -> Result<Option<Account>, ParleyError> {
        let Some(handle) = self.pending.lock().await.take() else {
            return Ok(None);
        };
        match handle.await {
            Ok(result) => result.map(Some),
            Err(e) if e.is_cancelled() => Ok(None),
            Err(e) => Err(ParleyError::Internal(format!("sign-in task failed: {e}"))),
        }
    }

    async fn accounts(&self) -> Vec<Account> {
        self.inner.cache().accounts()
    }

    async fn acquire_token_silent(
        &self,
        scopes: &[String],
        account: &Account,
    ) -> Result<SecretString, ParleyError> {
        let refresh_token = {
            let cache = self.inner.cache();
            if let Some(token) = cache.access_token(account, scopes, Utc::now()) {
                debug!("serving cached access token");
                return Ok(token);
            }
            cache.refresh_token(account)
        };
        let refresh_token = refresh_token
            .ok_or_else(|| ParleyError::auth("interaction required: no refresh token cached"))?;

        let scope = login_scope_param(scopes);
        let response = self
            .inner
            .http
            .post(self.inner.token_url())
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.inner.client_id.as_str()),
                ("refresh_token", refresh_token.expose_secret()),
                ("scope", scope.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let err = read_error(response).await;
            return Err(ParleyError::auth(format!(
                "interaction required: {}",
                err.summary()
            )));
        }
        let grant: TokenResponse = response.json().await.map_err(|e| ParleyError::Auth {
            message: "malformed token response".into(),
            source: Some(Box::new(e)),
        })?;

        let refreshed_account = match grant.id_token.as_deref() {
            Some(id_token) => account_from_id_token(id_token)?,
            None => account.clone(),
        };
        let access_token = SecretString::from(grant.access_token);
        self.inner.cache().store_grant(
            refreshed_account,
            scopes,
            access_token.clone(),
            token_expiry(Utc::now(), grant.expires_in),
            grant.refresh_token.map(SecretString::from),
        );
        self.inner.persist_cache();
        debug!("access token refreshed");
        Ok(access_token)
    }

    async fn acquire_token_interactive(
        &self,
        scopes: &[String],
        account: &Account,
    ) -> Result<(), ParleyError> {
        debug!(username = %account.username, "interactive token acquisition");
        self.start_device_flow(scopes, InteractionStatus::AcquireToken)
            .await
    }

    async fn login_interactive(&self, scopes: &[String]) -> Result<(), ParleyError> {
        self.start_device_flow(scopes, InteractionStatus::Login).await
    }

    async fn logout(&self) -> Result<(), ParleyError> {
        self.abort_pending().await;
        *self.inner.status() = InteractionStatus::Logout;

        self.inner.cache().clear();
        self.inner.persist_cache();
        self.inner.prompts.show(&IdentityPrompt::SignedOut {
            end_session_url: format!("{}/oauth2/v2.0/logout", self.inner.authority),
        });

        self.inner.end_interaction();
        info!("signed out");
        Ok(())
    }

    fn interaction_status(&self) -> InteractionStatus {
        *self.inner.status()
    }
}
