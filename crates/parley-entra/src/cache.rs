// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent token cache: accounts, refresh tokens and access tokens.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use parley_core::types::Account;
use parley_core::{KeyValueStore, ParleyError};

use crate::types::RESERVED_SCOPES;

/// Key the cache document is stored under.
pub const TOKEN_CACHE_KEY: &str = "entra-token-cache";

/// Access tokens closer than this many seconds to expiry are not handed out.
pub const EXPIRY_MARGIN_SECS: i64 = 5 * 60;

/// The whole cache document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TokenCache {
    #[serde(default)]
    entries: Vec<CacheEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    account: Account,
    #[serde(
        default,
        serialize_with = "serialize_opt_secret",
        deserialize_with = "deserialize_opt_secret"
    )]
    refresh_token: Option<SecretString>,
    #[serde(default)]
    access_tokens: Vec<AccessTokenEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessTokenEntry {
    /// Normalized scope set the token was issued for.
    scopes: Vec<String>,
    #[serde(serialize_with = "serialize_secret", deserialize_with = "deserialize_secret")]
    secret: SecretString,
    expires_at: DateTime<Utc>,
}

impl TokenCache {
    /// Reads the cache from `store`. Unreadable or corrupt data yields an empty cache.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(TOKEN_CACHE_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "token cache is corrupt; starting empty");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(error = %e, "failed to read token cache; starting empty");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), ParleyError> {
        let json = serde_json::to_string(self)
            .map_err(|e| ParleyError::storage("failed to serialize token cache", e))?;
        store.set(TOKEN_CACHE_KEY, &json)
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.entries.iter().map(|e| e.account.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A cached access token for `scopes` valid beyond the expiry margin at `now`.
    pub fn access_token(
        &self,
        account: &Account,
        scopes: &[String],
        now: DateTime<Utc>,
    ) -> Option<SecretString> {
        let key = normalize_scopes(scopes);
        self.entry(account)?
            .access_tokens
            .iter()
            .find(|t| t.scopes == key && (t.expires_at - now).num_seconds() > EXPIRY_MARGIN_SECS)
            .map(|t| t.secret.clone())
    }

    pub fn refresh_token(&self, account: &Account) -> Option<SecretString> {
        self.entry(account)?.refresh_token.clone()
    }

    /// Records a token grant for `account`, adding the account if new.
    ///
    /// A grant without a refresh token keeps the previous one.
    pub fn store_grant(
        &mut self,
        account: Account,
        scopes: &[String],
        access_token: SecretString,
        expires_at: DateTime<Utc>,
        refresh_token: Option<SecretString>,
    ) {
        let pos = match self
            .entries
            .iter()
            .position(|e| e.account.home_account_id == account.home_account_id)
        {
            Some(pos) => pos,
            None => {
                self.entries.push(CacheEntry {
                    account: account.clone(),
                    refresh_token: None,
                    access_tokens: Vec::new(),
                });
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[pos];
        entry.account = account;
        if refresh_token.is_some() {
            entry.refresh_token = refresh_token;
        }

        let key = normalize_scopes(scopes);
        entry.access_tokens.retain(|t| t.scopes != key);
        entry.access_tokens.push(AccessTokenEntry {
            scopes: key,
            secret: access_token,
            expires_at,
        });
    }

    /// Drops every account and token.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn entry(&self, account: &Account) -> Option<&CacheEntry> {
        self.entries
            .iter()
            .find(|e| e.account.home_account_id == account.home_account_id)
    }
}

/// Lowercased, sorted, de-duplicated scopes without the OpenID reserved ones.
pub fn normalize_scopes(scopes: &[String]) -> Vec<String> {
    let mut out: Vec<String> = scopes
        .iter()
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty() && !RESERVED_SCOPES.contains(&s.as_str()))
        .collect();
    out.sort();
    out.dedup();
    out
}

fn serialize_secret<S: Serializer>(secret: &SecretString, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(secret.expose_secret())
}

fn deserialize_secret<'de, D: Deserializer<'de>>(d: D) -> Result<SecretString, D::Error> {
    String::deserialize(d).map(SecretString::from)
}

fn serialize_opt_secret<S: Serializer>(
    secret: &Option<SecretString>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(secret) => s.serialize_some(secret.expose_secret()),
        None => s.serialize_none(),
    }
}

fn deserialize_opt_secret<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<SecretString>, D::Error> {
    Option::<String>::deserialize(d).map(|v| v.map(SecretString::from))
}
