// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the Entra ID v2 device code and token endpoints.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use parley_core::ParleyError;
use parley_core::types::Account;

/// Scopes added to every sign-in so the response carries an ID token and a
/// refresh token.
pub const RESERVED_SCOPES: [&str; 3] = ["openid", "profile", "offline_access"];

/// Response of `POST /oauth2/v2.0/devicecode`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    /// Seconds until `device_code` stops being redeemable.
    pub expires_in: u64,
    /// Seconds the client must wait between token polls.
    #[serde(default = "default_poll_interval")]
    pub interval: u64,
    #[serde(default)]
    pub message: String,
}

fn default_poll_interval() -> u64 {
    5
}

/// Successful response of `POST /oauth2/v2.0/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Error body returned by both endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenErrorResponse {
    /// The first line of the description, falling back to the error code.
    ///
    /// Entra appends trace and correlation ids on later lines.
    pub fn summary(&self) -> String {
        self.error_description
            .as_deref()
            .and_then(|d| d.lines().next())
            .filter(|d| !d.trim().is_empty())
            .map(|d| format!("{}: {}", self.error, d.trim()))
            .unwrap_or_else(|| self.error.clone())
    }
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    oid: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    tid: Option<String>,
}

/// Builds an [`Account`] from the claims of an ID token.
///
/// The signature is not verified: the token came straight from the
/// authority over TLS and is only used to label the cache entry.
pub fn account_from_id_token(id_token: &str) -> Result<Account, ParleyError> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| ParleyError::auth("malformed id token"))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ParleyError::Auth {
            message: "id token payload is not base64url".into(),
            source: Some(Box::new(e)),
        })?;
    let claims: IdTokenClaims = serde_json::from_slice(&bytes).map_err(|e| ParleyError::Auth {
        message: "id token payload is not JSON".into(),
        source: Some(Box::new(e)),
    })?;

    let object_id = claims
        .oid
        .or(claims.sub)
        .ok_or_else(|| ParleyError::auth("id token carries no subject"))?;
    let tenant_id = claims.tid.unwrap_or_default();
    Ok(Account {
        home_account_id: format!("{object_id}.{tenant_id}"),
        username: claims.preferred_username.unwrap_or_else(|| object_id.clone()),
        tenant_id,
    })
}

/// Space-separated scope string for a sign-in request.
pub fn login_scope_param(scopes: &[String]) -> String {
    let mut all: Vec<&str> = scopes.iter().map(String::as_str).collect();
    for reserved in RESERVED_SCOPES {
        if !all.iter().any(|s| s.eq_ignore_ascii_case(reserved)) {
            all.push(reserved);
        }
    }
    all.join(" ")
}

/// When a token issued at `issued_at` with `expires_in` seconds of life
/// expires. A lifetime that cannot be represented counts as already expired.
pub fn token_expiry(issued_at: DateTime<Utc>, expires_in: u64) -> DateTime<Utc> {
    i64::try_from(expires_in)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
        .unwrap_or(issued_at)
}

#[cfg(test)]
pub(crate) fn fake_id_token(oid: &str, username: &str, tid: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let claims = serde_json::json!({
        "oid": oid,
        "preferred_username": username,
        "tid": tid,
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_is_decoded_from_claims() {
        let token = fake_id_token("oid-1", "ada@contoso.com", "tenant-1");
        let account = account_from_id_token(&token).unwrap();
        assert_eq!(account.home_account_id, "oid-1.tenant-1");
        assert_eq!(account.username, "ada@contoso.com");
        assert_eq!(account.tenant_id, "tenant-1");
    }

    #[test]
    fn token_without_payload_is_rejected() {
        assert!(matches!(
            account_from_id_token("just-one-segment"),
            Err(ParleyError::Auth { .. })
        ));
    }

    #[test]
    fn reserved_scopes_are_appended_once() {
        let scopes = vec!["https://ai.azure.com/.default".to_string(), "openid".to_string()];
        assert_eq!(
            login_scope_param(&scopes),
            "https://ai.azure.com/.default openid profile offline_access"
        );
    }

    #[test]
    fn token_expiry_adds_lifetime() {
        let now = Utc::now();
        assert_eq!(token_expiry(now, 3600), now + TimeDelta::hours(1));
    }

    #[test]
    fn out_of_range_lifetime_is_already_expired() {
        let now = Utc::now();
        assert_eq!(token_expiry(now, u64::MAX), now);
        assert_eq!(token_expiry(now, i64::MAX as u64), now);
    }

    #[test]
    fn error_summary_drops_trace_lines() {
        let err = TokenErrorResponse {
            error: "invalid_grant".into(),
            error_description: Some(
                "AADSTS70008: The refresh token has expired.\r\nTrace ID: abc".into(),
            ),
        };
        assert_eq!(
            err.summary(),
            "invalid_grant: AADSTS70008: The refresh token has expired."
        );
    }
}
