// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source of bearer credentials for outbound agent service calls.

use async_trait::async_trait;
use secrecy::SecretString;

/// Produces an access token for the agent service on demand.
///
/// `None` means no token is available right now; the caller reports an
/// authentication failure and the user retries once sign-in completes.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Option<SecretString>;
}
