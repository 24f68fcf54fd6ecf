// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley chat client.

use std::time::Duration;

use thiserror::Error;

use crate::types::RunStatus;

/// The primary error type used across all Parley adapter traits and core operations.
///
/// The `Display` output of every variant is what the chat view shows in its
/// error banner, so messages are written for the end user.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Key-value store errors (unreadable data directory, failed atomic replace).
    #[error("storage error: {message}")]
    Storage {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Credential acquisition or interactive sign-in failures.
    #[error("authentication failed: {message}")]
    Auth {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The chat settings carry no agent identifier.
    #[error("assistant not configured: set an agent ID in settings")]
    AgentNotConfigured,

    /// Agent service errors (HTTP failure, non-2xx status, malformed body).
    #[error("service error: {message}")]
    Service {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A run reached a terminal status other than `completed`.
    #[error("run failed with status: {status}{}", format_detail(.detail.as_deref()))]
    RunFailed {
        status: RunStatus,
        detail: Option<String>,
    },

    /// A run was still pending when the poll deadline expired.
    #[error("run {run_id} did not finish within {waited:?}")]
    RunTimedOut { run_id: String, waited: Duration },

    /// The turn was cancelled by the user while waiting on the service.
    #[error("turn cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Shorthand for an [`ParleyError::Auth`] without an underlying source.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`ParleyError::Service`] without status or source.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Shorthand for a [`ParleyError::Storage`] wrapping an underlying error.
    pub fn storage(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

fn format_detail(detail: Option<&str>) -> String {
    match detail {
        Some(d) if !d.is_empty() => format!(" ({d})"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_failed_mentions_literal_status() {
        let err = ParleyError::RunFailed {
            status: RunStatus::Failed,
            detail: None,
        };
        assert_eq!(err.to_string(), "run failed with status: failed");
    }

    #[test]
    fn run_failed_appends_service_detail() {
        let err = ParleyError::RunFailed {
            status: RunStatus::Expired,
            detail: Some("rate_limit_exceeded: slow down".into()),
        };
        assert_eq!(
            err.to_string(),
            "run failed with status: expired (rate_limit_exceeded: slow down)"
        );
    }

    #[test]
    fn auth_shorthand_has_user_facing_prefix() {
        let err = ParleyError::auth("no access token available");
        assert!(err.to_string().starts_with("authentication failed"));
    }
}
