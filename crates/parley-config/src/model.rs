// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime configuration model structs for the Parley chat client.
//!
//! These are operator knobs (logging, data location, protocol tuning). The
//! user's chat settings (endpoint, client id, tenant, scopes, agent) are not
//! part of this model; they live in the settings store and are only edited
//! from inside the shell.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Parley runtime configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Where settings and the token cache are kept.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Identity provider settings.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Agent service protocol settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Run polling policy.
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Storage location configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding `azure-chat-config.json` and the token cache.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("parley"))
        .unwrap_or_else(|| PathBuf::from(".parley"))
        .to_string_lossy()
        .into_owned()
}

/// Identity provider configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Host the tenant authority is derived from.
    #[serde(default = "default_authority_host")]
    pub authority_host: String,

    /// Timeout for each token endpoint request.
    #[serde(default = "default_identity_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            authority_host: default_authority_host(),
            request_timeout_secs: default_identity_timeout_secs(),
        }
    }
}

fn default_authority_host() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_identity_timeout_secs() -> u64 {
    30
}

/// Agent service protocol configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Value sent as the `api-version` query parameter on every call.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Timeout for each agent service request.
    #[serde(default = "default_service_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Send `Ocp-Apim-Trace: true` with every request.
    #[serde(default = "default_trace_requests")]
    pub trace_requests: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            request_timeout_secs: default_service_timeout_secs(),
            trace_requests: default_trace_requests(),
        }
    }
}

fn default_api_version() -> String {
    "2025-05-01".to_string()
}

fn default_service_timeout_secs() -> u64 {
    60
}

fn default_trace_requests() -> bool {
    true
}

/// Run polling policy: first interval, backoff growth, cap and deadline.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollingConfig {
    /// Delay before the second status fetch.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Upper bound on the delay between fetches.
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    /// Factor applied to the delay after every fetch.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Total time a turn may wait on a pending run.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            deadline_secs: default_deadline_secs(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_max_interval_ms() -> u64 {
    5000
}

fn default_backoff_multiplier() -> f64 {
    1.5
}

fn default_deadline_secs() -> u64 {
    300
}
