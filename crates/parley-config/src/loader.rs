// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./parley.toml` > `~/.config/parley/parley.toml` > `/etc/parley/parley.toml`
//! with environment variable overrides via `PARLEY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ParleyConfig;

/// System-wide config file location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/parley/parley.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "parley.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/parley/parley.toml` (system-wide)
/// 3. `~/.config/parley/parley.toml` (user XDG config)
/// 4. `./parley.toml` (local directory)
/// 5. `PARLEY_*` environment variables
pub fn load_config() -> Result<ParleyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("parley").join(LOCAL_CONFIG_FILE))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `PARLEY_POLLING_DEADLINE_SECS` must map to
/// `polling.deadline_secs`, not `polling.deadline.secs`.
fn env_provider() -> Env {
    Env::prefixed("PARLEY_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 5] = ["log", "storage", "identity", "service", "polling"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("polling_deadline_secs"), "polling.deadline_secs");
        assert_eq!(map_env_key("service_api_version"), "service.api_version");
        assert_eq!(map_env_key("log_level"), "log.level");
        assert_eq!(map_env_key("storage_data_dir"), "storage.data_dir");
    }

    #[test]
    fn unknown_section_is_left_alone() {
        assert_eq!(map_env_key("agent_name"), "agent_name");
    }
}
