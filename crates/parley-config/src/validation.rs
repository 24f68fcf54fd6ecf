// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.
//!
//! Every rule runs; the caller gets the full list of violations at once.

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const MIN_BACKOFF_MULTIPLIER: f64 = 1.0;
const MAX_BACKOFF_MULTIPLIER: f64 = 10.0;

/// Validates a deserialized configuration, collecting every violation.
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.log.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "log.level `{}` is not one of {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.data_dir.trim().is_empty() {
        errors.push(ConfigError::validation("storage.data_dir must not be empty"));
    }

    let host = config.identity.authority_host.trim();
    if !(host.starts_with("https://") || host.starts_with("http://")) {
        errors.push(ConfigError::validation(format!(
            "identity.authority_host `{host}` must be an http(s) URL"
        )));
    }
    if config.identity.request_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "identity.request_timeout_secs must be greater than 0",
        ));
    }

    if config.service.api_version.trim().is_empty() {
        errors.push(ConfigError::validation("service.api_version must not be empty"));
    }
    if config.service.request_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "service.request_timeout_secs must be greater than 0",
        ));
    }

    let polling = &config.polling;
    if polling.interval_ms == 0 {
        errors.push(ConfigError::validation("polling.interval_ms must be greater than 0"));
    }
    if !(MIN_BACKOFF_MULTIPLIER..=MAX_BACKOFF_MULTIPLIER).contains(&polling.backoff_multiplier) {
        errors.push(ConfigError::validation(format!(
            "polling.backoff_multiplier must be between {MIN_BACKOFF_MULTIPLIER} and {MAX_BACKOFF_MULTIPLIER}, got {}",
            polling.backoff_multiplier
        )));
    }
    if polling.max_interval_ms < polling.interval_ms {
        errors.push(ConfigError::validation(format!(
            "polling.max_interval_ms ({}) must not be below polling.interval_ms ({})",
            polling.max_interval_ms, polling.interval_ms
        )));
    }
    if polling.deadline_secs.saturating_mul(1000) < polling.interval_ms {
        errors.push(ConfigError::validation(
            "polling.deadline_secs must allow at least one poll interval",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
