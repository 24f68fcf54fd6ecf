// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime configuration for the Parley chat client.
//!
//! Parses `parley.toml` with strict key checking, merges the XDG file
//! hierarchy with `PARLEY_*` environment overrides, and renders problems as
//! miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use parley_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("api version: {}", config.service.api_version);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    IdentityConfig, LogConfig, ParleyConfig, PollingConfig, ServiceConfig, StorageConfig,
};

/// Loads the XDG hierarchy plus environment overrides and validates the result.
pub fn load_and_validate() -> Result<ParleyConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Loads a single file (plus environment overrides) and validates it.
///
/// Backs the `--config` command-line flag.
pub fn load_and_validate_path(path: &Path) -> Result<ParleyConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Parses and validates an inline TOML document.
pub fn load_and_validate_str(toml_content: &str) -> Result<ParleyConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Reads whichever config files exist so diagnostics can point into them.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![
        std::env::current_dir()
            .map(|d| d.join(loader::LOCAL_CONFIG_FILE))
            .unwrap_or_else(|_| loader::LOCAL_CONFIG_FILE.into()),
    ];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("parley").join(loader::LOCAL_CONFIG_FILE));
    }
    candidates.push(loader::SYSTEM_CONFIG_PATH.into());

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
