// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>
// Patent Pending — DE Gebrauchsmuster, filed 2026-02-23

pub mod schema;

pub use schema::{
    Config, ConfigError, GatewayConfig, LoggingConfig, UpstreamConfig, DEFAULT_LANGUAGE,
    DEFAULT_UPSTREAM_URL,
};

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Default config location, e.g. `~/.config/clonevox/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "clonevox", "clonevox")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Resolve the effective configuration.
///
/// An explicit path must exist. The default location is optional and
/// silently skipped when absent. Environment overrides are applied last.
pub fn load(explicit: Option<&str>) -> Result<Config> {
    let mut config = match explicit {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw);
            let path = PathBuf::from(expanded.as_ref());
            Config::from_file(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => Config::from_file(&path)?,
            None => Config::default(),
        },
    };

    config
        .apply_env_overrides(|name| std::env::var(name).ok())
        .context("Invalid environment override")?;

    Ok(config)
}
