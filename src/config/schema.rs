// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>
// Patent Pending — DE Gebrauchsmuster, filed 2026-02-23

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upstream voice-cloning endpoint used when nothing else is configured.
pub const DEFAULT_UPSTREAM_URL: &str = "https://tellergen.com/api/clone-voice";
/// Language code sent with every outbound clone request.
pub const DEFAULT_LANGUAGE: &str = "ar";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub upstream: UpstreamConfig,
    pub logging: LoggingConfig,
}

// ── Gateway ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Upload cap for `/api/clone-voice`. `None` accepts any size.
    pub max_upload_bytes: Option<usize>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            max_upload_bytes: None,
        }
    }
}

// ── Upstream ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    pub url: String,
    pub language: String,
    /// No timeout unless set; a hung upstream hangs the request.
    pub timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_UPSTREAM_URL.into(),
            language: DEFAULT_LANGUAGE.into(),
            timeout_secs: None,
        }
    }
}

// ── Logging ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Config {
    /// Parse a TOML config file. Missing sections fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `CLONEVOX_*` overrides from any variable source.
    /// Priority: environment variable > config file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        if let Some(host) = get("CLONEVOX_HOST") {
            self.gateway.host = host;
        }
        if let Some(port) = get("CLONEVOX_PORT") {
            self.gateway.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "CLONEVOX_PORT",
                value: port,
            })?;
        }
        if let Some(url) = get("CLONEVOX_UPSTREAM_URL") {
            self.upstream.url = url;
        }
        if let Some(language) = get("CLONEVOX_LANGUAGE") {
            self.upstream.language = language;
        }
        if let Some(level) = get("CLONEVOX_LOG") {
            self.logging.level = level;
        }
        Ok(())
    }
}
