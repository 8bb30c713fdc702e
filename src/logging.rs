// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>
// Patent Pending — DE Gebrauchsmuster, filed 2026-02-23

//! Event log with three severity channels.
//!
//! Components receive an `Arc<dyn EventLog>` instead of reaching for a
//! process-wide logger, so tests can swap in [`MemoryLog`] and assert on
//! exactly what was reported.

use std::sync::Mutex;
use tracing::Level;

pub trait EventLog: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
    fn warning(&self, message: &str);
}

/// Forwards every entry to the `tracing` subscriber installed at startup.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl EventLog for TracingLog {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Captures entries in memory. Used by tests.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<(Level, String)>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Messages recorded on the error channel, oldest first.
    pub fn errors(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(level, _)| *level == Level::ERROR)
            .map(|(_, message)| message)
            .collect()
    }

    fn push(&self, level: Level, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((level, message.to_owned()));
    }
}

impl EventLog for MemoryLog {
    fn info(&self, message: &str) {
        self.push(Level::INFO, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::ERROR, message);
    }

    fn warning(&self, message: &str) {
        self.push(Level::WARN, message);
    }
}

/// Parse a level name, falling back to `INFO` for anything unrecognised.
pub fn parse_level(raw: &str) -> Level {
    raw.trim().parse().unwrap_or(Level::INFO)
}

/// Install the global console subscriber. Later calls are no-ops.
pub fn init_tracing(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(parse_level(level))
        .with_target(false)
        .try_init();
}
