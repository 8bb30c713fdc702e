// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>
// Patent Pending — DE Gebrauchsmuster, filed 2026-02-23

use serde::{Deserialize, Serialize};

/// Content type of every successful clone response.
pub const CLONED_AUDIO_CONTENT_TYPE: &str = "audio/wav";

pub const MISSING_AUDIO_MESSAGE: &str = "Please upload an audio file.";
pub const CLONE_FAILED_MESSAGE: &str = "Failed to clone voice. Please try again later.";
pub const UPLOAD_TOO_LARGE_MESSAGE: &str = "The audio file is too large.";

// ── Errors ───────────────────────────────────────────────────────

/// JSON body of every non-success response: `{"error": "..."}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

// ── Health ───────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    pub upstream: String,
}
