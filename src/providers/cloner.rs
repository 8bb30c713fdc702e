// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>
// Patent Pending — DE Gebrauchsmuster, filed 2026-02-23

use crate::config::UpstreamConfig;
use anyhow::Result;
use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{header::CONTENT_TYPE, multipart, Client, StatusCode, Url};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// File name used when the uploaded part carries none.
const FALLBACK_FILE_NAME: &str = "blob";

/// An audio sample as received from the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// One clone job. The language is supplied by the cloner, never the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CloneRequest {
    pub text: Option<String>,
    pub audio: AudioUpload,
}

/// Synthesized audio returned by the upstream service, byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub struct ClonedAudio {
    pub bytes: Bytes,
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API request failed with status {0}")]
    Status(StatusCode),
    #[error("unexpected response from server (content type: {})", .0.as_deref().unwrap_or("none"))]
    UnexpectedContentType(Option<String>),
    #[error("invalid audio upload: {0}")]
    Upload(String),
}

/// True when a `Content-Type` value names an audio payload.
pub fn is_audio_content_type(value: &str) -> bool {
    value.contains("audio")
}

/// Interface for voice-cloning backends.
#[async_trait]
pub trait VoiceCloner: Send + Sync {
    /// Synthesize `request.text` in the voice of `request.audio`.
    async fn clone_voice(&self, request: CloneRequest) -> Result<ClonedAudio, UpstreamError>;

    /// Return the backend name (e.g., "HTTP upstream").
    fn name(&self) -> &str;
}

// ══════════════════════════════════════════════════════════════════════════════
// HTTP Upstream Implementation
// ══════════════════════════════════════════════════════════════════════════════

pub struct HttpVoiceCloner {
    client: Client,
    url: Url,
    language: String,
}

impl HttpVoiceCloner {
    pub fn new(
        url: Url,
        language: String,
        timeout: Option<Duration>,
    ) -> Result<Self, UpstreamError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            url,
            language,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn form(&self, request: CloneRequest) -> Result<multipart::Form, UpstreamError> {
        let CloneRequest { text, audio } = request;

        let mut part = multipart::Part::bytes(audio.bytes.to_vec())
            .file_name(audio.file_name.unwrap_or_else(|| FALLBACK_FILE_NAME.to_string()));
        if let Some(mime) = audio.content_type.as_deref() {
            part = part
                .mime_str(mime)
                .map_err(|e| UpstreamError::Upload(format!("bad MIME type {mime:?}: {e}")))?;
        }

        Ok(multipart::Form::new()
            .text("text", text.unwrap_or_default())
            .text("language", self.language.clone())
            .part("audio_file", part))
    }
}

#[async_trait]
impl VoiceCloner for HttpVoiceCloner {
    async fn clone_voice(&self, request: CloneRequest) -> Result<ClonedAudio, UpstreamError> {
        let form = self.form(request)?;

        let response = self
            .client
            .post(self.url.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        match content_type {
            Some(ct) if is_audio_content_type(&ct) => Ok(ClonedAudio {
                bytes: response.bytes().await?,
            }),
            other => Err(UpstreamError::UnexpectedContentType(other)),
        }
    }

    fn name(&self) -> &str {
        "HTTP upstream"
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Factory
// ══════════════════════════════════════════════════════════════════════════════

pub fn create_voice_cloner(config: &UpstreamConfig) -> Result<Box<dyn VoiceCloner>> {
    let url = Url::parse(config.url.trim())
        .map_err(|e| anyhow::anyhow!("Invalid upstream URL {:?}: {e}", config.url))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("Unsupported upstream URL scheme: {}", url.scheme());
    }
    if config.language.trim().is_empty() {
        anyhow::bail!("Upstream language must not be empty");
    }

    let timeout = config.timeout_secs.map(Duration::from_secs);
    let cloner = HttpVoiceCloner::new(url, config.language.trim().to_string(), timeout)?;
    Ok(Box::new(cloner))
}

// ══════════════════════════════════════════════════════════════════════════════
// Mock Cloner (for testing)
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
enum MockOutcome {
    Audio(ClonedAudio),
    Status(StatusCode),
    NonAudio(String),
}

/// A mock cloner that replays a fixed outcome and records every request.
/// Used for unit and integration tests so we never call a real API.
#[derive(Debug)]
pub struct MockVoiceCloner {
    outcome: MockOutcome,
    requests: Mutex<Vec<CloneRequest>>,
}

impl MockVoiceCloner {
    fn with_outcome(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Succeed with `bytes`.
    pub fn audio(bytes: impl Into<Bytes>) -> Self {
        Self::with_outcome(MockOutcome::Audio(ClonedAudio {
            bytes: bytes.into(),
        }))
    }

    /// Fail as if the upstream answered with `status`.
    pub fn failing_status(status: StatusCode) -> Self {
        Self::with_outcome(MockOutcome::Status(status))
    }

    /// Fail as if the upstream answered 200 with a non-audio body.
    pub fn non_audio(content_type: impl Into<String>) -> Self {
        Self::with_outcome(MockOutcome::NonAudio(content_type.into()))
    }

    pub fn requests(&self) -> Vec<CloneRequest> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl VoiceCloner for MockVoiceCloner {
    async fn clone_voice(&self, request: CloneRequest) -> Result<ClonedAudio, UpstreamError> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(request);

        match &self.outcome {
            MockOutcome::Audio(audio) => Ok(audio.clone()),
            MockOutcome::Status(status) => Err(UpstreamError::Status(*status)),
            MockOutcome::NonAudio(ct) => {
                Err(UpstreamError::UnexpectedContentType(Some(ct.clone())))
            }
        }
    }

    fn name(&self) -> &str {
        "Mock cloner"
    }
}
