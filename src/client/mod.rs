// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>
// Patent Pending — DE Gebrauchsmuster, filed 2026-02-23

//! Voice cloning form.
//!
//! [`CloneForm`] mirrors the browser page: it holds the text and the chosen
//! audio sample, submits them to `/api/clone-voice` through a
//! [`CloneVoiceApi`], and moves through `Idle → Loading → Success | Error`.
//!
//! A successful result owns a [`PlaybackResource`], a temporary audio file
//! that is deleted as soon as the result is replaced or the form is dropped.

use crate::logging::EventLog;
use crate::providers::AudioUpload;
use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{multipart, Client, Url};
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Text the form starts with.
pub const DEFAULT_SAMPLE_TEXT: &str = concat!(
    "مرحباً بكم في تطبيق استنساخ الصوت. ",
    "يمكنك استخدام هذا التطبيق لإنشاء نسخة من صوتك باللغة العربية.",
);
pub const NO_FILE_MESSAGE: &str = "Please upload an audio file first";
/// Shown when the server's error body is unreadable or has no `error` field.
pub const FALLBACK_FAILURE_MESSAGE: &str = "Failed to clone voice";

const CLONE_VOICE_PATH: &str = "/api/clone-voice";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Please upload an audio file first")]
    NoFile,
    #[error("A request is already in progress")]
    Busy,
    #[error("{0}")]
    Server(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("invalid server URL {url:?}: {reason}")]
    InvalidServer { url: String, reason: String },
    #[error("failed to read audio file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to prepare playback: {0}")]
    Playback(#[source] std::io::Error),
}

// ── Playback ─────────────────────────────────────────────────────

/// Synthesized audio on disk, removed when dropped.
#[derive(Debug)]
pub struct PlaybackResource {
    file: NamedTempFile,
    len: usize,
}

impl PlaybackResource {
    pub fn create(bytes: &[u8]) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("clonevox-")
            .suffix(".wav")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self {
            file,
            len: bytes.len(),
        })
    }

    /// Location a player can open while the resource is alive.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy the audio somewhere permanent. The resource itself stays owned.
    pub fn persist_to(&self, dest: &Path) -> std::io::Result<u64> {
        std::fs::copy(self.path(), dest)
    }
}

// ── API seam ─────────────────────────────────────────────────────

/// Transport used by [`CloneForm`] to reach the relay endpoint.
#[async_trait]
pub trait CloneVoiceApi: Send + Sync {
    async fn clone_voice(&self, text: &str, audio: &AudioUpload) -> Result<Bytes, ClientError>;
}

#[derive(Deserialize)]
struct ErrorReply {
    error: Option<String>,
}

/// Extract the `error` field from a failure body, or the fallback message.
pub fn server_error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorReply>(body)
        .ok()
        .and_then(|reply| reply.error)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| FALLBACK_FAILURE_MESSAGE.to_string())
}

/// HTTP client for a running gateway.
pub struct ProxyClient {
    client: Client,
    endpoint: Url,
}

impl ProxyClient {
    pub fn new(server: &str) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidServer {
            url: server.to_string(),
            reason,
        };
        let base = Url::parse(server.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", base.scheme())));
        }
        let endpoint = base
            .join(CLONE_VOICE_PATH)
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl CloneVoiceApi for ProxyClient {
    async fn clone_voice(&self, text: &str, audio: &AudioUpload) -> Result<Bytes, ClientError> {
        let mut part = multipart::Part::bytes(audio.bytes.to_vec())
            .file_name(audio.file_name.clone().unwrap_or_else(|| "blob".to_string()));
        if let Some(mime) = audio.content_type.as_deref() {
            part = part.mime_str(mime)?;
        }
        let form = multipart::Form::new()
            .text("text", text.to_owned())
            .part("audio_file", part);

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(ClientError::Server(server_error_message(&body)));
        }

        Ok(response.bytes().await?)
    }
}

/// MIME type hint from a file extension. Anything unknown is sent untyped.
pub fn guess_audio_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "ogg" => Some("audio/ogg"),
        "flac" => Some("audio/flac"),
        "m4a" => Some("audio/mp4"),
        "webm" => Some("audio/webm"),
        _ => None,
    }
}

/// Read an audio sample from disk. No type or size validation.
pub async fn load_audio_file(path: &Path) -> Result<AudioUpload, ClientError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ClientError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(AudioUpload {
        file_name: path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_owned),
        content_type: guess_audio_content_type(path).map(str::to_owned),
        bytes: Bytes::from(bytes),
    })
}

// ── Form state machine ───────────────────────────────────────────

#[derive(Debug)]
pub enum FormStatus {
    Idle,
    Loading,
    Success(PlaybackResource),
    Error(String),
}

/// Inputs captured when a submission starts.
#[derive(Debug, Clone)]
pub struct Submission {
    pub text: String,
    pub audio: AudioUpload,
}

pub struct CloneForm {
    text: String,
    audio: Option<AudioUpload>,
    status: FormStatus,
    log: Arc<dyn EventLog>,
}

impl CloneForm {
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self {
            text: DEFAULT_SAMPLE_TEXT.to_string(),
            audio: None,
            status: FormStatus::Idle,
            log,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn audio(&self) -> Option<&AudioUpload> {
        self.audio.as_ref()
    }

    /// Accept any file. A shown error is cleared; a shown result is kept.
    pub fn select_file(&mut self, audio: AudioUpload) {
        self.audio = Some(audio);
        if matches!(self.status, FormStatus::Error(_)) {
            self.status = FormStatus::Idle;
        }
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, FormStatus::Loading)
    }

    /// Mirrors the disabled state of the submit button.
    pub fn can_submit(&self) -> bool {
        !self.is_loading() && self.audio.is_some()
    }

    pub fn result(&self) -> Option<&PlaybackResource> {
        match &self.status {
            FormStatus::Success(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            FormStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Enter `Loading`, releasing any previous result.
    ///
    /// Without a file the form fails locally and no submission is returned.
    pub fn start_submission(&mut self) -> Result<Submission, ClientError> {
        if self.is_loading() {
            return Err(ClientError::Busy);
        }
        self.status = FormStatus::Loading;

        let Some(audio) = self.audio.clone() else {
            self.finish(Err(ClientError::NoFile));
            return Err(ClientError::NoFile);
        };

        Ok(Submission {
            text: self.text.clone(),
            audio,
        })
    }

    /// Leave `Loading` with the outcome of the request.
    pub fn finish(&mut self, outcome: Result<Bytes, ClientError>) {
        if !self.is_loading() {
            self.log.warning("Ignoring a clone result with no request in flight");
            return;
        }

        let outcome = outcome
            .and_then(|bytes| PlaybackResource::create(&bytes).map_err(ClientError::Playback));

        self.status = match outcome {
            Ok(resource) => FormStatus::Success(resource),
            Err(err) => {
                let message = err.to_string();
                self.log.error(&message);
                FormStatus::Error(message)
            }
        };
    }

    /// Run one full submission against `api`.
    pub async fn submit<A>(&mut self, api: &A) -> &FormStatus
    where
        A: CloneVoiceApi + ?Sized,
    {
        match self.start_submission() {
            Ok(submission) => {
                let outcome = api.clone_voice(&submission.text, &submission.audio).await;
                self.finish(outcome);
            }
            Err(ClientError::Busy) => {
                self.log.warning("Submit ignored: a request is already in progress");
            }
            Err(_) => {}
        }
        &self.status
    }
}
