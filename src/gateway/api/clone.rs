// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>
// Patent Pending — DE Gebrauchsmuster, filed 2026-02-23

//! `POST /api/clone-voice` — relays a text + audio sample upload to the
//! upstream voice-cloning service and returns the synthesized audio.

use super::types::{
    ErrorBody, CLONED_AUDIO_CONTENT_TYPE, CLONE_FAILED_MESSAGE, MISSING_AUDIO_MESSAGE,
    UPLOAD_TOO_LARGE_MESSAGE,
};
use crate::gateway::AppState;
use crate::providers::{AudioUpload, CloneRequest, UpstreamError};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use thiserror::Error;

pub fn router(max_upload_bytes: Option<usize>) -> Router<AppState> {
    let limit = match max_upload_bytes {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/api/clone-voice", post(clone_voice))
        .layer(limit)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request did not include an audio_file field")]
    MissingAudio,
    #[error("upload exceeds the configured size limit: {0}")]
    TooLarge(String),
    #[error("unreadable multipart request: {0}")]
    Multipart(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Multipart(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::TooLarge(err.body_text())
        } else {
            Self::Multipart(err.body_text())
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingAudio => StatusCode::BAD_REQUEST,
            Self::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Multipart(_) | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The only text a caller ever sees. Internal detail stays in the log.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingAudio => MISSING_AUDIO_MESSAGE,
            Self::TooLarge(_) => UPLOAD_TOO_LARGE_MESSAGE,
            Self::Multipart(_) | Self::Upstream(_) => CLONE_FAILED_MESSAGE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.public_message()))).into_response()
    }
}

/// Fields of interest from the incoming form. The first occurrence wins.
#[derive(Debug, Default)]
struct CloneForm {
    text: Option<String>,
    audio: Option<AudioUpload>,
}

async fn read_form(mut multipart: Multipart) -> Result<CloneForm, MultipartError> {
    let mut form = CloneForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("text") if form.text.is_none() => {
                form.text = Some(field.text().await?);
            }
            Some("audio_file") if form.audio.is_none() => {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await?;
                form.audio = Some(AudioUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn relay(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let form = read_form(multipart?).await?;
    let audio = form.audio.ok_or(ApiError::MissingAudio)?;

    let cloned = state
        .cloner
        .clone_voice(CloneRequest {
            text: form.text,
            audio,
        })
        .await?;

    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static(CLONED_AUDIO_CONTENT_TYPE))],
        cloned.bytes,
    )
        .into_response())
}

/// POST /api/clone-voice
pub async fn clone_voice(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    match relay(&state, multipart).await {
        Ok(response) => response,
        Err(err) => {
            if err.status().is_server_error() {
                state.log.error(&format!("Voice cloning error: {err}"));
            }
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{EventLog, MemoryLog};
    use crate::providers::{MockVoiceCloner, VoiceCloner};
    use axum::body::{Body, Bytes};
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "clonevox-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    let header = format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n");
                    body.extend_from_slice(header.as_bytes());
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, file_name, mime, bytes) => {
                    let header = format!(
                        "Content-Disposition: form-data; name=\"{name}\"; \
                         filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
                    );
                    body.extend_from_slice(header.as_bytes());
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
        Request::post("/api/clone-voice")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    fn test_state(cloner: Arc<MockVoiceCloner>, log: Arc<MemoryLog>) -> AppState {
        let cloner: Arc<dyn VoiceCloner> = cloner;
        let log: Arc<dyn EventLog> = log;
        AppState { cloner, log }
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Option<String>, Bytes) {
        send_limited(state, request, None).await
    }

    async fn send_limited(
        state: AppState,
        request: Request<Body>,
        max_upload_bytes: Option<usize>,
    ) -> (StatusCode, Option<String>, Bytes) {
        let response = router(max_upload_bytes)
            .with_state(state)
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, body)
    }

    #[tokio::test]
    async fn missing_audio_file_is_rejected_without_upstream_call() {
        let cloner = Arc::new(MockVoiceCloner::audio(&b"unused"[..]));
        let log = Arc::new(MemoryLog::new());

        let (status, _, body) = send(
            test_state(cloner.clone(), log.clone()),
            multipart_request(&[Part::Text("text", "hello")]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let parsed: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "Please upload an audio file.");
        assert_eq!(cloner.calls(), 0);
        assert!(log.errors().is_empty());
    }

    #[tokio::test]
    async fn audio_bytes_are_returned_verbatim_as_wav() {
        let upstream_audio: &[u8] = &[0x49, 0x44, 0x33, 0x00, 0xff, 0x10, 0x80];
        let cloner = Arc::new(MockVoiceCloner::audio(upstream_audio.to_vec()));
        let log = Arc::new(MemoryLog::new());

        let (status, content_type, body) = send(
            test_state(cloner.clone(), log.clone()),
            multipart_request(&[
                Part::Text("text", "مرحبا"),
                Part::File("audio_file", "voice.wav", "audio/wav", b"RIFFdata"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("audio/wav"));
        assert_eq!(body.as_ref(), upstream_audio);
        assert!(log.entries().is_empty(), "success path must not log");

        let requests = cloner.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].text.as_deref(), Some("مرحبا"));
        assert_eq!(requests[0].audio.file_name.as_deref(), Some("voice.wav"));
        assert_eq!(requests[0].audio.content_type.as_deref(), Some("audio/wav"));
        assert_eq!(requests[0].audio.bytes.as_ref(), b"RIFFdata");
    }

    #[tokio::test]
    async fn missing_text_is_passed_through_as_absent() {
        let cloner = Arc::new(MockVoiceCloner::audio(&b"ok"[..]));
        let log = Arc::new(MemoryLog::new());

        let (status, _, _) = send(
            test_state(cloner.clone(), log),
            multipart_request(&[Part::File("audio_file", "a.mp3", "audio/mpeg", b"mp3")]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cloner.requests()[0].text, None);
    }

    #[tokio::test]
    async fn upstream_status_failure_is_generic_500_and_logged() {
        let cloner = Arc::new(MockVoiceCloner::failing_status(StatusCode::BAD_GATEWAY));
        let log = Arc::new(MemoryLog::new());

        let (status, content_type, body) = send(
            test_state(cloner, log.clone()),
            multipart_request(&[Part::File("audio_file", "a.wav", "audio/wav", b"x")]),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        let parsed: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, CLONE_FAILED_MESSAGE);
        assert!(!String::from_utf8_lossy(&body).contains("502"));

        let errors = log.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Voice cloning error:"));
        assert!(errors[0].contains("502"));
    }

    #[tokio::test]
    async fn non_audio_upstream_response_is_generic_500() {
        let cloner = Arc::new(MockVoiceCloner::non_audio("application/json"));
        let log = Arc::new(MemoryLog::new());

        let (status, _, body) = send(
            test_state(cloner, log.clone()),
            multipart_request(&[Part::File("audio_file", "a.wav", "audio/wav", b"x")]),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let parsed: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, CLONE_FAILED_MESSAGE);
        assert!(log.errors()[0].contains("application/json"));
    }

    #[tokio::test]
    async fn non_multipart_body_is_generic_500() {
        let cloner = Arc::new(MockVoiceCloner::audio(&b"unused"[..]));
        let log = Arc::new(MemoryLog::new());
        let request = Request::post("/api/clone-voice")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text":"hi"}"#))
            .unwrap();

        let (status, _, body) = send(test_state(cloner.clone(), log.clone()), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let parsed: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, CLONE_FAILED_MESSAGE);
        assert_eq!(cloner.calls(), 0);
        assert_eq!(log.errors().len(), 1);
    }

    #[tokio::test]
    async fn oversized_upload_is_413_without_upstream_call() {
        let cloner = Arc::new(MockVoiceCloner::audio(&b"unused"[..]));
        let log = Arc::new(MemoryLog::new());
        let sample = vec![0x42u8; 64 * 1024];

        let (status, content_type, body) = send_limited(
            test_state(cloner.clone(), log.clone()),
            multipart_request(&[Part::File("audio_file", "big.wav", "audio/wav", &sample)]),
            Some(1024),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        let parsed: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, UPLOAD_TOO_LARGE_MESSAGE);
        assert_eq!(cloner.calls(), 0);
        assert!(log.errors().is_empty());
    }

    #[tokio::test]
    async fn upload_within_limit_is_relayed() {
        let cloner = Arc::new(MockVoiceCloner::audio(&b"ok"[..]));
        let log = Arc::new(MemoryLog::new());

        let (status, _, _) = send_limited(
            test_state(cloner.clone(), log),
            multipart_request(&[Part::File("audio_file", "small.wav", "audio/wav", b"tiny")]),
            Some(1024),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cloner.calls(), 1);
    }

    #[test]
    fn api_error_mapping() {
        assert_eq!(ApiError::MissingAudio.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingAudio.public_message(), MISSING_AUDIO_MESSAGE);

        let too_large = ApiError::TooLarge("Request payload is too large".into());
        assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(too_large.public_message(), UPLOAD_TOO_LARGE_MESSAGE);

        let upstream = ApiError::from(UpstreamError::UnexpectedContentType(None));
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.public_message(), CLONE_FAILED_MESSAGE);
    }
}
