// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>
// Patent Pending — DE Gebrauchsmuster, filed 2026-02-23

//! Axum-based HTTP gateway.
//!
//! Serves the voice-cloning form at `/`, a health check at `/health`, and
//! the relay endpoint at `/api/clone-voice`. Each request is handled in
//! isolation; the shared state is read-only.

pub mod api;

use crate::config::{Config, GatewayConfig};
use crate::logging::{EventLog, TracingLog};
use crate::providers::{self, VoiceCloner};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{DefaultOnFailure, TraceLayer};

/// The browser form, embedded at compile time.
pub const INDEX_HTML: &str = include_str!("../../frontend/index.html");

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub cloner: Arc<dyn VoiceCloner>,
    pub log: Arc<dyn EventLog>,
}

fn is_loopback_host(host: &str) -> bool {
    matches!(host, "127.0.0.1" | "localhost" | "::1" | "[::1]")
}

/// Assemble the full router with middleware.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    // ── Security Headers Middleware ───────────────────────────
    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        // The form uses an inline script and plays results from blob: URLs
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(concat!(
                "default-src 'self'; script-src 'self' 'unsafe-inline'; ",
                "style-src 'self' 'unsafe-inline'; media-src 'self' blob:; connect-src 'self';",
            )),
        ));

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .merge(api::routes(config.max_upload_bytes))
        .with_state(state)
        // Relay failures are already reported once through the event log
        .layer(
            TraceLayer::new_for_http()
                .on_failure(DefaultOnFailure::new().level(tracing::Level::DEBUG)),
        )
        .layer(security_headers)
}

/// Run the HTTP gateway until Ctrl+C.
pub async fn run_gateway(config: Config) -> Result<()> {
    let GatewayConfig { host, port, .. } = &config.gateway;
    if !is_loopback_host(host) {
        tracing::warn!("Gateway bound to {host}: the relay endpoint has no authentication");
    }

    let listener = tokio::net::TcpListener::bind((host.as_str(), *port))
        .await
        .with_context(|| format!("Failed to bind gateway to {host}:{port}"))?;
    let actual_port = listener.local_addr()?.port();
    let display_addr = format!("{host}:{actual_port}");

    let cloner: Arc<dyn VoiceCloner> = Arc::from(providers::create_voice_cloner(&config.upstream)?);
    let state = AppState {
        cloner,
        log: Arc::new(TracingLog),
    };

    println!("🎙️  Clonevox Gateway listening on http://{display_addr}");
    println!("  GET  /                 — voice cloning form");
    println!("  POST /api/clone-voice  — multipart text + audio_file");
    println!("  GET  /health           — health check");
    println!(
        "  Upstream: {} (language: {})",
        config.upstream.url, config.upstream.language
    );
    println!("  Press Ctrl+C to stop.\n");

    let app = build_router(state, &config.gateway);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// AXUM HANDLERS
// ══════════════════════════════════════════════════════════════════════════════

/// GET / — the voice cloning form
async fn handle_index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

/// GET /health — always public (no secrets leaked)
async fn handle_health(State(state): State<AppState>) -> Json<api::types::HealthStatus> {
    Json(api::types::HealthStatus {
        status: "ok".into(),
        upstream: state.cloner.name().to_string(),
    })
}
