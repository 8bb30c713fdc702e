// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>
// Patent Pending — DE Gebrauchsmuster, filed 2026-02-23

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clonevox::client::{self, CloneForm, FormStatus, ProxyClient};
use clonevox::config::{self, Config};
use clonevox::gateway;
use clonevox::logging::{self, TracingLog};
use std::path::PathBuf;
use std::sync::Arc;

/// Voice cloning web front-end and relay proxy.
#[derive(Parser, Debug)]
#[command(name = "clonevox", version, about)]
struct Cli {
    /// Path to a TOML config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web gateway (form + /api/clone-voice)
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, 0 for any free port (overrides config)
        #[arg(long, short)]
        port: Option<u16>,
    },
    /// Clone a voice through a running gateway and save the result
    Clone {
        /// Audio sample to imitate (.wav or .mp3)
        #[arg(long, short)]
        audio: PathBuf,
        /// Text to synthesize (default: the Arabic sample sentence)
        #[arg(long, short)]
        text: Option<String>,
        /// Gateway base URL (default: derived from [gateway] config)
        #[arg(long)]
        server: Option<String>,
        /// Where to write the synthesized audio
        #[arg(long, short, default_value = "cloned.wav")]
        output: PathBuf,
    },
}

fn default_server_url(config: &Config) -> String {
    let port = config.gateway.port;
    match config.gateway.host.as_str() {
        "0.0.0.0" | "::" | "[::]" => format!("http://127.0.0.1:{port}"),
        v6 if v6.contains(':') && !v6.starts_with('[') => format!("http://[{v6}]:{port}"),
        other => format!("http://{other}:{port}"),
    }
}

async fn run_clone(
    config: &Config,
    audio: PathBuf,
    text: Option<String>,
    server: Option<String>,
    output: PathBuf,
) -> Result<()> {
    let server = server.unwrap_or_else(|| default_server_url(config));
    let api = ProxyClient::new(&server)?;
    let upload = client::load_audio_file(&audio).await?;

    let mut form = CloneForm::new(Arc::new(TracingLog));
    form.select_file(upload);
    if let Some(text) = text {
        form.set_text(text);
    }

    println!("🎙️  Cloning voice from {} via {}", audio.display(), api.endpoint());
    match form.submit(&api).await {
        FormStatus::Success(resource) => {
            let written = resource
                .persist_to(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("✅ Saved {written} bytes to {}", output.display());
            Ok(())
        }
        FormStatus::Error(message) => anyhow::bail!("{message}"),
        FormStatus::Idle | FormStatus::Loading => anyhow::bail!("Request did not complete"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref())?;
    logging::init_tracing(&config.logging.level);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            gateway::run_gateway(config).await
        }
        Commands::Clone {
            audio,
            text,
            server,
            output,
        } => run_clone(&config, audio, text, server, output).await,
    }
}
