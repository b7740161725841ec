use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use incubator_ml::{HfInferenceRecognizer, OcrPipeline};
use tokio::net::TcpListener;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::{
    config::{Config, TOKEN_ENV},
    server,
};

#[derive(Clone)]
pub struct AppResources {
    pub pipeline: OcrPipeline,
}

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file, defaults to <config_dir>/incubator/config.toml"
    )]
    config: Option<PathBuf>,
    #[arg(long, value_name = "HOST", help = "Address to bind the HTTP server to")]
    host: Option<String>,
    #[arg(short, long, value_name = "PORT", help = "Port to bind the HTTP server to")]
    port: Option<u16>,
    #[arg(long, value_name = "URL", help = "Base URL of the inference API")]
    ocr_endpoint: Option<String>,
    #[arg(long, value_name = "MODEL", help = "Recognition model id")]
    ocr_model: Option<String>,
}

fn initialize() {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

fn load_config(cli: Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(endpoint) = cli.ocr_endpoint {
        config.recognizer.endpoint = endpoint;
    }
    if let Some(model) = cli.ocr_model {
        config.recognizer.model = model;
    }
    config.set_token(std::env::var(TOKEN_ENV).ok());

    Ok(config)
}

pub async fn build_resources(config: &Config) -> Result<AppResources> {
    let recognizer = HfInferenceRecognizer::new(&config.recognizer)
        .context("Failed to initialize recognizer")?;
    if let Err(err) = recognizer.init().await {
        tracing::warn!("Recognizer is not reachable yet: {err:#}");
    }

    let pipeline = OcrPipeline::new(Arc::new(recognizer), config.chunking);
    if !pipeline.has_detector() {
        tracing::warn!("no text detector configured, page recognition will answer 503");
    }

    Ok(AppResources { pipeline })
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    initialize();

    let config = load_config(cli)?;
    let resources = build_resources(&config).await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    server::serve_with_listener(listener, resources).await
}
