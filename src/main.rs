//! LeafLens Server
//!
//! Loads the leaf disease classifier once and serves `/health` and
//! `/predict` over HTTP.

use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use leaflens::backend::{backend_name, default_device, InferenceBackend};
use leaflens::inference::Predictor;
use leaflens::model::ModelHost;
use leaflens::server::{self, AppState};
use leaflens::utils::logging::{init_logging, LogConfig};
use leaflens::ServerConfig;

/// LeafLens inference server
#[derive(Parser, Debug)]
#[command(name = "leaflens-server")]
#[command(version)]
#[command(about = "HTTP API for leaf disease classification")]
struct Cli {
    /// JSON config file; flags and environment variables override it
    #[arg(long, env = "LEAFLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long, env = "LEAFLENS_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "LEAFLENS_PORT")]
    port: Option<u16>,

    /// Classifier weights (Burn CompactRecorder file)
    #[arg(short, long, env = "LEAFLENS_MODEL_PATH")]
    model: Option<PathBuf>,

    /// Classifier architecture config (JSON)
    #[arg(long, env = "LEAFLENS_MODEL_CONFIG")]
    model_config: Option<PathBuf>,

    /// JSON array of class labels
    #[arg(short, long, env = "LEAFLENS_LABELS_PATH")]
    labels: Option<PathBuf>,

    /// Square input size of the classifier
    #[arg(long, env = "LEAFLENS_IMAGE_SIZE")]
    image_size: Option<u32>,

    /// Number of ranked classes per prediction
    #[arg(long, env = "LEAFLENS_TOP_K")]
    top_k: Option<usize>,

    /// Inference worker threads
    #[arg(short, long, env = "LEAFLENS_WORKERS")]
    workers: Option<usize>,

    /// Maximum upload size in bytes
    #[arg(long, env = "LEAFLENS_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error); overrides --verbose
    #[arg(long, env = "LEAFLENS_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Defaults, then the config file, then explicit flags
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(model) = self.model {
            config.model_path = model;
        }
        if let Some(model_config) = self.model_config {
            config.model_config_path = Some(model_config);
        }
        if let Some(labels) = self.labels {
            config.labels_path = labels;
        }
        if let Some(image_size) = self.image_size {
            config.image_size = image_size;
        }
        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(max_upload_bytes) = self.max_upload_bytes {
            config.max_upload_bytes = max_upload_bytes;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::for_server(
        cli.verbose,
        std::io::stdout().is_terminal(),
        cli.log_level.as_deref(),
    );
    init_logging(&log_config).map_err(anyhow::Error::msg)?;

    let config = cli.into_config()?;

    info!("LeafLens Server v{}", leaflens::VERSION);
    info!("Configuration:");
    info!("  Backend:     {}", backend_name());
    info!("  Model:       {:?}", config.model_path);
    info!("  Labels:      {:?}", config.labels_path);
    info!("  Input size:  {}x{}", config.image_size, config.image_size);
    info!("  Top-k:       {}", config.top_k);
    info!("  Log level:   {}", log_config.level);

    // Startup failures abort before anything is bound
    let device = default_device();
    let host = ModelHost::<InferenceBackend>::load(
        &config.model_path,
        config.model_config_path.as_deref(),
        &config.labels_path,
        &device,
    )
    .context("failed to load model artifacts")?;

    if host.config().input_size != config.image_size as usize {
        warn!(
            "Model was configured for {}x{} inputs but the server resizes to {}x{}",
            host.config().input_size,
            host.config().input_size,
            config.image_size,
            config.image_size
        );
    }

    let predictor = Predictor::new(&host, config.workers)?
        .with_image_size(config.image_size)
        .with_top_k(config.top_k);
    info!("Started {} inference workers", predictor.workers());

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address()))?;

    let state = Arc::new(AppState::new(config, predictor));
    let app = server::router(state);

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
