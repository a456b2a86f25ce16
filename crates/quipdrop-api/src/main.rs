//! quipdropd — the Quipdrop release server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), layers the
//! `QUIPDROP_` environment prefix on top, opens an in-process SQLite store,
//! and serves the JSON API over HTTP.

use std::{sync::Arc, time::Duration};

use anyhow::Context as _;
use clap::Parser;
use quipdrop_api::ServerConfig;
use quipdrop_engine::{EngineConfig, ReleaseEngine};
use quipdrop_provider_http::HttpProvider;
use quipdrop_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Quipdrop release server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration. Every field has a default, so a missing file is fine.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("QUIPDROP"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open SQLite store.
  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  // Build the engine with its configuration fixed up front.
  let provider = HttpProvider::new(&server_cfg.provider_url)
    .context("failed to build HTTP provider")?;
  let engine = ReleaseEngine::new(
    Arc::new(store),
    provider,
    EngineConfig {
      max_attempts:    server_cfg.provider_max_attempts,
      attempt_timeout: Duration::from_secs(server_cfg.provider_timeout_secs),
    },
  );

  let app = quipdrop_api::api_router(Arc::new(engine)).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
