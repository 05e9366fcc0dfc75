//! motif server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the JSON tagging API over HTTP. Every setting has a
//! default, so `motif-server` with no config file starts a working instance
//! on port 8000 with a `motif.db` store in the working directory.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use motif_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Motif video-tagging server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

/// Runtime server configuration, deserialised from `config.toml` with
/// `MOTIF_`-prefixed environment variables layered on top.
#[derive(Debug, Clone, Deserialize)]
struct ServerConfig {
  #[serde(default = "default_host")]
  host:       String,
  #[serde(default = "default_port")]
  port:       u16,
  #[serde(default = "default_store_path")]
  store_path: PathBuf,
}

fn default_host() -> String { "0.0.0.0".to_owned() }

fn default_port() -> u16 { 8000 }

fn default_store_path() -> PathBuf { PathBuf::from("motif.db") }

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

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("MOTIF").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // The API is called from scripts running on video pages, so CORS is wide
  // open. There is no cookie or credential to protect.
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods(Any)
    .allow_headers(Any);

  let app = motif_api::api_router(Arc::new(store))
    .layer(TraceLayer::new_for_http())
    .layer(cors);

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~/` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  match path.to_string_lossy().strip_prefix("~/") {
    Some(rest) => match std::env::var_os("HOME") {
      Some(home) => PathBuf::from(home).join(rest),
      None => path.to_path_buf(),
    },
    None => path.to_path_buf(),
  }
}
