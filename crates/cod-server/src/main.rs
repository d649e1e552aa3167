//! Cash-on-delivery dashboard server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), layers `COD_*`
//! environment variables over it, opens the SQLite store, and serves the JSON
//! API over HTTP until Ctrl-C.
//!
//! Nested keys use `__` in the environment, e.g. `COD_AUTH__JWT_SECRET`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use cod_api::CourierDispatcher;
use cod_server::{AppState, ServerConfig};
use cod_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Cash-on-delivery dashboard server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("COD")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent() {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::info!(path = %store_path.display(), "store opened");

  let couriers = CourierDispatcher::new(server_cfg.couriers.clone())
    .context("failed to build courier webhook client")?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let store = Arc::new(store);
  let state = AppState::new(Arc::clone(&store), couriers, server_cfg);
  let app = cod_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  // The router and every handler clone are gone once `serve` returns.
  match Arc::try_unwrap(store) {
    Ok(store) => match store.close().await {
      Ok(()) => tracing::info!("store closed"),
      Err(e) => tracing::error!(error = %e, "failed to close store"),
    },
    Err(_) => tracing::warn!("store still shared at shutdown; skipping close"),
  }

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
