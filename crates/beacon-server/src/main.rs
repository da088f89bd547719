//! Beacon server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens an
//! in-process SQLite alert store, builds the identity directory from the
//! configured roster, and serves the JSON API over HTTP.

mod settings;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use beacon_api::AppState;
use beacon_core::notify::LogNotifier;
use beacon_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Beacon alert lifecycle server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
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

  // Load configuration.
  let loaded = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("BEACON"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = loaded
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Materialise the identity roster.
  let directory = server_cfg.roster.build_directory();
  tracing::info!(
    actors = server_cfg.roster.actor_count(),
    "loaded identity roster"
  );

  let state = AppState::new(
    Arc::new(store),
    Arc::new(directory),
    Arc::new(LogNotifier),
  );

  let app = beacon_api::router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
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
