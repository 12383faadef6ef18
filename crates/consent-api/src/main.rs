//! consent-api server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) and
//! `CONSENT_*` environment variables, opens the SQLite store, and serves the
//! JSON API over HTTP.
//!
//! The document and policy assistant is enabled only when
//! `gemini_api_key` (or `CONSENT_GEMINI_API_KEY`) is set.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use consent_api::{AppState, ServerConfig, auth::hash_password};
use consent_assist::{AssistConfig, GeminiClient};
use consent_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "School software consent server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CONSENT"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let assist = match server_cfg.gemini_api_key.as_deref().filter(|k| !k.is_empty()) {
    Some(api_key) => Some(
      GeminiClient::new(AssistConfig {
        api_key:  api_key.to_owned(),
        model:    server_cfg.gemini_model.clone(),
        base_url: server_cfg.gemini_base_url.clone(),
      })
      .context("failed to build assistant client")?,
    ),
    None => {
      tracing::warn!("no gemini_api_key configured; assistant endpoints disabled");
      None
    }
  };

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = consent_api::router(AppState::new(store, server_cfg, assist));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read one line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\r', '\n']).to_string())
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
