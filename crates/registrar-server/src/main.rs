//! registrar-server binary.
//!
//! Reads `registrar.toml` (or the path given with `--config`), opens the
//! SQLite store and serves the JSON API over HTTP.
//!
//! # Bootstrapping an administrator
//!
//! ```
//! cargo run -p registrar-server -- create-admin --name "Registrar" --email admin@example.edu
//! ```
//!
//! The password is read from stdin.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use registrar_core::{
  admin::{MIN_PASSWORD, NewAdmin},
  store::AdminStore,
};
use registrar_server::{AppState, ServerConfig, auth};
use registrar_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Registrar API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "registrar.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the API (the default).
  Serve,
  /// Create an administrator; the password is read from stdin.
  CreateAdmin {
    #[arg(long)]
    name:  String,
    #[arg(long)]
    email: String,
  },
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

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to read config from {:?}", cli.config))?;

  let database_path = server_cfg.database_path();
  let store = SqliteStore::open(&database_path)
    .await
    .with_context(|| format!("failed to open store at {database_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, server_cfg).await,
    Command::CreateAdmin { name, email } => create_admin(store, name, email).await,
  }
}

async fn serve(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let address = server_cfg.address();
  let state = AppState { store: Arc::new(store), config: Arc::new(server_cfg) };
  let app = registrar_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

async fn create_admin(store: SqliteStore, name: String, email: String) -> anyhow::Result<()> {
  let password = read_password()?;
  if password.chars().count() < MIN_PASSWORD {
    anyhow::bail!("password must be at least {MIN_PASSWORD} characters");
  }
  let password_hash =
    auth::hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;

  let admin = store
    .create_admin(NewAdmin { name, email, password_hash })
    .await
    .context("failed to create admin")?;
  tracing::info!(id = admin.id, email = %admin.email, "admin created");
  println!("{}", admin.id);
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
