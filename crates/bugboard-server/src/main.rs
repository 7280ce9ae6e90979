//! bugboard server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), layered under
//! `BUGBOARD_*` environment variables, opens the SQLite store, and serves the
//! board API over HTTP.
//!
//! # Bootstrapping an administrator
//!
//! ```
//! cargo run -p bugboard-server --bin server -- \
//!   --create-user root --email root@example.com --admin
//! ```
//!
//! The password is read from stdin.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use bugboard_api::token;
use bugboard_core::{record::NewUser, store::BoardStore};
use bugboard_server::ServerConfig;
use bugboard_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Bug board API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create an account with this username (password on stdin) and exit.
  #[arg(long, value_name = "USERNAME")]
  create_user: Option<String>,

  /// Email address for `--create-user`.
  #[arg(long, requires = "create_user")]
  email: Option<String>,

  /// Make the account created with `--create-user` an administrator.
  #[arg(long, requires = "create_user")]
  admin: bool,
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
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("BUGBOARD"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: create an account and exit.
  if let Some(username) = cli.create_user {
    return create_user(&store, username, cli.email, cli.admin).await;
  }

  let app = bugboard_server::router(Arc::new(store));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn create_user(
  store: &SqliteStore,
  username: String,
  email: Option<String>,
  is_admin: bool,
) -> anyhow::Result<()> {
  let email = email.context("--email is required with --create-user")?;
  let password = read_password()?;
  if password.is_empty() {
    anyhow::bail!("password may not be empty");
  }

  let password_hash = token::hash_password(&password)?;
  let user = store
    .create_user(NewUser { username, email, password_hash, is_admin })
    .await
    .map_err(bugboard_core::Error::from)
    .context("failed to create user")?;

  tracing::info!(user_id = %user.user_id, username = %user.username, is_admin, "account created");
  println!("{}", user.user_id);
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
