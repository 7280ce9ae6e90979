//! HTTP server assembly for the bug board.
//!
//! Mounts the JSON API under `/api`, adds a health probe, and wraps the whole
//! router in a request-tracing layer.

use std::{path::PathBuf, sync::Arc};

use axum::{Json, Router, routing::get};
use bugboard_core::store::{BoardStore, VoteStore};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `BUGBOARD_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8000 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/bugboard/board.db") }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       default_host(),
      port:       default_port(),
      store_path: default_store_path(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// Build the complete application router for `store`.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: BoardStore + VoteStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", bugboard_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}
