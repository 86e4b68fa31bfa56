//! Quizgen · AI quiz question backend
//!
//! - Axum HTTP + WebSocket API
//! - Gemini or OpenAI-compatible generation (via environment variables)
//! - Multi-strategy parsing of model output, retries, static fallback sets
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT             : u16 (default 3000)
//!   GEMINI_API_KEY   : enables Gemini integration if present (preferred)
//!   GEMINI_BASE_URL  : default "https://generativelanguage.googleapis.com/v1beta"
//!   OPENAI_API_KEY   : enables an OpenAI-compatible backend when no Gemini key is set
//!   OPENAI_BASE_URL  : default "https://api.openai.com/v1"
//!   QUIZ_CONFIG_PATH : path to TOML config (prompts, models, retry, fallback sets)
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod seeds;
mod llm;
mod gemini;
mod openai;
mod model_router;
mod normalize;
mod parser;
mod validate;
mod cache;
mod orchestrator;
mod feedback;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (backend, orchestrator, cache, prompts).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "quizgen_backend", %addr, backend = state.backend_name(), "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
