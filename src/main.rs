//! LingoFlow · conversational lesson backend
//!
//! - Axum HTTP + WebSocket API driving a single view-state session
//! - Gemini integration for lesson generation and role-play (via environment variables)
//! - Static SPA fallback (STATIC_DIR/index.html)
//!
//! Important env variables:
//!   PORT                    : u16 (default 3000)
//!   GEMINI_API_KEY          : credential; without it, generation is refused
//!   GEMINI_BASE_URL         : default "https://generativelanguage.googleapis.com/v1beta"
//!   GEMINI_MODEL            : default "gemini-2.5-flash"
//!   GEMINI_CHAT_MODEL       : role-play model, defaults to GEMINI_MODEL
//!   GENERATION_TIMEOUT_SECS : upper bound per model call (default 60)
//!   STATIC_DIR              : SPA bundle directory (default "./static")
//!   LINGOFLOW_PREFERS_DARK  : start the session in dark theme
//!   PROMPTS_CONFIG_PATH     : path to TOML prompt overrides
//!   LOG_LEVEL               : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT              : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod history;
mod seeds;
mod controller;
mod service;
mod gemini;
mod state;
mod protocol;
mod logic;
mod routes;
#[cfg(test)]
mod testing;

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::config::Settings;
use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let settings = Settings::from_env();
  let addr = settings.addr;

  // Single session state (controller, Gemini client, prompts).
  let state = Arc::new(AppState::from_env(settings)?);

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state);

  let listener = TcpListener::bind(addr).await?;
  info!(target: "lingoflow", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "lingoflow", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "lingoflow", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  info!(target: "lingoflow", "Shutdown requested");
}
