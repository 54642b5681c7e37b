//! StrideQuest · Trail Experience Backend
//!
//! - Axum HTTP + WebSocket API
//! - Optional photo-validation service integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT          : u16 (default 3000)
//!   PHOTO_VALIDATOR_URL : enables the external photo validator if present
//!   TRAIL_CONFIG_PATH  : path to TOML trail bank (optional)
//!   SCORES_PATH    : path to the JSON score mirror (optional)
//!   LOG_LEVEL    : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod geo;
mod config;
mod seeds;
mod state;
mod engine;
mod validator;
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

  // Build shared application state (trail bank, seeds, scores, validator).
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
  info!(target: "stridequest_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
