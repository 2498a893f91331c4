//! # elitecars-web
//!
//! Server-rendered front-end for the EliteCars listing API.
//!
//! Visitors browse cars and send inquiries; an admin manages listings and answers
//! inquiries. Every data operation is forwarded to the backend API over HTTP.
//!
//! ## Architecture
//!
//! - **Backend clients**: one pooled `reqwest` client, one result type, error bodies
//!   unwrapped into readable messages
//! - **Sessions**: in-memory store keyed by an opaque cookie token, idle expiry
//! - **Credential bridge**: the caller's session travels with each backend call
//! - **HTTP**: Axum router with an admin guard, rate limiting, request IDs, and
//!   graceful shutdown

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

mod backend;
mod config;
mod http;
mod inquiry_rules;
mod models;
mod session;
mod views;

use std::time::Duration;

use anyhow::Context;
use axum::serve;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::backend::http_client;
use crate::config::{AppConfig, Cli};
use crate::http::{router, AppState};
use crate::session::SessionStore;

/// How often expired sessions are swept out of the store.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging().context("failed to initialize logging")?;

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli).context("failed to load configuration")?;
    info!(
        bind = %config.bind,
        api_base_url = %config.backend.base_url,
        request_timeout = ?config.backend.request_timeout,
        max_upload_size = config.max_upload_size,
        session_idle_timeout = ?config.session.idle_timeout,
        secure_cookie = config.session.secure,
        "configuration loaded"
    );
    if config.backend.accept_invalid_certs {
        tracing::warn!("backend TLS certificate validation is disabled");
    }

    let http = http_client(&config.backend).context("failed to build backend HTTP client")?;
    let sessions = SessionStore::new(config.session.clone());
    spawn_session_sweeper(sessions.clone(), SESSION_SWEEP_INTERVAL);

    let state =
        AppState::new(http, &config.backend, sessions).with_max_upload_size(config.max_upload_size);
    let app = router(state);
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    let shutdown = tokio::signal::ctrl_c();
    info!(bind = %config.bind, "elitecars-web listening");

    serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
            info!("shutting down gracefully");
        })
        .await
        .context("server exited with error")
}

/// Initialize tracing subscriber with `RUST_LOG` env filter (default: `info`).
fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

/// Drops idle sessions on a ticker so abandoned browsers do not accumulate.
fn spawn_session_sweeper(sessions: SessionStore, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = sessions.purge_expired();
            if removed > 0 {
                info!(removed, active = sessions.len(), "expired sessions purged");
            } else {
                debug!(active = sessions.len(), "session sweep found nothing to purge");
            }
        }
    });
}
