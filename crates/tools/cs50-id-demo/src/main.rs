//! Demo web application authenticating users through CS50 ID.
//!
//! Visiting `/` without a callback redirects to CS50 ID; the provider sends
//! the browser back to `/` with `code` and `state`, and the page answers
//! with the user's claims as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use cs50_id::IdentityClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;

use app::{AppState, SessionRegistry, router};
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.client_config()?;
    let client = IdentityClient::new(config).context("Failed to create CS50 ID client")?;

    let sessions = SessionRegistry::new(args.login_ttl(), args.max_pending_logins);
    let app = router(AppState::new(client, sessions));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;

    info!("Listening on http://{}", args.bind);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
