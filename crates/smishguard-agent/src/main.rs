//! SmishGuard: smishing detection for SMS text.
//! Entry point for the `smishguard` binary.
//!
//! `smishguard "<message>" ...` classifies each argument and prints one JSON
//! verdict per line; with no arguments the HTTP API is served.

mod wiring;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use smishguard_config::Config;
use smishguard_web::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("smishguard=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("SmishGuard {} starting up", env!("CARGO_PKG_VERSION"));

    let config = Config::load().context("loading configuration")?;
    let components = wiring::build_components(config).context("building classifier")?;
    let classifier = components.classifier;

    // Index build/load happens here, before any message is classified.
    classifier
        .initialize()
        .await
        .context("preparing the example index")?;

    let messages: Vec<String> = std::env::args().skip(1).collect();
    if !messages.is_empty() {
        for message in &messages {
            let verdict = classifier.classify(message).await;
            println!("{}", serde_json::to_string(&verdict)?);
        }
        return Ok(());
    }

    let bind_addr = std::env::var("SMISHGUARD_BIND").unwrap_or(components.bind);
    let router = build_router(AppState::new(classifier));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!("API listening on http://{}", bind_addr);
    info!("   Classify: POST http://{}/api/classify", bind_addr);
    info!("   Health:   GET  http://{}/api/health", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("cannot listen for Ctrl+C: {e}");
            }
            info!("shutting down");
        })
        .await?;

    Ok(())
}
