// ANPR Migration Badge - Web Server

use anpr_badge::observability::init_tracing;
use anpr_badge::{
    build_router, AppState, BadgeConfig, BadgeService, HttpRegistryClient, SvgBadgeRenderer,
};
use anyhow::{Context, Result};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = BadgeConfig::from_env()?;
    init_tracing(&config.log_filter);

    let registry = HttpRegistryClient::new(&config.registry_url, config.upstream_timeout)?;
    let service = BadgeService::new(
        Arc::new(registry),
        Arc::new(SvgBadgeRenderer::new()),
        config.embed_logo,
    );
    let app = build_router(AppState::new(service, &config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        registry_url = %config.registry_url,
        timeout_secs = config.upstream_timeout.as_secs(),
        "anpr badge server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("Failed to start server")?;

    Ok(())
}
