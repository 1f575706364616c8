// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use place2be_api::{
    api::router,
    auth::{HttpJwksSource, KeySetCache, TokenVerifier},
    config::AppConfig,
    state::AppState,
    telemetry::init_tracing,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    let source = HttpJwksSource::new(config.auth.jwks_url.clone(), config.auth.fetch_timeout)?;
    let cache = KeySetCache::new(Arc::new(source)).with_ttl(config.auth.cache_ttl);
    let verifier = TokenVerifier::new(config.auth.verifier_config(), cache);

    // Warm the key set; a failure here is retried on the first request.
    if let Err(e) = verifier.key_cache().refresh().await {
        tracing::warn!(error = %e, jwks_url = %config.auth.jwks_url, "Initial JWKS fetch failed");
    }

    let app = router(AppState::new(verifier));
    let listener = TcpListener::bind(config.bind_addr).await?;

    tracing::info!(
        addr = %config.bind_addr,
        issuer = %config.auth.issuer,
        audience = %config.auth.audience,
        "Place2Be API listening (docs at /docs)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
