// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Duration;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use token_gate::{
    api::router,
    auth::{Authenticator, PublicKeySet, RsaTokenIssuer},
    config::{AppConfig, KeySource, LogFormat},
    error::ServerError,
    state::AppState,
    telemetry::init_tracing,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| ServerError::CryptoProvider)?;

    // Installed before config parsing so config errors are logged too.
    init_tracing(LogFormat::from_env());

    run().await.inspect_err(|e| {
        tracing::error!(error = %e, "Token gate failed");
    })
}

async fn run() -> Result<(), ServerError> {
    let config = AppConfig::from_env()?;

    let keys = match &config.key_source {
        KeySource::Path(path) => {
            tracing::info!(path = %path.display(), "Loading verification keys");
            PublicKeySet::load(path)?
        }
        KeySource::Url(url) => {
            tracing::info!(url = %url, "Fetching verification keys");
            PublicKeySet::fetch(url.as_str()).await?
        }
    };
    tracing::info!(count = keys.len(), "Verification keys loaded");

    let issuer = RsaTokenIssuer::load(&config.signing_key_path)?.with_ttl(config.token_ttl);
    let auth = Authenticator::new(keys, issuer).with_leeway(config.leeway_secs);
    let app = router(AppState::new(auth));

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received, draining connections");
        shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    let addr = config.bind_addr;
    match &config.tls {
        Some(tls) => {
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .map_err(ServerError::Tls)?;
            tracing::info!(%addr, "Token gate listening on https://{addr}");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!(%addr, "Token gate listening on http://{addr}");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}
