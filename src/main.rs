// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

use std::{sync::Arc, time::Duration};

use axum_server::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use vyre_casino_api::{
    api::router,
    auth::{AdminKeyVerifier, JwtManager, NonceError, NonceStore},
    config::{ConfigError, ServerConfig},
    leaderboard_job::LeaderboardRefresher,
    service::{leaderboard::active_chain_ids, ServiceError},
    state::AppState,
    storage::{CasinoDb, ChainRepository, StoreError, StoredChain, DB_FILE_NAME},
    telemetry::{self, LogFormat},
    tls::{self, TlsError},
};

/// In-flight requests get this long to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("database: {0}")]
    Store(#[from] StoreError),

    #[error("nonce store: {0}")]
    Nonce(#[from] NonceError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("tls: {0}")]
    Tls(#[from] TlsError),

    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    telemetry::init(LogFormat::from_env());

    if let Err(e) = run().await {
        error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = ServerConfig::from_env()?;

    let db_path = config.data_dir.join(DB_FILE_NAME);
    let db = Arc::new(CasinoDb::open(&db_path)?);
    info!(path = %db_path.display(), "Database opened");

    ChainRepository::new(&db).upsert(&StoredChain {
        id: config.chain_id,
        name: config.chain_name.clone(),
        rpc_url: config.chain_rpc_url.clone(),
        casino_address: config.casino_address.clone(),
        active: true,
    })?;

    let nonces = match config.redis_url.as_deref() {
        Some(url) => NonceStore::redis(url).await?,
        None => NonceStore::memory(),
    };
    info!(backend = nonces.backend_name(), "Nonce store ready");

    let mut state = AppState::new(Arc::clone(&db), nonces, config.chain_id)
        .with_leaderboard_size(config.leaderboard_size);

    match config.jwt_secret.as_deref() {
        Some(secret) => {
            state = state.with_jwt(Arc::new(JwtManager::new(
                secret.as_bytes(),
                config.jwt_expiry_secs,
            )));
        }
        None => warn!("JWT_SECRET not set; wallet sign-in is disabled"),
    }
    match config.admin_api_key.as_deref().and_then(AdminKeyVerifier::new) {
        Some(verifier) => state = state.with_admin(Arc::new(verifier)),
        None => warn!("ADMIN_API_KEY not set; admin endpoints are disabled"),
    }

    let shutdown = CancellationToken::new();
    let refresher = LeaderboardRefresher::new(
        Arc::clone(&db),
        Arc::clone(&state.live_leaderboards),
        active_chain_ids(&db, config.chain_id)?,
        config.leaderboard_size,
    )
    .with_interval(config.leaderboard_refresh);
    let refresher_task = tokio::spawn(refresher.run(shutdown.clone()));

    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone(), shutdown.clone()));

    let app = router(state);
    let addr = config.bind_addr;
    match config.tls.as_ref() {
        Some(paths) => {
            let tls_config = tls::load(paths).await?;
            info!(%addr, "Vyre casino API listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!(%addr, "Vyre casino API listening on http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    shutdown.cancel();
    if let Err(e) = refresher_task.await {
        warn!(error = %e, "Leaderboard refresher task ended abnormally");
    }
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_on_signal(handle: Handle<std::net::SocketAddr>, shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Shutdown signal received (Ctrl+C)"),
        _ = terminate => info!("Shutdown signal received (SIGTERM)"),
    }

    shutdown.cancel();
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
