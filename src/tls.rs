// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! Optional HTTPS termination.

use axum_server::tls_rustls::RustlsConfig;
use tracing::info;

use crate::config::TlsPaths;

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("failed to install rustls crypto provider")]
    Provider,

    #[error("failed to load TLS certificate or key: {0}")]
    Load(#[from] std::io::Error),
}

/// Install the ring provider for rustls. Must run before any TLS set-up.
pub fn install_crypto_provider() -> Result<(), TlsError> {
    if rustls::crypto::CryptoProvider::get_default().is_some() {
        return Ok(());
    }
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| TlsError::Provider)
}

/// Load the PEM certificate chain and key into a server config.
pub async fn load(paths: &TlsPaths) -> Result<RustlsConfig, TlsError> {
    install_crypto_provider()?;
    let config = RustlsConfig::from_pem_file(&paths.cert, &paths.key).await?;
    info!(cert = %paths.cert.display(), "Loaded TLS certificate");
    Ok(config)
}
