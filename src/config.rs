// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! # Runtime Configuration
//!
//! Configuration is read once from the environment at start-up into
//! [`ServerConfig`]. Invalid numeric values are start-up errors rather than
//! silent fallbacks.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding `casino.redb` | `./data` |
//! | `CHAIN_ID` | Default chain id | `8453` |
//! | `CHAIN_NAME` | Display name of the default chain | `Base` |
//! | `CHAIN_RPC_URL` | RPC endpoint advertised for the default chain | unset |
//! | `CASINO_CONTRACT_ADDRESS` | Casino contract on the default chain | unset |
//! | `JWT_SECRET` | HS256 signing secret; wallet auth disabled when unset | unset |
//! | `JWT_EXPIRY_SECS` | Session lifetime, at most one year | `604800` (7 days) |
//! | `ADMIN_API_KEY` | Key for admin endpoints; admin disabled when unset | unset |
//! | `REDIS_URL` | Redis nonce store; in-memory when unset | unset |
//! | `LEADERBOARD_REFRESH_SECS` | Snapshot regeneration interval | `300` |
//! | `LEADERBOARD_SIZE` | Entries per snapshot | `100` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; plain HTTP when unset | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable name for the database directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CHAIN_ID: u64 = 8453;
pub const DEFAULT_JWT_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;
/// Longest session lifetime accepted (one year).
pub const MAX_JWT_EXPIRY_SECS: u64 = 365 * 24 * 60 * 60;
pub const DEFAULT_LEADERBOARD_REFRESH_SECS: u64 = 300;
pub const DEFAULT_LEADERBOARD_SIZE: usize = 100;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("invalid bind address {0}")]
    BindAddress(String),

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    PartialTls,
}

/// PEM certificate chain and private key paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub chain_id: u64,
    pub chain_name: String,
    pub chain_rpc_url: Option<String>,
    pub casino_address: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_expiry_secs: u64,
    pub admin_api_key: Option<String>,
    pub redis_url: Option<String>,
    pub leaderboard_refresh: Duration,
    pub leaderboard_size: usize,
    pub tls: Option<TlsPaths>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Unset and blank are treated alike.
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(var("PORT"), "PORT", "port number", DEFAULT_PORT)?;
        let bind_addr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::BindAddress(format!("{host}:{port}")))?;

        let leaderboard_size: usize = parse_or(
            var("LEADERBOARD_SIZE"),
            "LEADERBOARD_SIZE",
            "positive integer",
            DEFAULT_LEADERBOARD_SIZE,
        )?;
        if leaderboard_size == 0 {
            return Err(ConfigError::Invalid {
                name: "LEADERBOARD_SIZE",
                expected: "positive integer",
                value: "0".to_string(),
            });
        }

        let jwt_expiry_secs: u64 = parse_or(
            var("JWT_EXPIRY_SECS"),
            "JWT_EXPIRY_SECS",
            "number of seconds",
            DEFAULT_JWT_EXPIRY_SECS,
        )?;
        if jwt_expiry_secs == 0 || jwt_expiry_secs > MAX_JWT_EXPIRY_SECS {
            return Err(ConfigError::Invalid {
                name: "JWT_EXPIRY_SECS",
                expected: "number of seconds between 1 and 31536000",
                value: jwt_expiry_secs.to_string(),
            });
        }

        let refresh_secs: u64 = parse_or(
            var("LEADERBOARD_REFRESH_SECS"),
            "LEADERBOARD_REFRESH_SECS",
            "number of seconds",
            DEFAULT_LEADERBOARD_REFRESH_SECS,
        )?;

        let tls = match (var("TLS_CERT_PATH"), var("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };

        let chain_name = var("CHAIN_NAME").unwrap_or_else(|| "Base".to_string());

        Ok(Self {
            bind_addr,
            data_dir: var(DATA_DIR_ENV).unwrap_or_else(|| "./data".to_string()).into(),
            chain_id: parse_or(var("CHAIN_ID"), "CHAIN_ID", "chain id", DEFAULT_CHAIN_ID)?,
            chain_name,
            chain_rpc_url: var("CHAIN_RPC_URL"),
            casino_address: var("CASINO_CONTRACT_ADDRESS"),
            jwt_secret: var("JWT_SECRET"),
            jwt_expiry_secs,
            admin_api_key: var("ADMIN_API_KEY"),
            redis_url: var("REDIS_URL"),
            leaderboard_refresh: Duration::from_secs(refresh_secs.max(1)),
            leaderboard_size,
            tls,
        })
    }
}

fn parse_or<T: FromStr>(
    raw: Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}
