// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, default values, and the [`AppConfig`] loaded
//! from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address (IPv4 or IPv6 literal) | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `PUBLIC_KEYS_PATH` | JWKS document or PEM public key used to verify tokens | One of path/URL required |
//! | `PUBLIC_KEYS_URL` | JWKS endpoint fetched once at startup | One of path/URL required |
//! | `SIGNING_KEY_PATH` | RSA private key (PEM) used to refresh tokens | Required |
//! | `TOKEN_TTL_SECS` | Lifetime of refreshed tokens | `3600` |
//! | `CLOCK_SKEW_LEEWAY_SECS` | Leeway for `exp` / `nbf` / `iat` checks | `0` |
//! | `TLS_CERT_PATH` | PEM certificate chain; enables HTTPS together with `TLS_KEY_PATH` | Optional |
//! | `TLS_KEY_PATH` | PEM private key for the certificate | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Path to a JWKS JSON document or a PEM encoded RSA public key.
///
/// Mutually exclusive with [`PUBLIC_KEYS_URL_ENV`].
pub const PUBLIC_KEYS_PATH_ENV: &str = "PUBLIC_KEYS_PATH";

/// JWKS endpoint. The key set is fetched once before the server starts
/// accepting connections and is not refreshed afterwards.
pub const PUBLIC_KEYS_URL_ENV: &str = "PUBLIC_KEYS_URL";

/// RSA private key used to re-sign tokens on every successful request.
pub const SIGNING_KEY_PATH_ENV: &str = "SIGNING_KEY_PATH";

pub const TOKEN_TTL_SECS_ENV: &str = "TOKEN_TTL_SECS";
pub const CLOCK_SKEW_LEEWAY_SECS_ENV: &str = "CLOCK_SKEW_LEEWAY_SECS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("set exactly one of PUBLIC_KEYS_PATH or PUBLIC_KEYS_URL")]
    KeySource,
    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    PartialTls,
}

/// Where verification keys come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Path(PathBuf),
    Url(url::Url),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("expected `json` or `pretty`, got `{other}`")),
        }
    }
}

impl LogFormat {
    /// `LOG_FORMAT` from the environment, read before the rest of the
    /// configuration so startup errors are logged in the requested format.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Unset or unrecognised values fall back to the default. The strict
    /// check happens in [`AppConfig::from_lookup`].
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(LOG_FORMAT_ENV)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }
}

/// Server configuration assembled from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub key_source: KeySource,
    pub signing_key_path: PathBuf,
    pub token_ttl: Duration,
    pub leeway_secs: u64,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&get, PORT_ENV, DEFAULT_PORT)?;
        let ip: IpAddr = host
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: HOST_ENV,
                value: host.clone(),
                reason: e.to_string(),
            })?;
        let bind_addr = SocketAddr::new(ip, port);

        let key_source = match (get(PUBLIC_KEYS_PATH_ENV), get(PUBLIC_KEYS_URL_ENV)) {
            (Some(path), None) => KeySource::Path(PathBuf::from(path)),
            (None, Some(raw)) => {
                let url = url::Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                    name: PUBLIC_KEYS_URL_ENV,
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                KeySource::Url(url)
            }
            _ => return Err(ConfigError::KeySource),
        };

        let signing_key_path = get(SIGNING_KEY_PATH_ENV)
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing(SIGNING_KEY_PATH_ENV))?;

        let ttl_secs: u64 = parse_or(&get, TOKEN_TTL_SECS_ENV, DEFAULT_TOKEN_TTL_SECS)?;
        if ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                name: TOKEN_TTL_SECS_ENV,
                value: ttl_secs.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let leeway_secs = parse_or(&get, CLOCK_SKEW_LEEWAY_SECS_ENV, 0)?;

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };

        let log_format = parse_or(&get, LOG_FORMAT_ENV, LogFormat::default())?;

        Ok(Self {
            bind_addr,
            key_source,
            signing_key_path,
            token_ttl: Duration::from_secs(ttl_secs),
            leeway_secs,
            tls,
            log_format,
        })
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                name,
                value,
                reason: e.to_string(),
            })
        }
    }
}
