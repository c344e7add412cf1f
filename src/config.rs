// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! All settings are read from the environment once at startup and validated
//! into typed structs. Request handlers never look up configuration by name.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding `tokens.redb` | `./data` |
//! | `JWT_SECRET` | HS256 secret for session JWTs (≥ 32 bytes) | Required |
//! | `JWT_ISSUER` | Expected JWT issuer claim | Optional |
//! | `JWT_AUDIENCE` | Expected JWT audience claim | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `PURGE_INTERVAL_SECS` | Expired-token sweep interval, `0` disables | `0` |
//! | `SEED_PRINCIPALS` | Comma-separated user IDs registered at startup | Optional |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; both set enables HTTPS | Optional |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::AuthConfig;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWT_AUDIENCE_ENV: &str = "JWT_AUDIENCE";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const PURGE_INTERVAL_ENV: &str = "PURGE_INTERVAL_SECS";
pub const SEED_PRINCIPALS_ENV: &str = "SEED_PRINCIPALS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

/// Shortest accepted HS256 secret, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("JWT_SECRET must be at least 32 bytes")]
    WeakJwtSecret,

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// PEM certificate and key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Validated server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub auth: AuthConfig,
    pub log_format: LogFormat,
    /// `None` disables the expired-token sweeper.
    pub purge_interval: Option<Duration>,
    pub seed_principals: Vec<String>,
    pub tls: Option<TlsPaths>,
}

impl ServerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(v) => v.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                value: v.clone(),
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|_| ConfigError::Invalid {
                    name: HOST_ENV,
                    value: host.clone(),
                })?;

        let data_dir =
            PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));

        let secret = get(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;
        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::WeakJwtSecret);
        }
        let mut auth = AuthConfig::hs256(secret.as_bytes());
        if let Some(issuer) = get(JWT_ISSUER_ENV) {
            auth = auth.with_issuer(issuer);
        }
        if let Some(audience) = get(JWT_AUDIENCE_ENV) {
            auth = auth.with_audience(audience);
        }

        let log_format = match get(LOG_FORMAT_ENV).map(|v| v.to_lowercase()).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    value: other.to_string(),
                })
            }
        };

        let purge_interval = match get(PURGE_INTERVAL_ENV) {
            Some(v) => {
                let secs = v.parse::<u64>().map_err(|_| ConfigError::Invalid {
                    name: PURGE_INTERVAL_ENV,
                    value: v.clone(),
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        let seed_principals = get(SEED_PRINCIPALS_ENV)
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        Ok(Self {
            bind_addr,
            data_dir,
            auth,
            log_format,
            purge_interval,
            seed_principals,
            tls,
        })
    }

    /// Path of the token database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(crate::storage::DATABASE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_with_only_secret() {
        let config = load(&[(JWT_SECRET_ENV, SECRET)]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.database_path(), PathBuf::from("./data/tokens.redb"));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.purge_interval, None);
        assert!(config.seed_principals.is_empty());
        assert!(config.tls.is_none());
        assert!(config.auth.issuer.is_none());
    }

    #[test]
    fn secret_is_required_and_must_be_long_enough() {
        assert_eq!(load(&[]).err(), Some(ConfigError::Missing(JWT_SECRET_ENV)));
        assert_eq!(
            load(&[(JWT_SECRET_ENV, "short")]).err(),
            Some(ConfigError::WeakJwtSecret)
        );
    }

    #[test]
    fn parses_all_settings() {
        let config = load(&[
            (JWT_SECRET_ENV, SECRET),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9000"),
            (DATA_DIR_ENV, "/var/lib/tokens"),
            (JWT_ISSUER_ENV, "https://auth.example.com"),
            (JWT_AUDIENCE_ENV, "token-api"),
            (LOG_FORMAT_ENV, "JSON"),
            (PURGE_INTERVAL_ENV, "600"),
            (SEED_PRINCIPALS_ENV, "u1, u2,,u3"),
            (TLS_CERT_PATH_ENV, "/certs/cert.pem"),
            (TLS_KEY_PATH_ENV, "/certs/key.pem"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/tokens"));
        assert_eq!(config.auth.issuer.as_deref(), Some("https://auth.example.com"));
        assert_eq!(config.auth.audience.as_deref(), Some("token-api"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.purge_interval, Some(Duration::from_secs(600)));
        assert_eq!(config.seed_principals, vec!["u1", "u2", "u3"]);
        assert_eq!(
            config.tls,
            Some(TlsPaths {
                cert: PathBuf::from("/certs/cert.pem"),
                key: PathBuf::from("/certs/key.pem"),
            })
        );
    }

    #[test]
    fn zero_purge_interval_disables_sweeper() {
        let config = load(&[(JWT_SECRET_ENV, SECRET), (PURGE_INTERVAL_ENV, "0")]).unwrap();
        assert_eq!(config.purge_interval, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, SECRET), (PORT_ENV, "http")]),
            Err(ConfigError::Invalid { name: PORT_ENV, .. })
        ));
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, SECRET), (LOG_FORMAT_ENV, "xml")]),
            Err(ConfigError::Invalid { name: LOG_FORMAT_ENV, .. })
        ));
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, SECRET), (HOST_ENV, "not a host")]),
            Err(ConfigError::Invalid { name: HOST_ENV, .. })
        ));
        assert_eq!(
            load(&[(JWT_SECRET_ENV, SECRET), (TLS_CERT_PATH_ENV, "/c.pem")]).err(),
            Some(ConfigError::IncompleteTls)
        );
    }
}
