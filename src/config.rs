// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `CHAIN_RPC_URL` | EVM JSON-RPC endpoint | Required |
//! | `CHAIN_NAME` | Network display name | `EVM` |
//! | `EXPLORER_URL` | Block explorer base URL for transaction links | Optional |
//! | `COINMARKETCAP_API_KEY` | Price oracle API key | Required |
//! | `COINMARKETCAP_BASE_URL` | Price oracle base URL | `https://pro-api.coinmarketcap.com` |
//! | `ASSET_CATALOG_PATH` | JSON asset catalog | Built-in catalog |
//! | `REFERENCE_SYMBOL` | Reference asset for portfolio totals | Catalog value |
//! | `SWAP_ROUTER_ADDRESS` | UniswapV2-style router | Optional (swaps disabled) |
//! | `SWAP_DEADLINE_SECS` | Default swap deadline horizon | `900` |
//! | `SIGNER_KEYS_DIR` | Directory of `<address>.pem` credentials | Optional (execute disabled) |
//! | `RPC_CALL_TIMEOUT_SECS` | Deadline for each outbound call | `15` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use alloy::primitives::Address;

use crate::blockchain::NetworkConfig;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const CHAIN_RPC_URL_ENV: &str = "CHAIN_RPC_URL";
pub const CHAIN_NAME_ENV: &str = "CHAIN_NAME";
pub const EXPLORER_URL_ENV: &str = "EXPLORER_URL";
pub const COINMARKETCAP_API_KEY_ENV: &str = "COINMARKETCAP_API_KEY";
pub const COINMARKETCAP_BASE_URL_ENV: &str = "COINMARKETCAP_BASE_URL";
pub const ASSET_CATALOG_PATH_ENV: &str = "ASSET_CATALOG_PATH";
pub const REFERENCE_SYMBOL_ENV: &str = "REFERENCE_SYMBOL";
pub const SWAP_ROUTER_ADDRESS_ENV: &str = "SWAP_ROUTER_ADDRESS";
pub const SWAP_DEADLINE_SECS_ENV: &str = "SWAP_DEADLINE_SECS";
pub const SIGNER_KEYS_DIR_ENV: &str = "SIGNER_KEYS_DIR";
pub const RPC_CALL_TIMEOUT_SECS_ENV: &str = "RPC_CALL_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CHAIN_NAME: &str = "EVM";
pub const DEFAULT_COINMARKETCAP_BASE_URL: &str = "https://pro-api.coinmarketcap.com";
pub const DEFAULT_SWAP_DEADLINE_SECS: u64 = 15 * 60;
pub const DEFAULT_RPC_CALL_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Price oracle settings.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub network: NetworkConfig,
    pub oracle: OracleConfig,
    pub catalog_path: Option<PathBuf>,
    pub reference_symbol: Option<String>,
    pub swap_router: Option<Address>,
    pub swap_deadline: Duration,
    pub signer_keys_dir: Option<PathBuf>,
    pub call_timeout: Duration,
    pub log_format: LogFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env.or_default(HOST_ENV, DEFAULT_HOST);
        let port = env.parsed(PORT_ENV, DEFAULT_PORT)?;
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    name: HOST_ENV.to_string(),
                    reason: e.to_string(),
                })?;

        let network = NetworkConfig {
            name: env.or_default(CHAIN_NAME_ENV, DEFAULT_CHAIN_NAME),
            rpc_url: env.required(CHAIN_RPC_URL_ENV)?,
            explorer_url: env.optional(EXPLORER_URL_ENV),
        };

        let oracle = OracleConfig {
            base_url: env.or_default(COINMARKETCAP_BASE_URL_ENV, DEFAULT_COINMARKETCAP_BASE_URL),
            api_key: env.required(COINMARKETCAP_API_KEY_ENV)?,
        };

        let swap_router = env
            .optional(SWAP_ROUTER_ADDRESS_ENV)
            .map(|raw| {
                raw.parse::<Address>().map_err(|e| ConfigError::Invalid {
                    name: SWAP_ROUTER_ADDRESS_ENV.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let swap_deadline_secs = env.parsed(SWAP_DEADLINE_SECS_ENV, DEFAULT_SWAP_DEADLINE_SECS)?;
        let call_timeout_secs =
            env.parsed(RPC_CALL_TIMEOUT_SECS_ENV, DEFAULT_RPC_CALL_TIMEOUT_SECS)?;
        if swap_deadline_secs == 0 || call_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: if swap_deadline_secs == 0 {
                    SWAP_DEADLINE_SECS_ENV
                } else {
                    RPC_CALL_TIMEOUT_SECS_ENV
                }
                .to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            bind_addr,
            network,
            oracle,
            catalog_path: env.optional(ASSET_CATALOG_PATH_ENV).map(PathBuf::from),
            reference_symbol: env.optional(REFERENCE_SYMBOL_ENV),
            swap_router,
            swap_deadline: Duration::from_secs(swap_deadline_secs),
            signer_keys_dir: env.optional(SIGNER_KEYS_DIR_ENV).map(PathBuf::from),
            call_timeout: Duration::from_secs(call_timeout_secs),
            log_format: LogFormat::parse(env.optional(LOG_FORMAT_ENV).as_deref()),
        })
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &str) -> Result<String, ConfigError> {
        self.optional(name)
            .ok_or_else(|| ConfigError::Missing(name.to_string()))
    }

    fn or_default(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                name: name.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        (CHAIN_RPC_URL_ENV, "https://bsc-dataseed.binance.org"),
        (COINMARKETCAP_API_KEY_ENV, "test-key"),
    ];

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(MINIMAL).unwrap();
        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.network.name, DEFAULT_CHAIN_NAME);
        assert_eq!(config.oracle.base_url, DEFAULT_COINMARKETCAP_BASE_URL);
        assert_eq!(config.swap_deadline, Duration::from_secs(900));
        assert_eq!(config.call_timeout, Duration::from_secs(15));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.swap_router.is_none());
        assert!(config.signer_keys_dir.is_none());
    }

    #[test]
    fn missing_rpc_url_is_reported() {
        let err = load(&[(COINMARKETCAP_API_KEY_ENV, "k")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(name) if name == CHAIN_RPC_URL_ENV));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let mut vars = MINIMAL.to_vec();
        vars.push((EXPLORER_URL_ENV, "   "));
        vars.push((PORT_ENV, ""));
        let config = load(&vars).unwrap();
        assert!(config.network.explorer_url.is_none());
        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
    }

    #[test]
    fn invalid_router_address_is_rejected() {
        let mut vars = MINIMAL.to_vec();
        vars.push((SWAP_ROUTER_ADDRESS_ENV, "0x1234"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name, .. } if name == SWAP_ROUTER_ADDRESS_ENV));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut vars = MINIMAL.to_vec();
        vars.push((RPC_CALL_TIMEOUT_SECS_ENV, "0"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let mut vars = MINIMAL.to_vec();
        vars.extend_from_slice(&[
            (PORT_ENV, "9090"),
            (LOG_FORMAT_ENV, "JSON"),
            (SWAP_DEADLINE_SECS_ENV, "60"),
            (SWAP_ROUTER_ADDRESS_ENV, "0x10ED43C718714eb63d5aA57B78B54704E256024E"),
        ]);
        let config = load(&vars).unwrap();
        assert_eq!(config.bind_addr.port(), 9090);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.swap_deadline, Duration::from_secs(60));
        assert!(config.swap_router.is_some());
    }
}
