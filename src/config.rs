// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. Unset
//! variables take their defaults; set but unparsable ones are an error.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the credential vault | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `RPC_URL` | JSON-RPC endpoint | BSC testnet seed node |
//! | `CHAIN_ID` | Chain ID set on signed transactions | `97` |
//! | `NATIVE_SYMBOL` | Native token symbol | `tBNB` |
//! | `CONTRACT_ADDRESS` | Employee clock contract | deployed testnet contract |
//! | `EXPLORER_API_URL` | Etherscan-compatible API | BscScan testnet |
//! | `EXPLORER_API_KEY` | Explorer API key | unset |
//! | `SITE_LATITUDE` | Work site latitude | `-33.931672` |
//! | `SITE_LONGITUDE` | Work site longitude | `151.165399` |
//! | `SITE_MAX_DISTANCE_KM` | Allowed distance from the site | `20` |
//! | `ENFORCE_ALTERNATION` | Refuse double clock-in/out | `false` |
//! | `KDF_MEMORY_KIB` | Argon2id memory cost | `19456` |
//! | `KDF_ITERATIONS` | Argon2id time cost | `2` |
//! | `HTTP_TIMEOUT_SECS` | Explorer request timeout | `15` |
//! | `HISTORY_CACHE_TTL_SECS` | History cache lifetime | `30` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::NetworkConfig;
use crate::credentials::cipher::KdfParams;
use crate::geofence::{
    Position, ReferenceSite, DEFAULT_MAX_DISTANCE_KM, DEFAULT_SITE_LATITUDE,
    DEFAULT_SITE_LONGITUDE,
};
use crate::storage::paths::DATA_ROOT;
use crate::workflow::DispatchPolicy;

pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";
pub const NATIVE_SYMBOL_ENV: &str = "NATIVE_SYMBOL";
pub const CONTRACT_ADDRESS_ENV: &str = "CONTRACT_ADDRESS";
pub const EXPLORER_API_URL_ENV: &str = "EXPLORER_API_URL";
pub const EXPLORER_API_KEY_ENV: &str = "EXPLORER_API_KEY";
pub const SITE_LATITUDE_ENV: &str = "SITE_LATITUDE";
pub const SITE_LONGITUDE_ENV: &str = "SITE_LONGITUDE";
pub const SITE_MAX_DISTANCE_KM_ENV: &str = "SITE_MAX_DISTANCE_KM";
pub const ENFORCE_ALTERNATION_ENV: &str = "ENFORCE_ALTERNATION";
pub const KDF_MEMORY_KIB_ENV: &str = "KDF_MEMORY_KIB";
pub const KDF_ITERATIONS_ENV: &str = "KDF_ITERATIONS";
pub const HTTP_TIMEOUT_SECS_ENV: &str = "HTTP_TIMEOUT_SECS";
pub const HISTORY_CACHE_TTL_SECS_ENV: &str = "HISTORY_CACHE_TTL_SECS";

/// `json` for one JSON object per line, anything else for human-readable output.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_HISTORY_CACHE_TTL_SECS: u64 = 30;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Number of addresses whose history is kept in memory.
pub const HISTORY_CACHE_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the service needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub network: NetworkConfig,
    pub site: ReferenceSite,
    pub policy: DispatchPolicy,
    pub kdf: KdfParams,
    pub http_timeout: Duration,
    pub history_cache_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DATA_ROOT),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            network: NetworkConfig::bsc_testnet(),
            site: ReferenceSite::default(),
            policy: DispatchPolicy::default(),
            kdf: KdfParams::default(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            history_cache_ttl: Duration::from_secs(DEFAULT_HISTORY_CACHE_TTL_SECS),
        }
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = NetworkConfig::bsc_testnet();
        let default_kdf = KdfParams::default();

        let network = NetworkConfig {
            rpc_url: env.string(RPC_URL_ENV, &defaults.rpc_url),
            chain_id: env.parse(CHAIN_ID_ENV, defaults.chain_id)?,
            native_symbol: env.string(NATIVE_SYMBOL_ENV, &defaults.native_symbol),
            contract_address: env.string(CONTRACT_ADDRESS_ENV, &defaults.contract_address),
            explorer_api_url: env.string(EXPLORER_API_URL_ENV, &defaults.explorer_api_url),
            explorer_api_key: env.get(EXPLORER_API_KEY_ENV),
            ..defaults
        };

        let latitude = env.parse(SITE_LATITUDE_ENV, DEFAULT_SITE_LATITUDE)?;
        let longitude = env.parse(SITE_LONGITUDE_ENV, DEFAULT_SITE_LONGITUDE)?;
        let position = Position::checked(latitude, longitude).map_err(|e| ConfigError::Invalid {
            name: "SITE_LATITUDE/SITE_LONGITUDE",
            value: format!("{latitude}, {longitude}"),
            reason: e.to_string(),
        })?;
        let max_distance_km = env.parse(SITE_MAX_DISTANCE_KM_ENV, DEFAULT_MAX_DISTANCE_KM)?;
        if !max_distance_km.is_finite() || max_distance_km < 0.0 {
            return Err(ConfigError::Invalid {
                name: SITE_MAX_DISTANCE_KM_ENV,
                value: max_distance_km.to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }

        let kdf = KdfParams {
            m_cost_kib: env.parse(KDF_MEMORY_KIB_ENV, default_kdf.m_cost_kib)?,
            t_cost: env.parse(KDF_ITERATIONS_ENV, default_kdf.t_cost)?,
            ..default_kdf
        };
        kdf.validate().map_err(|e| ConfigError::Invalid {
            name: "KDF_MEMORY_KIB/KDF_ITERATIONS",
            value: format!("{}, {}", kdf.m_cost_kib, kdf.t_cost),
            reason: e.to_string(),
        })?;

        let http_timeout_secs: u64 = env.parse(HTTP_TIMEOUT_SECS_ENV, DEFAULT_HTTP_TIMEOUT_SECS)?;
        if http_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: HTTP_TIMEOUT_SECS_ENV,
                value: http_timeout_secs.to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            data_dir: PathBuf::from(env.string(DATA_DIR_ENV, DATA_ROOT)),
            host: env.string(HOST_ENV, DEFAULT_HOST),
            port: env.parse(PORT_ENV, DEFAULT_PORT)?,
            network,
            site: ReferenceSite::new(position, max_distance_km),
            policy: DispatchPolicy {
                enforce_alternation: env.flag(ENFORCE_ALTERNATION_ENV)?,
            },
            kdf,
            http_timeout: Duration::from_secs(http_timeout_secs),
            history_cache_ttl: Duration::from_secs(
                env.parse(HISTORY_CACHE_TTL_SECS_ENV, DEFAULT_HISTORY_CACHE_TTL_SECS)?,
            ),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Set and non-blank value of `name`.
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn flag(&self, name: &'static str) -> Result<bool, ConfigError> {
        match self.get(name).map(|v| v.to_ascii_lowercase()) {
            None => Ok(false),
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
            Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
            Some(v) => Err(ConfigError::Invalid {
                name,
                value: v,
                reason: "expected true or false".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.network.chain_id, 97);
        assert_eq!(config.site, ReferenceSite::default());
        assert!(!config.policy.enforce_alternation);
        assert_eq!(config.kdf, KdfParams::default());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("PORT", "9000"),
            ("DATA_DIR", "/tmp/geoclock"),
            ("SITE_LATITUDE", "51.5"),
            ("SITE_LONGITUDE", "-0.12"),
            ("SITE_MAX_DISTANCE_KM", "0.5"),
            ("ENFORCE_ALTERNATION", "true"),
            ("EXPLORER_API_KEY", "abc"),
            ("KDF_MEMORY_KIB", "65536"),
            ("HISTORY_CACHE_TTL_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/geoclock"));
        assert_eq!(config.site.position, Position::new(51.5, -0.12));
        assert_eq!(config.site.max_distance_km, 0.5);
        assert!(config.policy.enforce_alternation);
        assert_eq!(config.network.explorer_api_key.as_deref(), Some("abc"));
        assert_eq!(config.kdf.m_cost_kib, 65536);
        assert_eq!(config.history_cache_ttl, Duration::from_secs(5));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[("PORT", "  "), ("EXPLORER_API_KEY", "")]).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.network.explorer_api_key.is_none());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(load(&[("PORT", "eighty")]).is_err());
        assert!(load(&[("SITE_LATITUDE", "95")]).is_err());
        assert!(load(&[("SITE_MAX_DISTANCE_KM", "-1")]).is_err());
        assert!(load(&[("ENFORCE_ALTERNATION", "maybe")]).is_err());
    }

    #[test]
    fn unusable_kdf_costs_are_rejected() {
        let err = load(&[("KDF_ITERATIONS", "0")]).unwrap_err();
        assert!(err.to_string().contains("KDF_MEMORY_KIB/KDF_ITERATIONS"));
        assert!(load(&[("KDF_MEMORY_KIB", "1")]).is_err());
        assert!(load(&[("KDF_ITERATIONS", "3"), ("KDF_MEMORY_KIB", "4096")]).is_ok());
    }

    #[test]
    fn zero_http_timeout_is_rejected() {
        let err = load(&[("HTTP_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name, .. } if name == HTTP_TIMEOUT_SECS_ENV));
        let config = load(&[("HTTP_TIMEOUT_SECS", "3")]).unwrap();
        assert_eq!(config.http_timeout, Duration::from_secs(3));
    }
}
