// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`SwapConfig`] loaded from
//! them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ONEBALANCE_API_URL` | OneBalance API base URL | `https://be.onebalance.io/api` |
//! | `ONEBALANCE_API_KEY` | API key sent as `x-api-key` | Required |
//! | `SWAP_POLL_INTERVAL_SECS` | Status poll cadence | `3` |
//! | `SWAP_POLL_TIMEOUT_SECS` | Give up tracking after this long | `120` |
//! | `SWAP_QUOTE_DEBOUNCE_MS` | Delay before refetching a quote after input | `300` |
//! | `SWAP_HTTP_TIMEOUT_SECS` | Per-request HTTP timeout | `15` |
//! | `EMBEDDED_WALLET_KEY` | Hex private key of the local embedded wallet | Required by the CLI |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,relational_swap=debug` |

use std::time::Duration;

pub const API_URL_ENV: &str = "ONEBALANCE_API_URL";
pub const API_KEY_ENV: &str = "ONEBALANCE_API_KEY";
pub const POLL_INTERVAL_ENV: &str = "SWAP_POLL_INTERVAL_SECS";
pub const POLL_TIMEOUT_ENV: &str = "SWAP_POLL_TIMEOUT_SECS";
pub const QUOTE_DEBOUNCE_ENV: &str = "SWAP_QUOTE_DEBOUNCE_MS";
pub const HTTP_TIMEOUT_ENV: &str = "SWAP_HTTP_TIMEOUT_SECS";

/// Environment variable holding the embedded wallet key used by the CLI.
///
/// Key custody belongs to the identity provider in production; this exists
/// for local runs against a development key.
pub const WALLET_KEY_ENV: &str = "EMBEDDED_WALLET_KEY";

pub const DEFAULT_API_URL: &str = "https://be.onebalance.io/api";

/// Status poll cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Tracking gives up with `UNKNOWN` after this long without a terminal state.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(120);

pub const DEFAULT_QUOTE_DEBOUNCE: Duration = Duration::from_millis(300);

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Swap session configuration.
#[derive(Debug, Clone)]
pub struct SwapConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub quote_debounce: Duration,
    pub http_timeout: Duration,
}

impl SwapConfig {
    /// Configuration with default timings.
    pub fn new(api_base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            api_key: api_key.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            quote_debounce: DEFAULT_QUOTE_DEBOUNCE,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get(API_KEY_ENV).ok_or(ConfigError::Missing(API_KEY_ENV))?;
        let api_base_url = get(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let mut config = Self::new(api_base_url, api_key);
        if let Some(raw) = get(POLL_INTERVAL_ENV) {
            config.poll_interval = Duration::from_secs(parse_positive(POLL_INTERVAL_ENV, raw)?);
        }
        if let Some(raw) = get(POLL_TIMEOUT_ENV) {
            config.poll_timeout = Duration::from_secs(parse_positive(POLL_TIMEOUT_ENV, raw)?);
        }
        if let Some(raw) = get(QUOTE_DEBOUNCE_ENV) {
            config.quote_debounce = Duration::from_millis(parse_u64(QUOTE_DEBOUNCE_ENV, raw)?);
        }
        if let Some(raw) = get(HTTP_TIMEOUT_ENV) {
            config.http_timeout = Duration::from_secs(parse_positive(HTTP_TIMEOUT_ENV, raw)?);
        }
        Ok(config)
    }
}

fn parse_u64(name: &'static str, raw: String) -> Result<u64, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::Invalid { name, value: raw })
}

fn parse_positive(name: &'static str, raw: String) -> Result<u64, ConfigError> {
    match parse_u64(name, raw.clone())? {
        0 => Err(ConfigError::Invalid { name, value: raw }),
        value => Ok(value),
    }
}
