//! Configuration loaded from environment variables with defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::utils::RetryConfig;

pub const ENV_RETRY_MAX_ATTEMPTS: &str = "ADMISSION_RETRY_MAX_ATTEMPTS";
pub const ENV_RETRY_INITIAL_DELAY_MS: &str = "ADMISSION_RETRY_INITIAL_DELAY_MS";
pub const ENV_RETRY_MAX_DELAY_MS: &str = "ADMISSION_RETRY_MAX_DELAY_MS";
pub const ENV_LOG_FILTER: &str = "ADMISSION_LOG_FILTER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Attempts per command when appends lose a concurrency race
    pub retry_max_attempts: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            retry_max_attempts: 5,
            retry_initial_delay_ms: 10,
            retry_max_delay_ms: 500,
            log_filter: "info,club_admission=debug".to_string(),
        }
    }
}

impl AdmissionConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            retry_max_attempts: parse_or(&lookup, ENV_RETRY_MAX_ATTEMPTS, defaults.retry_max_attempts)?,
            retry_initial_delay_ms: parse_or(&lookup, ENV_RETRY_INITIAL_DELAY_MS, defaults.retry_initial_delay_ms)?,
            retry_max_delay_ms: parse_or(&lookup, ENV_RETRY_MAX_DELAY_MS, defaults.retry_max_delay_ms)?,
            log_filter: lookup(ENV_LOG_FILTER).unwrap_or(defaults.log_filter),
        };

        if config.retry_max_attempts == 0 {
            anyhow::bail!("{ENV_RETRY_MAX_ATTEMPTS} must be at least 1");
        }
        Ok(config)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry_max_attempts,
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            ..RetryConfig::default()
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
