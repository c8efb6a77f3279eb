//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment
//! variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL for entries without explicit TTL, zero = never expires
    pub default_ttl: Duration,
    /// Background sweep interval, None = no background sweeping
    pub sweep_interval: Option<Duration>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds, 0 = never (default: 300000)
    /// - `SWEEP_INTERVAL_MS` - Sweep frequency in milliseconds, 0 = off (default: 1000)
    ///
    /// Unset variables fall back to their default. Set variables that are not
    /// integers, or are negative, are rejected.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Same as [`CacheConfig::from_env`] with a custom variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_entries = match parse_var(&lookup, "MAX_ENTRIES")? {
            Some(n) => usize::try_from(n).map_err(|_| {
                CacheError::InvalidConfig(format!("MAX_ENTRIES is too large: {}", n))
            })?,
            None => defaults.max_entries,
        };
        let default_ttl = parse_var(&lookup, "DEFAULT_TTL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.default_ttl);
        let sweep_interval = match parse_var(&lookup, "SWEEP_INTERVAL_MS")? {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => defaults.sweep_interval,
        };

        Ok(Self {
            max_entries,
            default_ttl,
            sweep_interval,
        })
    }
}

/// Reads an unsigned integer variable, failing fast on anything else.
fn parse_var<F>(lookup: &F, name: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let trimmed = raw.trim();

    match trimmed.parse::<i128>() {
        Ok(n) if n < 0 => Err(CacheError::InvalidConfig(format!(
            "{} must not be negative, got {}",
            name, trimmed
        ))),
        Ok(n) => u64::try_from(n).map(Some).map_err(|_| {
            CacheError::InvalidConfig(format!("{} is out of range: {}", name, trimmed))
        }),
        Err(_) => Err(CacheError::InvalidConfig(format!(
            "{} must be an integer, got {:?}",
            name, raw
        ))),
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: Duration::from_secs(300),
            sweep_interval: Some(Duration::from_secs(1)),
        }
    }
}
