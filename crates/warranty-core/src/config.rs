//! Resolver configuration
//!
//! Loaded from TOML or built in code with the `with_*` builders.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Maximum upgrade options shown to the customer
pub const UPGRADE_OPTIONS_LIMIT: usize = 10;

/// Default deadline for a single collaborator call
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Upgrade options kept after the stock filter
    pub upgrade_options_limit: usize,
    /// Deadline per collaborator call; `None` waits indefinitely
    pub fetch_timeout_ms: Option<u64>,
    /// Per-id fallback lookups in flight at once
    pub fallback_concurrency: usize,
    /// Fee added to an in-stock replacement that differs from the claimed product
    pub upgrade_fee: f64,
    /// Currency symbol for price labels
    pub currency_symbol: String,
}

impl ResolverConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With upgrade option limit
    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.upgrade_options_limit = limit;
        self
    }

    /// With per-call timeout
    #[inline]
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout_ms =
            timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// With fallback concurrency
    #[inline]
    #[must_use]
    pub fn with_fallback_concurrency(mut self, concurrency: usize) -> Self {
        self.fallback_concurrency = concurrency;
        self
    }

    /// With upgrade fee
    #[inline]
    #[must_use]
    pub fn with_upgrade_fee(mut self, fee: f64) -> Self {
        self.upgrade_fee = fee;
        self
    }

    /// Per-call timeout as a duration
    #[inline]
    #[must_use]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    /// Check values are in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upgrade_options_limit == 0 {
            return Err(ConfigError::Invalid(
                "upgrade_options_limit must be at least 1".to_string(),
            ));
        }
        if self.fallback_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "fallback_concurrency must be at least 1".to_string(),
            ));
        }
        if self.fetch_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "fetch_timeout_ms must be positive".to_string(),
            ));
        }
        if !self.upgrade_fee.is_finite() || self.upgrade_fee < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "upgrade_fee must be a non-negative amount, got {}",
                self.upgrade_fee
            )));
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            upgrade_options_limit: UPGRADE_OPTIONS_LIMIT,
            fetch_timeout_ms: Some(DEFAULT_FETCH_TIMEOUT_MS),
            fallback_concurrency: 8,
            upgrade_fee: 0.0,
            currency_symbol: "$".to_string(),
        }
    }
}
