//! Runtime configuration for core services.
//!
//! # Responsibility
//! - Provide defaults suitable for the public catalog.
//! - Overlay `POKECAPTURE_*` environment variables for local runs.
//!
//! # Invariants
//! - A config that passed `validate()` always builds an `HttpCatalogSource`.
//! - `lookup_concurrency` is at least 1.

use reqwest::Url;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CATALOG_BASE_URL: &str = "https://pokeapi.co/api/v2/";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_LOOKUP_CONCURRENCY: usize = 4;

const ENV_CATALOG_BASE_URL: &str = "POKECAPTURE_CATALOG_URL";
const ENV_IDENTITY_ENDPOINT: &str = "POKECAPTURE_IDENTITY_ENDPOINT";
const ENV_IDENTITY_API_KEY: &str = "POKECAPTURE_IDENTITY_API_KEY";
const ENV_REQUEST_TIMEOUT_SECS: &str = "POKECAPTURE_REQUEST_TIMEOUT_SECS";
const ENV_LOOKUP_MODE: &str = "POKECAPTURE_LOOKUP_MODE";
const ENV_LOOKUP_CONCURRENCY: &str = "POKECAPTURE_LOOKUP_CONCURRENCY";
const ENV_STORE_PATH: &str = "POKECAPTURE_DB_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// How the sync service resolves `captured` for a fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupMode {
    /// One `IN` query per page scoped by user.
    #[default]
    Batched,
    /// One query per entity, bounded by `lookup_concurrency`.
    PerEntity,
}

impl FromStr for LookupMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "batched" | "batch" => Ok(Self::Batched),
            "per_entity" | "per-entity" => Ok(Self::PerEntity),
            other => Err(format!("unsupported lookup mode `{other}`; expected batched|per_entity")),
        }
    }
}

/// Core service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub catalog_base_url: String,
    /// Password sign-in endpoint; `None` disables remote sign-in.
    pub identity_endpoint: Option<String>,
    pub identity_api_key: Option<String>,
    pub request_timeout: Duration,
    pub lookup_mode: LookupMode,
    pub lookup_concurrency: usize,
    /// SQLite file for capture records; `None` keeps them in memory.
    pub store_path: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            identity_endpoint: None,
            identity_api_key: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            lookup_mode: LookupMode::default(),
            lookup_concurrency: DEFAULT_LOOKUP_CONCURRENCY,
            store_path: None,
        }
    }
}

impl CoreConfig {
    /// Defaults overlaid with process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`; blank values are ignored.
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = get(ENV_CATALOG_BASE_URL) {
            self.catalog_base_url = value;
        }
        if let Some(value) = get(ENV_IDENTITY_ENDPOINT) {
            self.identity_endpoint = Some(value);
        }
        if let Some(value) = get(ENV_IDENTITY_API_KEY) {
            self.identity_api_key = Some(value);
        }
        if let Some(value) = get(ENV_REQUEST_TIMEOUT_SECS) {
            let secs = value.parse::<u64>().map_err(|err| {
                ConfigError::invalid(ENV_REQUEST_TIMEOUT_SECS, &value, err.to_string())
            })?;
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(value) = get(ENV_LOOKUP_MODE) {
            self.lookup_mode = value
                .parse()
                .map_err(|reason: String| ConfigError::invalid(ENV_LOOKUP_MODE, &value, reason))?;
        }
        if let Some(value) = get(ENV_LOOKUP_CONCURRENCY) {
            self.lookup_concurrency = value.parse::<usize>().map_err(|err| {
                ConfigError::invalid(ENV_LOOKUP_CONCURRENCY, &value, err.to_string())
            })?;
        }
        if let Some(value) = get(ENV_STORE_PATH) {
            self.store_path = Some(PathBuf::from(value));
        }

        self.validate()?;
        Ok(self)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match Url::parse(self.catalog_base_url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(_) => {
                return Err(ConfigError::invalid(
                    ENV_CATALOG_BASE_URL,
                    &self.catalog_base_url,
                    "scheme must be http or https",
                ))
            }
            Err(err) => {
                return Err(ConfigError::invalid(
                    ENV_CATALOG_BASE_URL,
                    &self.catalog_base_url,
                    err.to_string(),
                ))
            }
        }
        if self.lookup_concurrency == 0 {
            return Err(ConfigError::invalid(
                ENV_LOOKUP_CONCURRENCY,
                "0",
                "must be at least 1",
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::invalid(
                ENV_REQUEST_TIMEOUT_SECS,
                "0",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, LookupMode};
    use std::collections::HashMap;
    use std::time::Duration;

    fn overlay(pairs: &[(&str, &str)]) -> Result<CoreConfig, ConfigError> {
        let env = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        CoreConfig::default().overlay(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_are_valid() {
        let config = CoreConfig::default();
        config.validate().unwrap();
        assert_eq!(config.lookup_mode, LookupMode::Batched);
        assert!(config.store_path.is_none());
    }

    #[test]
    fn overlay_applies_values_and_ignores_blanks() {
        let config = overlay(&[
            ("POKECAPTURE_LOOKUP_MODE", "per-entity"),
            ("POKECAPTURE_LOOKUP_CONCURRENCY", "8"),
            ("POKECAPTURE_REQUEST_TIMEOUT_SECS", "3"),
            ("POKECAPTURE_CATALOG_URL", "  "),
        ])
        .unwrap();
        assert_eq!(config.lookup_mode, LookupMode::PerEntity);
        assert_eq!(config.lookup_concurrency, 8);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.catalog_base_url, super::DEFAULT_CATALOG_BASE_URL);
    }

    #[test]
    fn overlay_rejects_invalid_values() {
        assert!(overlay(&[("POKECAPTURE_LOOKUP_CONCURRENCY", "0")]).is_err());
        assert!(overlay(&[("POKECAPTURE_LOOKUP_MODE", "eager")]).is_err());
        assert!(overlay(&[("POKECAPTURE_CATALOG_URL", "ftp://example.com")]).is_err());
    }
}
