//! Configuration for the hypermedia writer.
//!
//! Values are layered with `figment`:
//! 1) built-in defaults -> 2) YAML file (if provided) -> 3) env (`HYPERMEDIA__*`)
//!
//! Nested keys in the environment are separated by `__`, e.g.
//! `HYPERMEDIA__PAGING__MAX_ITEMS_PER_PAGE=50`.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::problem::APPLICATION_PROBLEM_JSON;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "HYPERMEDIA__";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config file does not exist: {0}")]
    FileNotFound(String),
    #[error("invalid hypermedia config: {0}")]
    Invalid(#[from] Box<figment::Error>),
    #[error("invalid hypermedia config: {0}")]
    Validation(String),
}

/// Path-prefix rewrite applied to relative URIs before they are made absolute.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RewriteRule {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PagingConfig {
    /// `per_page` used when the request does not carry one (default: 30)
    pub default_items_per_page: u32,
    /// Upper bound for a requested `per_page` (default: 100)
    pub max_items_per_page: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_items_per_page: 30,
            max_items_per_page: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HypermediaConfig {
    /// First path segment of item and collection URIs (default: `p`)
    pub resource_prefix: String,
    /// First path segment of binary field URIs (default: `b`)
    pub binary_prefix: String,
    /// Longest embedded path the writer will recurse into (default: 8)
    pub max_embed_depth: usize,
    /// Format used for error documents when negotiation fails
    pub default_error_media_type: String,
    pub paging: PagingConfig,
    /// Ordered prefix rewrites; the first matching rule wins
    pub rewrites: Vec<RewriteRule>,
}

impl Default for HypermediaConfig {
    fn default() -> Self {
        Self {
            resource_prefix: "p".to_owned(),
            binary_prefix: "b".to_owned(),
            max_embed_depth: 8,
            default_error_media_type: APPLICATION_PROBLEM_JSON.to_owned(),
            paging: PagingConfig::default(),
            rewrites: Vec::new(),
        }
    }
}

impl HypermediaConfig {
    /// Load configuration from defaults, an optional YAML file and the environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file does not exist, a value cannot be
    /// deserialized, or the resulting configuration is inconsistent.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(&figment)
    }

    /// Extract and validate configuration from a prepared figment.
    ///
    /// # Errors
    /// Returns `ConfigError` if extraction or validation fails.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `ConfigError::Validation` describing the first inconsistent value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_embed_depth == 0 {
            return Err(ConfigError::Validation(
                "max_embed_depth must be at least 1".to_owned(),
            ));
        }
        if self.paging.default_items_per_page == 0 {
            return Err(ConfigError::Validation(
                "paging.default_items_per_page must be at least 1".to_owned(),
            ));
        }
        if self.paging.default_items_per_page > self.paging.max_items_per_page {
            return Err(ConfigError::Validation(format!(
                "paging.default_items_per_page ({}) exceeds paging.max_items_per_page ({})",
                self.paging.default_items_per_page, self.paging.max_items_per_page
            )));
        }
        if self.resource_prefix.trim_matches('/').is_empty() {
            return Err(ConfigError::Validation(
                "resource_prefix must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}
