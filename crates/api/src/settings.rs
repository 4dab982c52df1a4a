//! Server Settings
//!
//! Layered configuration for the server binary. Values come from an
//! optional `sightline.toml` next to the binary, overridden by
//! `SIGHTLINE__*` environment variables (double underscore separates
//! nesting levels, e.g. `SIGHTLINE__RATE_LIMIT__BURST_SIZE=50`).

use crate::rate_limit::RateLimitConfig;
use config::{Config, ConfigError, Environment, File};
use pipeline::PipelineConfig;
use serde::Deserialize;

/// Top-level server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Socket address the server listens on
    pub bind_addr: String,
    /// Rate limiting for the standard endpoint tier
    pub rate_limit: RateLimitConfig,
    /// Analysis pipeline tuning
    pub pipeline: PipelineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            rate_limit: RateLimitConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from file and environment, falling back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("sightline").required(false))
            .add_source(Environment::with_prefix("SIGHTLINE").separator("__"))
            .build()?
            .try_deserialize()
    }
}
