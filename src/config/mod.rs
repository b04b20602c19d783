mod file_config;

pub use file_config::{CacheConfig, FileConfig, RetryConfig, TranslationConfig};

use crate::gateway::DuplicatePolicy;
use anyhow::{bail, Result};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "http://www.ensembl.org";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub host: String,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            max_retries: 3,
            retry_delay_secs: 2,
            request_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub request_timeout: Duration,
    pub gateway: GatewaySettings,
}

/// Settings consumed by the gateway caches and retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    pub host: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub connection_cache_capacity: usize,
    pub translation_cache_capacity: usize,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            connection_cache_capacity: 10,
            translation_cache_capacity: 1000,
            duplicate_policy: DuplicatePolicy::LastWins,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let defaults = GatewaySettings::default();

        let host = file
            .host
            .unwrap_or_else(|| cli.host.clone())
            .trim_end_matches('/')
            .to_string();
        if !host.starts_with("http://") && !host.starts_with("https://") {
            bail!("host must start with http:// or https://, got {:?}", host);
        }

        let request_timeout_secs = file
            .request_timeout_secs
            .unwrap_or(cli.request_timeout_secs);

        let retry = file.retry.unwrap_or_default();
        let max_attempts = retry.max_attempts.unwrap_or(cli.max_retries);
        if max_attempts == 0 {
            bail!("retry max_attempts must be at least 1");
        }
        let retry_delay_secs = retry.delay_secs.unwrap_or(cli.retry_delay_secs);

        let cache = file.cache.unwrap_or_default();
        let connection_cache_capacity = cache
            .connection_capacity
            .unwrap_or(defaults.connection_cache_capacity);
        let translation_cache_capacity = cache
            .translation_capacity
            .unwrap_or(defaults.translation_cache_capacity);
        if connection_cache_capacity == 0 {
            bail!("cache connection_capacity must be at least 1");
        }
        if translation_cache_capacity == 0 {
            bail!("cache translation_capacity must be at least 1");
        }

        let duplicate_policy = file
            .translation
            .and_then(|t| t.duplicate_policy)
            .unwrap_or(defaults.duplicate_policy);

        Ok(Self {
            request_timeout: Duration::from_secs(request_timeout_secs),
            gateway: GatewaySettings {
                host,
                max_attempts,
                retry_delay: Duration::from_secs(retry_delay_secs),
                connection_cache_capacity,
                translation_cache_capacity,
                duplicate_policy,
            },
        })
    }
}
