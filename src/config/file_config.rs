use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::gateway::DuplicatePolicy;

/// TOML config file. Every key is optional; present keys win over CLI flags.
///
/// ```toml
/// host = "https://www.ensembl.org"
/// request_timeout_secs = 120
///
/// [retry]
/// max_attempts = 5
/// delay_secs = 1
///
/// [cache]
/// connection_capacity = 4
/// translation_capacity = 200
///
/// [translation]
/// duplicate_policy = "first_wins"
/// ```
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub host: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub retry: Option<RetryConfig>,
    pub cache: Option<CacheConfig>,
    pub translation: Option<TranslationConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub delay_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub connection_capacity: Option<usize>,
    pub translation_capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct TranslationConfig {
    /// How repeated from-values are resolved: "last_wins", "first_wins", "reject"
    pub duplicate_policy: Option<DuplicatePolicy>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read gateway config {:?}", path))?;
        toml::from_str(&raw).with_context(|| format!("Invalid gateway config {:?}", path))
    }
}
