//! Id-to-id translation through cached two-column projections.
//!
//! The first lookup for a `(mart, dataset, from, to)` key downloads the whole
//! projection and keeps it as a mapping; later lookups with any target on the
//! same key are answered from memory. Build failures are never cached.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, info};

use super::executor::QueryExecutor;
use super::slot_cache::SlotCache;
use super::{GatewayError, Table};

/// How repeated from-values in a projection are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The last row seen for a from-value wins.
    #[default]
    LastWins,
    /// The first row seen for a from-value wins.
    FirstWins,
    /// Any conflicting duplicate fails the build.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranslationKey {
    pub mart: String,
    pub dataset: String,
    pub from_attr: String,
    pub to_attr: String,
}

/// Snapshot of a from-value -> to-value projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationMapping {
    values: HashMap<String, String>,
}

impl TranslationMapping {
    /// Build a mapping from the first two columns of `table`.
    ///
    /// Rows with an empty cell on either side carry no translation and are
    /// skipped.
    pub fn from_table(table: &Table, policy: DuplicatePolicy) -> Result<Self, GatewayError> {
        if table.columns().len() < 2 {
            return Err(GatewayError::TargetBuildFailure(format!(
                "Expected 2 columns in translation result, got {}",
                table.columns().len()
            )));
        }

        let mut values = HashMap::with_capacity(table.len());
        for row in table.rows() {
            let (Some(from), Some(to)) = (row.first(), row.get(1)) else {
                continue;
            };
            if from.is_empty() || to.is_empty() {
                continue;
            }
            match values.entry(from.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(to.clone());
                }
                Entry::Occupied(mut slot) => match policy {
                    DuplicatePolicy::LastWins => {
                        slot.insert(to.clone());
                    }
                    DuplicatePolicy::FirstWins => {}
                    DuplicatePolicy::Reject => {
                        if slot.get() != to {
                            return Err(GatewayError::TargetBuildFailure(format!(
                                "Ambiguous translation for '{}': '{}' and '{}'",
                                from,
                                slot.get(),
                                to
                            )));
                        }
                    }
                },
            }
        }

        Ok(Self { values })
    }

    pub fn get(&self, from: &str) -> Option<&str> {
        self.values.get(from).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub struct TranslationCache {
    executor: Arc<QueryExecutor>,
    policy: DuplicatePolicy,
    mappings: SlotCache<TranslationKey, Arc<TranslationMapping>>,
}

impl TranslationCache {
    pub fn new(
        executor: Arc<QueryExecutor>,
        policy: DuplicatePolicy,
        capacity: NonZeroUsize,
    ) -> Self {
        Self {
            executor,
            policy,
            mappings: SlotCache::new(capacity),
        }
    }

    /// Translate `target` from `from_attr` to `to_attr` within `dataset`.
    ///
    /// Runs a single query attempt when the mapping is not cached yet; the
    /// retry loop of [`QueryExecutor::get_data`] does not apply here.
    pub async fn get_translation(
        &self,
        mart: &str,
        dataset: &str,
        from_attr: &str,
        to_attr: &str,
        target: &str,
    ) -> Result<String, GatewayError> {
        let key = TranslationKey {
            mart: mart.to_string(),
            dataset: dataset.to_string(),
            from_attr: from_attr.to_string(),
            to_attr: to_attr.to_string(),
        };

        let mapping = self.mapping(key).await.map_err(|e| {
            error!("Error in translation: {}", e);
            e
        })?;

        match mapping.get(target) {
            Some(value) => Ok(value.to_string()),
            None => {
                error!("Target '{}' not found in translation", target);
                Err(GatewayError::TranslationMiss {
                    target: target.to_string(),
                })
            }
        }
    }

    async fn mapping(&self, key: TranslationKey) -> Result<Arc<TranslationMapping>, GatewayError> {
        let lookup = self
            .mappings
            .get_or_try_init(&key, || self.build_mapping(&key))
            .await?;

        if !lookup.built {
            debug!(
                "Translation cache hit for {}/{} {} -> {}",
                key.mart, key.dataset, key.from_attr, key.to_attr
            );
        }
        Ok(lookup.value)
    }

    async fn build_mapping(
        &self,
        key: &TranslationKey,
    ) -> Result<Arc<TranslationMapping>, GatewayError> {
        let attributes = [key.from_attr.clone(), key.to_attr.clone()];
        let table = self
            .executor
            .query_once(&key.mart, &key.dataset, &attributes, &BTreeMap::new())
            .await
            .map_err(|e| GatewayError::TargetBuildFailure(e.to_string()))?;

        let mapping = Arc::new(TranslationMapping::from_table(&table, self.policy)?);
        info!(
            "Cached translation {}/{} {} -> {} ({} entries)",
            key.mart,
            key.dataset,
            key.from_attr,
            key.to_attr,
            mapping.len()
        );
        Ok(mapping)
    }

    /// Number of cached mappings.
    pub async fn len(&self) -> usize {
        self.mappings.len().await
    }
}
