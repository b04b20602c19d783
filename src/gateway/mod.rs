//! Caching gateway over a BioMart catalog.
//!
//! [`Gateway`] owns the connection and translation caches and exposes the
//! seven catalog operations as text results ready for the tool layer.

mod browser;
mod connection_cache;
mod error;
mod executor;
mod retry_policy;
mod slot_cache;
mod table;
mod translation;

#[cfg(test)]
pub(crate) mod test_support;

pub use browser::{
    is_common_attribute, is_unstable_attribute, CatalogBrowser, COMMON_ATTRIBUTES,
    UNSTABLE_ATTRIBUTE_MARKERS,
};
pub use connection_cache::ConnectionCache;
pub use error::GatewayError;
pub use executor::QueryExecutor;
pub use retry_policy::RetryPolicy;
pub use table::Table;
pub use translation::{DuplicatePolicy, TranslationCache, TranslationKey, TranslationMapping};

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Serialize;

use crate::biomart::MartService;
use crate::config::GatewaySettings;

/// Entry counts of the gateway caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub connections: usize,
    pub translations: usize,
}

pub struct Gateway {
    connections: Arc<ConnectionCache>,
    browser: CatalogBrowser,
    executor: Arc<QueryExecutor>,
    translations: TranslationCache,
}

impl Gateway {
    pub fn new(service: Arc<dyn MartService>, settings: &GatewaySettings) -> Self {
        let connections = Arc::new(ConnectionCache::new(
            service,
            non_zero(settings.connection_cache_capacity),
        ));
        let browser = CatalogBrowser::new(connections.clone(), settings.host.clone());
        let executor = Arc::new(QueryExecutor::new(
            connections.clone(),
            settings.host.clone(),
            RetryPolicy::new(settings),
        ));
        let translations = TranslationCache::new(
            executor.clone(),
            settings.duplicate_policy,
            non_zero(settings.translation_cache_capacity),
        );

        Self {
            connections,
            browser,
            executor,
            translations,
        }
    }

    pub async fn list_marts(&self) -> Result<String, GatewayError> {
        Ok(self.browser.list_marts().await?.to_csv())
    }

    pub async fn list_datasets(&self, mart: &str) -> Result<String, GatewayError> {
        Ok(self.browser.list_datasets(mart).await?.to_csv())
    }

    pub async fn list_common_attributes(
        &self,
        mart: &str,
        dataset: &str,
    ) -> Result<String, GatewayError> {
        Ok(self
            .browser
            .list_common_attributes(mart, dataset)
            .await?
            .to_csv())
    }

    pub async fn list_all_attributes(
        &self,
        mart: &str,
        dataset: &str,
    ) -> Result<String, GatewayError> {
        Ok(self
            .browser
            .list_all_attributes(mart, dataset)
            .await?
            .to_csv())
    }

    pub async fn list_filters(&self, mart: &str, dataset: &str) -> Result<String, GatewayError> {
        Ok(self.browser.list_filters(mart, dataset).await?.to_csv())
    }

    pub async fn get_data(
        &self,
        mart: &str,
        dataset: &str,
        attributes: &[String],
        filters: &BTreeMap<String, String>,
    ) -> Result<String, GatewayError> {
        Ok(self
            .executor
            .get_data(mart, dataset, attributes, filters)
            .await?
            .to_csv())
    }

    /// Returns the bare translated value, not a CSV document.
    pub async fn get_translation(
        &self,
        mart: &str,
        dataset: &str,
        from_attr: &str,
        to_attr: &str,
        target: &str,
    ) -> Result<String, GatewayError> {
        self.translations
            .get_translation(mart, dataset, from_attr, to_attr, target)
            .await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        CacheStats {
            connections: self.connections.len().await,
            translations: self.translations.len().await,
        }
    }
}

fn non_zero(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}
