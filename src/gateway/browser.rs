//! Catalog browsing: marts, datasets, attributes and filters.

use std::sync::Arc;

use tracing::error;

use super::connection_cache::ConnectionCache;
use super::{GatewayError, Table};
use crate::biomart::{Attribute, DatasetInfo, Filter, Mart};

/// Attributes offered by [`CatalogBrowser::list_common_attributes`].
pub const COMMON_ATTRIBUTES: [&str; 18] = [
    "ensembl_gene_id",
    "external_gene_name",
    "hgnc_symbol",
    "hgnc_id",
    "gene_biotype",
    "ensembl_transcript_id",
    "ensembl_peptide_id",
    "ensembl_exon_id",
    "description",
    "chromosome_name",
    "start_position",
    "end_position",
    "strand",
    "band",
    "transcript_start",
    "transcript_end",
    "transcription_start_site",
    "transcript_length",
];

/// Name fragments of attributes hidden from the full listing. These families
/// are large, release-dependent, and tend to break downstream queries.
pub const UNSTABLE_ATTRIBUTE_MARKERS: [&str; 4] = ["_homolog_", "dbass", "affy_", "agilent_"];

pub fn is_common_attribute(name: &str) -> bool {
    COMMON_ATTRIBUTES.contains(&name)
}

/// Case-sensitive substring check against [`UNSTABLE_ATTRIBUTE_MARKERS`].
pub fn is_unstable_attribute(name: &str) -> bool {
    UNSTABLE_ATTRIBUTE_MARKERS
        .iter()
        .any(|marker| name.contains(marker))
}

pub struct CatalogBrowser {
    connections: Arc<ConnectionCache>,
    host: String,
}

impl CatalogBrowser {
    pub fn new(connections: Arc<ConnectionCache>, host: impl Into<String>) -> Self {
        Self {
            connections,
            host: host.into(),
        }
    }

    pub async fn list_marts(&self) -> Result<Table, GatewayError> {
        let result = async {
            let connection = self.connections.get_connection(&self.host).await?;
            connection.list_marts().await
        }
        .await;

        log_failure(result, || "Error listing marts".to_string()).map(|marts| marts_table(&marts))
    }

    pub async fn list_datasets(&self, mart: &str) -> Result<Table, GatewayError> {
        let result = async {
            let connection = self.connections.get_connection(&self.host).await?;
            connection.list_datasets(mart).await
        }
        .await;

        log_failure(result, || format!("Error listing datasets for mart {}", mart))
            .map(|datasets| datasets_table(&datasets))
    }

    /// Attributes of `dataset` restricted to [`COMMON_ATTRIBUTES`].
    ///
    /// This is the recommended discovery path: the output is small and stable
    /// across releases.
    pub async fn list_common_attributes(
        &self,
        mart: &str,
        dataset: &str,
    ) -> Result<Table, GatewayError> {
        let attributes = self.fetch_attributes(mart, dataset).await?;
        let common: Vec<Attribute> = attributes
            .into_iter()
            .filter(|attribute| is_common_attribute(&attribute.name))
            .collect();
        Ok(attributes_table(&common))
    }

    /// Every attribute of `dataset` except the unstable families.
    ///
    /// Attribute sets vary by release and may still contain entries that fail
    /// to query. Prefer [`Self::list_common_attributes`].
    pub async fn list_all_attributes(
        &self,
        mart: &str,
        dataset: &str,
    ) -> Result<Table, GatewayError> {
        let attributes = self.fetch_attributes(mart, dataset).await?;
        let stable: Vec<Attribute> = attributes
            .into_iter()
            .filter(|attribute| !is_unstable_attribute(&attribute.name))
            .collect();
        Ok(attributes_table(&stable))
    }

    pub async fn list_filters(&self, mart: &str, dataset: &str) -> Result<Table, GatewayError> {
        let result = async {
            let connection = self.connections.get_connection(&self.host).await?;
            connection.list_filters(mart, dataset).await
        }
        .await;

        log_failure(result, || {
            format!("Error listing filters for {}/{}", mart, dataset)
        })
        .map(|filters| filters_table(&filters))
    }

    async fn fetch_attributes(
        &self,
        mart: &str,
        dataset: &str,
    ) -> Result<Vec<Attribute>, GatewayError> {
        let result = async {
            let connection = self.connections.get_connection(&self.host).await?;
            connection.list_attributes(mart, dataset).await
        }
        .await;

        log_failure(result, || {
            format!("Error listing attributes for {}/{}", mart, dataset)
        })
    }
}

fn log_failure<T, F>(result: Result<T, GatewayError>, context: F) -> Result<T, GatewayError>
where
    F: FnOnce() -> String,
{
    if let Err(e) = &result {
        error!("{}: {}", context(), e);
    }
    result
}

fn marts_table(marts: &[Mart]) -> Table {
    let mut table = Table::new(["name", "display_name"]);
    for mart in marts {
        table.push_row([mart.name.as_str(), mart.display_name.as_str()]);
    }
    table
}

fn datasets_table(datasets: &[DatasetInfo]) -> Table {
    let mut table = Table::new(["name", "display_name"]);
    for dataset in datasets {
        table.push_row([dataset.name.as_str(), dataset.display_name.as_str()]);
    }
    table
}

fn attributes_table(attributes: &[Attribute]) -> Table {
    let mut table = Table::new(["name", "display_name", "description"]);
    for attribute in attributes {
        table.push_row([
            attribute.name.as_str(),
            attribute.display_name.as_str(),
            attribute.description.as_str(),
        ]);
    }
    table
}

fn filters_table(filters: &[Filter]) -> Table {
    let mut table = Table::new(["name", "type", "description"]);
    for filter in filters {
        table.push_row([
            filter.name.as_str(),
            filter.filter_type.as_str(),
            filter.description.as_str(),
        ]);
    }
    table
}
