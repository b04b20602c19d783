//! HTTP client for the BioMart `martservice` endpoint.
//!
//! Connecting fetches the host registry once; the resulting
//! [`BiomartConnection`] keeps that snapshot for mart lookups and issues one
//! request per listing or query.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::tsv::{parse_datasets, parse_query_result};
use super::xml::{build_query, parse_configuration, parse_registry, DatasetConfiguration};
use super::{Attribute, DatasetInfo, Filter, Mart, MartConnection, MartService};
use crate::gateway::{GatewayError, Table};

const MARTSERVICE_PATH: &str = "/biomart/martservice";

/// Marker martservice puts in the body of a rejected query.
const QUERY_ERROR_MARKER: &str = "Query ERROR";

/// Marker martservice returns instead of a configuration for unknown datasets.
const CONFIGURATION_ERROR_MARKER: &str = "Problem retrieving configuration";

/// Creates [`BiomartConnection`]s over a shared HTTP client.
#[derive(Clone)]
pub struct BiomartHttpService {
    client: Client,
}

impl BiomartHttpService {
    /// Create a new service.
    ///
    /// # Arguments
    /// * `timeout` - Per-request timeout, including large query downloads
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("biomart-gateway/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl MartService for BiomartHttpService {
    async fn connect(&self, host: &str) -> Result<Arc<dyn MartConnection>, GatewayError> {
        let base_url = format!("{}{}", host.trim_end_matches('/'), MARTSERVICE_PATH);

        let registry = get_text(&self.client, &base_url, &[("type", "registry")])
            .await
            .map_err(GatewayError::ConnectionFailure)?;

        let marts = parse_registry(&registry).map_err(|e| {
            GatewayError::ConnectionFailure(format!("Invalid registry from {}: {}", host, e))
        })?;
        if marts.is_empty() {
            return Err(GatewayError::ConnectionFailure(format!(
                "No marts advertised by {}",
                base_url
            )));
        }

        info!("Connected to {} ({} marts)", base_url, marts.len());

        Ok(Arc::new(BiomartConnection {
            client: self.client.clone(),
            host: host.to_string(),
            base_url,
            marts,
        }))
    }
}

/// A connection to one martservice host, carrying its mart registry.
pub struct BiomartConnection {
    client: Client,
    host: String,
    base_url: String,
    marts: Vec<Mart>,
}

impl BiomartConnection {
    fn find_mart(&self, name: &str) -> Result<&Mart, GatewayError> {
        self.marts
            .iter()
            .find(|mart| mart.name == name)
            .ok_or_else(|| GatewayError::QueryFailure(format!("Unknown mart: {}", name)))
    }

    async fn configuration(
        &self,
        mart: &str,
        dataset: &str,
    ) -> Result<DatasetConfiguration, GatewayError> {
        let mart = self.find_mart(mart)?;
        let text = get_text(
            &self.client,
            &self.base_url,
            &[
                ("type", "configuration"),
                ("dataset", dataset),
                ("virtualSchema", mart.virtual_schema.as_str()),
            ],
        )
        .await
        .map_err(GatewayError::QueryFailure)?;

        if text.contains(CONFIGURATION_ERROR_MARKER) {
            return Err(GatewayError::QueryFailure(text.trim().to_string()));
        }

        parse_configuration(&text).map_err(|e| {
            GatewayError::QueryFailure(format!(
                "Invalid configuration for dataset {}: {}",
                dataset, e
            ))
        })
    }
}

#[async_trait]
impl MartConnection for BiomartConnection {
    fn host(&self) -> &str {
        &self.host
    }

    async fn list_marts(&self) -> Result<Vec<Mart>, GatewayError> {
        Ok(self.marts.iter().filter(|m| m.visible).cloned().collect())
    }

    async fn list_datasets(&self, mart: &str) -> Result<Vec<DatasetInfo>, GatewayError> {
        let mart = self.find_mart(mart)?;
        let text = get_text(
            &self.client,
            &self.base_url,
            &[("type", "datasets"), ("mart", mart.name.as_str())],
        )
        .await
        .map_err(GatewayError::QueryFailure)?;

        Ok(parse_datasets(&text))
    }

    async fn list_attributes(
        &self,
        mart: &str,
        dataset: &str,
    ) -> Result<Vec<Attribute>, GatewayError> {
        Ok(self.configuration(mart, dataset).await?.attributes)
    }

    async fn list_filters(&self, mart: &str, dataset: &str) -> Result<Vec<Filter>, GatewayError> {
        Ok(self.configuration(mart, dataset).await?.filters)
    }

    async fn query(
        &self,
        mart: &str,
        dataset: &str,
        attributes: &[String],
        filters: &BTreeMap<String, String>,
    ) -> Result<Table, GatewayError> {
        let mart = self.find_mart(mart)?;
        let query = build_query(&mart.virtual_schema, dataset, attributes, filters);
        debug!("Querying {} on {}", dataset, self.base_url);

        let text = get_text(&self.client, &self.base_url, &[("query", query.as_str())])
            .await
            .map_err(GatewayError::QueryFailure)?;

        if text.contains(QUERY_ERROR_MARKER) {
            return Err(GatewayError::QueryFailure(text.trim().to_string()));
        }

        Ok(parse_query_result(&text, attributes))
    }
}

/// GET `url` with `params` and return the body, or a readable failure message.
async fn get_text(client: &Client, url: &str, params: &[(&str, &str)]) -> Result<String, String> {
    let response = client
        .get(url)
        .query(params)
        .send()
        .await
        .map_err(|e| format!("Failed to reach {}: {}", url, e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("Failed to read response from {}: {}", url, e))?;

    if !status.is_success() {
        let detail = body.trim();
        return Err(if detail.is_empty() {
            format!("{} returned status {}", url, status)
        } else {
            format!("{} returned status {}: {}", url, status, detail)
        });
    }

    Ok(body)
}
