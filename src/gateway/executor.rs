//! Tabular queries against a dataset.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::connection_cache::ConnectionCache;
use super::retry_policy::RetryPolicy;
use super::{GatewayError, Table};

pub struct QueryExecutor {
    connections: Arc<ConnectionCache>,
    host: String,
    retry_policy: RetryPolicy,
}

impl QueryExecutor {
    pub fn new(
        connections: Arc<ConnectionCache>,
        host: impl Into<String>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            connections,
            host: host.into(),
            retry_policy,
        }
    }

    /// Select `attributes` from `dataset` under `filters`, retrying failures.
    ///
    /// The first successful attempt wins; nothing is merged across attempts.
    /// An empty `filters` map selects every row.
    pub async fn get_data(
        &self,
        mart: &str,
        dataset: &str,
        attributes: &[String],
        filters: &BTreeMap<String, String>,
    ) -> Result<Table, GatewayError> {
        validate_attributes(attributes)?;
        self.retry_policy
            .run("getting data", move |_attempt| {
                self.execute(mart, dataset, attributes, filters)
            })
            .await
    }

    /// Same query as [`Self::get_data`], in a single attempt.
    pub async fn query_once(
        &self,
        mart: &str,
        dataset: &str,
        attributes: &[String],
        filters: &BTreeMap<String, String>,
    ) -> Result<Table, GatewayError> {
        validate_attributes(attributes)?;
        self.execute(mart, dataset, attributes, filters).await
    }

    async fn execute(
        &self,
        mart: &str,
        dataset: &str,
        attributes: &[String],
        filters: &BTreeMap<String, String>,
    ) -> Result<Table, GatewayError> {
        let connection = self.connections.get_connection(&self.host).await?;
        connection.query(mart, dataset, attributes, filters).await
    }
}

fn validate_attributes(attributes: &[String]) -> Result<(), GatewayError> {
    if attributes.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "At least one attribute is required".to_string(),
        ));
    }
    Ok(())
}
