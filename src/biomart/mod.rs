//! BioMart catalog collaborator.
//!
//! The gateway talks to the remote catalog only through [`MartService`] and
//! [`MartConnection`]. [`BiomartHttpService`] is the production implementation
//! speaking the public `martservice` protocol; tests plug in their own.

mod client;
mod tsv;
mod xml;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::gateway::{GatewayError, Table};

pub use client::{BiomartConnection, BiomartHttpService};

/// Virtual schema used when the registry does not name one.
pub const DEFAULT_VIRTUAL_SCHEMA: &str = "default";

/// A top-level catalog partition as advertised by the host registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mart {
    pub name: String,
    pub display_name: String,
    pub virtual_schema: String,
    pub visible: bool,
}

/// A queryable table inside a mart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub display_name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub filter_type: String,
    pub description: String,
}

/// An established handle to one catalog host.
#[async_trait]
pub trait MartConnection: Send + Sync {
    /// Host this connection was established against.
    fn host(&self) -> &str;

    async fn list_marts(&self) -> Result<Vec<Mart>, GatewayError>;

    async fn list_datasets(&self, mart: &str) -> Result<Vec<DatasetInfo>, GatewayError>;

    async fn list_attributes(
        &self,
        mart: &str,
        dataset: &str,
    ) -> Result<Vec<Attribute>, GatewayError>;

    async fn list_filters(&self, mart: &str, dataset: &str) -> Result<Vec<Filter>, GatewayError>;

    /// Run a tabular query selecting `attributes` under equality `filters`.
    async fn query(
        &self,
        mart: &str,
        dataset: &str,
        attributes: &[String],
        filters: &BTreeMap<String, String>,
    ) -> Result<Table, GatewayError>;
}

/// Factory for catalog connections.
#[async_trait]
pub trait MartService: Send + Sync {
    /// Establish a connection to `host`.
    ///
    /// Fails with [`GatewayError::ConnectionFailure`] when the host cannot be
    /// reached or does not answer like a BioMart registry.
    async fn connect(&self, host: &str) -> Result<Arc<dyn MartConnection>, GatewayError>;
}
