//! BioMart Gateway Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod biomart;
pub mod config;
pub mod gateway;
pub mod mcp;

// Re-export commonly used types for convenience
pub use biomart::{BiomartHttpService, MartConnection, MartService};
pub use config::{AppConfig, CliConfig, FileConfig, GatewaySettings};
pub use gateway::{CacheStats, Gateway, GatewayError, Table};
