//! Common test infrastructure
//!
//! Spawns an in-process martservice stand-in and wires the real HTTP client,
//! gateway and MCP handler against it. Tests should only import from this
//! module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{MockMartServer, HUMAN_DATASET, ENSEMBL_MART};
//!
//! #[tokio::test]
//! async fn test_list_datasets() {
//!     let server = MockMartServer::spawn().await;
//!     let gateway = server.gateway();
//!     let csv = gateway.list_datasets(ENSEMBL_MART).await.unwrap();
//!     assert!(csv.contains(HUMAN_DATASET));
//! }
//! ```

mod constants;
mod mock_martservice;

pub use constants::*;
pub use mock_martservice::{gateway_for, MockMartServer};

use biomart_gateway::GatewaySettings;
use std::time::Duration;

/// Gateway settings pointed at `host` with test-friendly retry timing.
pub fn test_settings(host: &str) -> GatewaySettings {
    GatewaySettings {
        host: host.to_string(),
        retry_delay: Duration::from_millis(TEST_RETRY_DELAY_MS),
        ..Default::default()
    }
}
