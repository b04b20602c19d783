//! MCP Tools
//!
//! Catalog browsing and query tools backed by the gateway.

pub mod catalog;
pub mod query;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::protocol::{McpError, ToolsCallResult};
use super::registry::{McpRegistry, ToolResult};
use crate::gateway::GatewayError;

/// Register all tools with the registry
pub fn register_all_tools(registry: &mut McpRegistry) {
    catalog::register_tools(registry);
    query::register_tools(registry);
}

/// Deserialize tool arguments, mapping failures to `InvalidParams`.
pub(crate) fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, McpError> {
    serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))
}

/// Gateway failures are tool results, not protocol errors.
pub(crate) fn render(result: Result<String, GatewayError>) -> ToolResult {
    Ok(match result {
        Ok(text) => ToolsCallResult::text(text),
        Err(e) => {
            debug!("Tool returned {} error", e.kind());
            ToolsCallResult::error(format!("Error: {}", e))
        }
    })
}
