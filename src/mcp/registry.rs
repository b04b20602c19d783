//! Name-indexed table of MCP tools.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::context::ToolContext;
use super::protocol::{McpError, ToolDefinition, ToolsCallResult};

/// Protocol errors abort the call; gateway errors live inside `ToolsCallResult`.
pub type ToolResult = Result<ToolsCallResult, McpError>;

pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

pub type ToolHandler = Arc<dyn Fn(ToolContext, Value) -> ToolFuture + Send + Sync>;

pub struct RegisteredTool {
    pub definition: ToolDefinition,
    pub handler: ToolHandler,
}

impl RegisteredTool {
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// Tools keyed by name. Iteration order is the name order, which is also
/// the order `tools/list` reports.
#[derive(Default)]
pub struct McpRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl McpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations under the same name replace earlier ones.
    pub fn register_tool(&mut self, tool: RegisteredTool) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!("Tool {} registered twice, keeping the last one", name);
        }
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| tool.definition.clone())
            .collect()
    }

    pub fn get_tool(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

pub struct ToolBuilder {
    definition: ToolDefinition,
}

impl ToolBuilder {
    /// Starts with an empty description and an argument-less object schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            definition: ToolDefinition {
                name: name.into(),
                description: String::new(),
                input_schema: serde_json::json!({ "type": "object", "properties": {} }),
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.definition.description = description.into();
        self
    }

    pub fn input_schema(mut self, schema: Value) -> Self {
        self.definition.input_schema = schema;
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> RegisteredTool
    where
        F: Fn(ToolContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        RegisteredTool {
            definition: self.definition,
            handler: Arc::new(move |ctx, arguments| Box::pin(handler(ctx, arguments))),
        }
    }
}
