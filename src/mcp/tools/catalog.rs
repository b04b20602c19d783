//! Catalog Tools
//!
//! Tools for browsing marts, datasets, attributes and filters.

use serde::Deserialize;
use serde_json::Value;

use super::{parse_params, render};
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

/// Register catalog tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(list_marts_tool());
    registry.register_tool(list_datasets_tool());
    registry.register_tool(list_common_attributes_tool());
    registry.register_tool(list_all_attributes_tool());
    registry.register_tool(list_filters_tool());
}

#[derive(Debug, Deserialize)]
struct MartParams {
    mart: String,
}

#[derive(Debug, Deserialize)]
struct DatasetParams {
    mart: String,
    dataset: String,
}

fn dataset_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "mart": {
                "type": "string",
                "description": "Mart name, e.g. ENSEMBL_MART_ENSEMBL"
            },
            "dataset": {
                "type": "string",
                "description": "Dataset name, e.g. hsapiens_gene_ensembl"
            }
        },
        "required": ["mart", "dataset"]
    })
}

// ============================================================================
// list_marts
// ============================================================================

fn list_marts_tool() -> RegisteredTool {
    ToolBuilder::new("list_marts")
        .description(
            "List all available biomart marts.\n\
             Biomart has a hierarchy: MART -> DATASET.\n\
             Datasets can be queried for attributes with filters.",
        )
        .build(list_marts_handler)
}

async fn list_marts_handler(ctx: ToolContext, _params: Value) -> ToolResult {
    render(ctx.gateway.list_marts().await)
}

// ============================================================================
// list_datasets
// ============================================================================

fn list_datasets_tool() -> RegisteredTool {
    ToolBuilder::new("list_datasets")
        .description(
            "List all available biomart datasets for a given mart.\n\
             Valid values for mart are:\n\
             - ENSEMBL_MART_ENSEMBL\n\
             - ENSEMBL_MART_MOUSE\n\
             - ENSEMBL_MART_ONTOLOGY\n\
             - ENSEMBL_MART_GENOMIC\n\
             - ENSEMBL_MART_SNP\n\
             - ENSEMBL_MART_FUNCGEN",
        )
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "mart": {
                    "type": "string",
                    "description": "Mart name, e.g. ENSEMBL_MART_ENSEMBL"
                }
            },
            "required": ["mart"]
        }))
        .build(list_datasets_handler)
}

async fn list_datasets_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: MartParams = parse_params(params)?;
    render(ctx.gateway.list_datasets(&params.mart).await)
}

// ============================================================================
// list_common_attributes
// ============================================================================

fn list_common_attributes_tool() -> RegisteredTool {
    ToolBuilder::new("list_common_attributes")
        .description("List common available biomart attributes for a given dataset.")
        .input_schema(dataset_schema())
        .build(list_common_attributes_handler)
}

async fn list_common_attributes_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: DatasetParams = parse_params(params)?;
    render(
        ctx.gateway
            .list_common_attributes(&params.mart, &params.dataset)
            .await,
    )
}

// ============================================================================
// list_all_attributes
// ============================================================================

fn list_all_attributes_tool() -> RegisteredTool {
    ToolBuilder::new("list_all_attributes")
        .description(
            "List all available biomart attributes for a given dataset.\n\
             This listing is unstable and may cause errors.\n\
             Prefer list_common_attributes instead.",
        )
        .input_schema(dataset_schema())
        .build(list_all_attributes_handler)
}

async fn list_all_attributes_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: DatasetParams = parse_params(params)?;
    render(
        ctx.gateway
            .list_all_attributes(&params.mart, &params.dataset)
            .await,
    )
}

// ============================================================================
// list_filters
// ============================================================================

fn list_filters_tool() -> RegisteredTool {
    ToolBuilder::new("list_filters")
        .description("List all available biomart filters for a given dataset.")
        .input_schema(dataset_schema())
        .build(list_filters_handler)
}

async fn list_filters_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: DatasetParams = parse_params(params)?;
    render(ctx.gateway.list_filters(&params.mart, &params.dataset).await)
}
