//! Query Tools
//!
//! Tabular data retrieval and id translation.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::{parse_params, render};
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};

/// Register query tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(get_data_tool());
    registry.register_tool(get_translation_tool());
}

// ============================================================================
// get_data
// ============================================================================

#[derive(Debug, Deserialize)]
struct GetDataParams {
    mart: String,
    dataset: String,
    attributes: Vec<String>,
    #[serde(default)]
    filters: BTreeMap<String, String>,
}

fn get_data_tool() -> RegisteredTool {
    ToolBuilder::new("get_data")
        .description(
            "Get data from biomart.\n\
             Returns CSV with one column per requested attribute. Filters are \
             name -> value equality constraints; omit them to select every row.",
        )
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "mart": {
                    "type": "string",
                    "description": "Mart name, e.g. ENSEMBL_MART_ENSEMBL"
                },
                "dataset": {
                    "type": "string",
                    "description": "Dataset name, e.g. hsapiens_gene_ensembl"
                },
                "attributes": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Attribute names to select, in output column order"
                },
                "filters": {
                    "type": "object",
                    "additionalProperties": { "type": "string" },
                    "description": "Filter name -> value"
                }
            },
            "required": ["mart", "dataset", "attributes"]
        }))
        .build(get_data_handler)
}

async fn get_data_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: GetDataParams = parse_params(params)?;
    render(
        ctx.gateway
            .get_data(
                &params.mart,
                &params.dataset,
                &params.attributes,
                &params.filters,
            )
            .await,
    )
}

// ============================================================================
// get_translation
// ============================================================================

#[derive(Debug, Deserialize)]
struct GetTranslationParams {
    mart: String,
    dataset: String,
    from_attr: String,
    to_attr: String,
    target: String,
}

fn get_translation_tool() -> RegisteredTool {
    ToolBuilder::new("get_translation")
        .description(
            "Get translation from one id to another.\n\n\
             Example:\n\
             get_translation(\"ENSEMBL_MART_ENSEMBL\", \"hsapiens_gene_ensembl\", \
             \"hgnc_symbol\", \"ensembl_gene_id\", \"TP53\")\n\
             >>> \"ENSG00000141510\"",
        )
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "mart": { "type": "string" },
                "dataset": { "type": "string" },
                "from_attr": {
                    "type": "string",
                    "description": "Attribute holding the known id"
                },
                "to_attr": {
                    "type": "string",
                    "description": "Attribute to translate into"
                },
                "target": {
                    "type": "string",
                    "description": "Value of from_attr to translate"
                }
            },
            "required": ["mart", "dataset", "from_attr", "to_attr", "target"]
        }))
        .build(get_translation_handler)
}

async fn get_translation_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: GetTranslationParams = parse_params(params)?;
    render(
        ctx.gateway
            .get_translation(
                &params.mart,
                &params.dataset,
                &params.from_attr,
                &params.to_attr,
                &params.target,
            )
            .await,
    )
}
