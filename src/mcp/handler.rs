//! MCP stdio Handler
//!
//! Reads newline-delimited JSON-RPC messages from the input stream and writes
//! responses, one per line, to the output stream. Tool calls run concurrently;
//! every other method is answered inline in arrival order.

use std::io;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use super::context::ToolContext;
use super::protocol::{
    methods, to_result, Implementation, InitializeParams, InitializeResult, McpError, McpRequest,
    McpResponse, RequestId, ToolsCallParams, ToolsListResult, MCP_PROTOCOL_VERSION,
};
use super::registry::McpRegistry;
use crate::gateway::Gateway;

pub const SERVER_NAME: &str = "biomart-gateway";

/// State shared by every request of the session
pub struct McpState {
    pub registry: Arc<McpRegistry>,
    pub context: ToolContext,
}

/// What to do with one incoming line.
enum Route {
    Reply(McpResponse),
    Call(RequestId, ToolsCallParams),
    Ignore,
}

/// Serve MCP over the process stdin/stdout until stdin closes.
pub async fn serve_stdio(state: Arc<McpState>) -> io::Result<()> {
    serve(state, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve one MCP session over `reader`/`writer`.
///
/// Returns once `reader` reaches EOF and every in-flight tool call has
/// written its response.
pub async fn serve<R, W>(state: Arc<McpState>, reader: R, writer: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<McpResponse>();
    let writer_task = tokio::spawn(write_responses(writer, rx));

    let mut lines = BufReader::new(reader).lines();
    let mut initialized = false;
    let mut in_flight = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match route(line, &state, &mut initialized) {
            Route::Reply(response) => {
                if tx.send(response).is_err() {
                    break;
                }
            }
            Route::Call(id, params) => {
                let state = state.clone();
                let tx = tx.clone();
                in_flight.spawn(async move {
                    let result = handle_tools_call(params, &state).await;
                    let response = McpResponse::new(Some(id), result);
                    // Receiver only goes away if stdout is gone
                    let _ = tx.send(response);
                });
            }
            Route::Ignore => {}
        }

        while let Some(finished) = in_flight.try_join_next() {
            if let Err(e) = finished {
                error!("Tool call task failed: {}", e);
            }
        }
    }

    debug!(
        "Input closed, waiting for {} in-flight tool calls",
        in_flight.len()
    );
    while let Some(finished) = in_flight.join_next().await {
        if let Err(e) = finished {
            error!("Tool call task failed: {}", e);
        }
    }

    drop(tx);
    writer_task.await.map_err(io::Error::other)?
}

async fn write_responses<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<McpResponse>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize MCP response: {}", e);
                continue;
            }
        };
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    writer.shutdown().await
}

fn route(text: &str, state: &McpState, initialized: &mut bool) -> Route {
    let request: McpRequest = match serde_json::from_str(text) {
        Ok(req) => req,
        Err(e) => {
            return Route::Reply(McpResponse::new(
                None,
                Err(McpError::ParseError(e.to_string())),
            ));
        }
    };

    let Some(request_id) = request.id.clone() else {
        if request.method != methods::INITIALIZED {
            debug!("Ignoring notification {}", request.method);
        }
        return Route::Ignore;
    };

    let result = match request.method.as_str() {
        methods::INITIALIZE => handle_initialize(&request, initialized),
        methods::PING => handle_ping(),
        methods::TOOLS_LIST => {
            if !*initialized {
                Err(McpError::InvalidRequest("Not initialized".to_string()))
            } else {
                handle_tools_list(state)
            }
        }
        methods::TOOLS_CALL => {
            if !*initialized {
                Err(McpError::InvalidRequest("Not initialized".to_string()))
            } else {
                match request.params_as::<ToolsCallParams>() {
                    Ok(Some(params)) => return Route::Call(request_id, params),
                    Ok(None) => Err(McpError::InvalidParams("Missing params".to_string())),
                    Err(e) => Err(e),
                }
            }
        }
        methods::SHUTDOWN => {
            debug!("Client requested shutdown");
            return Route::Ignore;
        }
        other => Err(McpError::MethodNotFound(other.to_string())),
    };

    Route::Reply(McpResponse::new(Some(request_id), result))
}

fn handle_initialize(request: &McpRequest, initialized: &mut bool) -> Result<Value, McpError> {
    let params: Option<InitializeParams> = request.params_as()?;

    match params {
        Some(InitializeParams {
            protocol_version,
            client_info: Some(client),
        }) => info!(
            "MCP client {} {} connected (protocol {})",
            client.name, client.version, protocol_version
        ),
        Some(InitializeParams {
            protocol_version, ..
        }) => info!("MCP client connected (protocol {})", protocol_version),
        None => info!("MCP client connected"),
    }

    *initialized = true;

    to_result(InitializeResult {
        protocol_version: MCP_PROTOCOL_VERSION,
        capabilities: serde_json::json!({ "tools": {} }),
        server_info: Implementation {
            name: SERVER_NAME.to_string(),
            version: server_version(),
        },
    })
}

fn handle_ping() -> Result<Value, McpError> {
    Ok(serde_json::json!({}))
}

fn handle_tools_list(state: &McpState) -> Result<Value, McpError> {
    to_result(ToolsListResult {
        tools: state.registry.tool_definitions(),
    })
}

async fn handle_tools_call(params: ToolsCallParams, state: &McpState) -> Result<Value, McpError> {
    let tool = state
        .registry
        .get_tool(&params.name)
        .ok_or_else(|| McpError::InvalidParams(format!("Unknown tool: {}", params.name)))?;

    debug!("Calling tool {}", tool.name());
    let result = (tool.handler)(state.context.clone(), params.arguments).await?;
    to_result(result)
}

pub fn server_version() -> String {
    format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"))
}

/// Create the MCP state with every tool registered
pub fn create_mcp_state(gateway: Arc<Gateway>) -> McpState {
    let mut registry = McpRegistry::new();
    super::tools::register_all_tools(&mut registry);

    info!("MCP registry initialized with {} tools", registry.tool_count());

    McpState {
        registry: Arc::new(registry),
        context: ToolContext::new(gateway),
    }
}
