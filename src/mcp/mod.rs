//! MCP (Model Context Protocol) Server
//!
//! Exposes the gateway operations as MCP tools so that LLM clients can
//! browse the BioMart catalog and run queries.
//!
//! ## Architecture
//!
//! - Transport: newline-delimited JSON-RPC over stdin/stdout
//! - Tools: one per gateway operation, results rendered as text
//! - Diagnostics: stderr only, stdout carries the protocol

pub mod context;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod tools;

pub use handler::{create_mcp_state, serve, serve_stdio, McpState};
pub use protocol::{McpError, McpRequest, McpResponse};
pub use registry::McpRegistry;
