//! State handed to every tool invocation.

use std::sync::Arc;

use crate::gateway::Gateway;

#[derive(Clone)]
pub struct ToolContext {
    /// Shared gateway holding the connection and translation caches
    pub gateway: Arc<Gateway>,
}

impl ToolContext {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}
