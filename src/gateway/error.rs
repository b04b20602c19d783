//! Error taxonomy shared by every gateway operation.

use thiserror::Error;

/// Errors surfaced by the gateway.
///
/// The `Display` form is the bare underlying message. The tool layer wraps it
/// into the `Error: <message>` envelope, so the text must stay verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The remote host was unreachable or rejected the handshake.
    #[error("{0}")]
    ConnectionFailure(String),

    /// The remote service rejected or failed a listing or query request.
    #[error("{0}")]
    QueryFailure(String),

    /// The translation mapping was built but does not contain the target.
    #[error("Target '{target}' not found")]
    TranslationMiss { target: String },

    /// Building a translation mapping failed.
    #[error("{0}")]
    TargetBuildFailure(String),

    /// The caller supplied arguments that cannot form a request.
    #[error("{0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Short label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::ConnectionFailure(_) => "connection_failure",
            GatewayError::QueryFailure(_) => "query_failure",
            GatewayError::TranslationMiss { .. } => "translation_miss",
            GatewayError::TargetBuildFailure(_) => "target_build_failure",
            GatewayError::InvalidRequest(_) => "invalid_request",
        }
    }
}
