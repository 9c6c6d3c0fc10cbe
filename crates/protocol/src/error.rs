//! Error type for protocol detection and descriptor extraction.

/// Errors that can occur while detecting a protocol or binding a request.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("no chunk upload protocol matches the request")]
    ProtocolMismatch,

    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("protocol {kind} cannot be used to {action}")]
    RoleMismatch {
        kind: crate::ProtocolKind,
        action: &'static str,
    },

    #[error("invalid chunk parameters: {0}")]
    InvalidChunkParameters(String),

    #[error("the content range value is too large: {0}")]
    RangeValueTooLarge(String),

    #[error("missing request parameter: {0}")]
    MissingParameter(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Returns `true` when the error was caused by the client request rather
    /// than by the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::UnknownProtocol(_) | Self::RoleMismatch { .. })
    }
}
