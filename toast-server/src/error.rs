//! Error types for the toast-server crate.

use std::net::SocketAddr;

/// Errors that can occur while starting or stopping the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// The requested address
        addr: SocketAddr,
        /// The underlying warp error
        #[source]
        source: warp::Error,
    },

    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The server task ended abnormally
    #[error("Server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Convenience type alias for Results using ServerError.
pub type Result<T> = std::result::Result<T, ServerError>;
