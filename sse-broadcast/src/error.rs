//! Error types for the sse-broadcast crate.

/// Errors raised by an [`EventSink`](crate::EventSink).
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The peer is gone; nothing more can be written
    #[error("Event sink closed")]
    Closed,

    /// Any other transport failure
    #[error("Event sink I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that prevent a streaming session from starting.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The transport cannot push frames incrementally
    #[error("SSE not supported")]
    StreamingUnsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(SessionError::StreamingUnsupported.to_string(), "SSE not supported");
        assert_eq!(SinkError::Closed.to_string(), "Event sink closed");

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        assert_eq!(SinkError::from(io).to_string(), "Event sink I/O error: pipe");
    }
}
