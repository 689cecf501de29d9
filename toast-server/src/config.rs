//! Configuration types for the toast server
//!
//! This module defines the settings that control binding, per-viewer
//! mailbox sizing and the pacing of the demo handlers.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use sse_broadcast::DEFAULT_MAILBOX_CAPACITY;

use crate::error::{Result, ServerError};

/// Configuration for the ToastServer
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    /// Default: 0.0.0.0:8080
    pub bind_addr: SocketAddr,

    /// Pending messages each viewer may have queued before new ones are dropped
    /// Default: 10
    pub mailbox_capacity: usize,

    /// Encoded chunks buffered between a session and its response body
    /// Default: 16
    pub stream_buffer: usize,

    /// Pause between toasts published by the spam endpoint
    /// Default: 300 milliseconds
    pub spam_interval: Duration,

    /// Simulated work time for delete-item and form-submit
    /// Default: 2 seconds
    pub work_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            stream_buffer: 16,
            spam_interval: Duration::from_millis(300),
            work_delay: Duration::from_secs(2),
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Loopback config on an OS-assigned port with no simulated delays.
    ///
    /// Intended for tests and embedding.
    pub fn local() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            spam_interval: Duration::from_millis(20),
            work_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    pub fn with_stream_buffer(mut self, depth: usize) -> Self {
        self.stream_buffer = depth;
        self
    }

    pub fn with_spam_interval(mut self, interval: Duration) -> Self {
        self.spam_interval = interval;
        self
    }

    pub fn with_work_delay(mut self, delay: Duration) -> Self {
        self.work_delay = delay;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.mailbox_capacity == 0 {
            return Err(ServerError::Configuration(
                "mailbox_capacity must be greater than 0".to_string(),
            ));
        }

        if self.stream_buffer == 0 {
            return Err(ServerError::Configuration(
                "stream_buffer must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
