use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use toast_server::logging::{init_logging, init_logging_from_env, LoggingMode};
use toast_server::{ServerConfig, ToastServer};

/// Toast notification server
///
/// Serves a demo page and pushes toast notifications to every connected
/// browser over server-sent events.
#[derive(Parser, Debug)]
#[command(name = "toast-server")]
#[command(about = "Real-time toast notifications over server-sent events")]
#[command(version)]
pub struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Pending messages per viewer before new ones are dropped
    #[arg(long, default_value = "10")]
    pub mailbox_capacity: usize,

    /// Flushed frames buffered per stream before a slow viewer stalls its session
    #[arg(long, default_value = "16")]
    pub stream_buffer: usize,

    /// Milliseconds between toasts sent by /spam-toasts
    #[arg(long, default_value = "300")]
    pub spam_interval_ms: u64,

    /// Milliseconds of simulated work for /delete-item and /form-submit
    #[arg(long, default_value = "2000")]
    pub work_delay_ms: u64,

    /// Log output style (defaults to TOAST_LOG_MODE, then development)
    #[arg(long, value_enum)]
    pub log_mode: Option<LoggingMode>,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig::new()
            .with_bind_addr(self.bind)
            .with_mailbox_capacity(self.mailbox_capacity)
            .with_stream_buffer(self.stream_buffer)
            .with_spam_interval(Duration::from_millis(self.spam_interval_ms))
            .with_work_delay(Duration::from_millis(self.work_delay_ms))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    match args.log_mode {
        Some(mode) => init_logging(mode),
        None => init_logging_from_env(),
    }
    .context("Failed to initialize logging")?;

    let server = ToastServer::start(args.server_config())
        .await
        .context("Failed to start toast server")?;
    info!("Server running at {}", server.base_url());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutting down");

    server.shutdown().await.context("Failed to shut down cleanly")?;
    Ok(())
}
