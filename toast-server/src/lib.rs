//! HTTP server pushing toast notifications to browsers.
//!
//! This crate is the HTTP layer around [`sse_broadcast`]. It serves a small
//! demo page, a server-sent event stream per viewer, and a handful of
//! endpoints that publish toasts to every connected viewer.
//!
//! # Routes
//!
//! | Route                 | Method | Effect                                              |
//! |-----------------------|--------|-----------------------------------------------------|
//! | `/`                   | GET    | Demo page                                           |
//! | `/sse`                | GET    | `text/event-stream` of `connected` + `sse-toast`    |
//! | `/trigger-toast`      | POST   | Publish the canned toast for field `type`           |
//! | `/spam-toasts`        | POST   | Publish five toasts in the background               |
//! | `/delete-item`        | POST   | Simulated work, then a success toast                |
//! | `/form-submit`        | POST   | Simulated work, then echo `name` and `email`        |
//! | `/random-quote`       | any    | HTML fragment with a random quote                   |
//!
//! # Example
//!
//! ```no_run
//! use toast_server::{ServerConfig, ToastServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), toast_server::ServerError> {
//!     let server = ToastServer::start(ServerConfig::default()).await?;
//!     println!("Open {} in a browser", server.base_url());
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     server.shutdown().await
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
mod server;
mod sink;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use server::{routes, ToastServer};
