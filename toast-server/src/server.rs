//! HTTP server wiring the toast handlers and the SSE endpoint together.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use sse_broadcast::Broadcaster;
use tokio_util::sync::CancellationToken;
use warp::Filter;

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::handlers::{self, AppState};

/// HTTP server pushing toast notifications to connected browsers.
///
/// The `ToastServer` owns the shared [`Broadcaster`], binds the HTTP routes
/// and keeps one streaming session per open `/sse` connection. Shutting the
/// server down ends every open stream before the listener stops.
///
/// # Example
///
/// ```no_run
/// use toast_server::{ServerConfig, ToastServer};
/// use sse_broadcast::Toast;
///
/// #[tokio::main]
/// async fn main() {
///     let server = ToastServer::start(ServerConfig::default())
///         .await
///         .expect("Failed to start toast server");
///
///     println!("Listening at: {}", server.base_url());
///
///     // Publish from anywhere holding the broadcaster
///     let toast = Toast::info("Server is up");
///     server.broadcaster().send(toast.to_message().unwrap());
///
///     server.shutdown().await.unwrap();
/// }
/// ```
pub struct ToastServer {
    /// The address the listener is bound to
    local_addr: SocketAddr,
    /// Base URL clients can reach the server at
    base_url: String,
    /// Shared fan-out registry
    broadcaster: Arc<Broadcaster>,
    /// Cancels open streams and stops the listener
    shutdown: CancellationToken,
    /// Server task handle
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl ToastServer {
    /// Bind the listener and start serving.
    ///
    /// Fails if the configuration is invalid or the address cannot be bound.
    pub async fn start(config: ServerConfig) -> Result<Self> {
        config.validate()?;

        let broadcaster = Arc::new(Broadcaster::with_capacity(config.mailbox_capacity));
        let shutdown = CancellationToken::new();

        let state = AppState {
            broadcaster: broadcaster.clone(),
            shutdown: shutdown.clone(),
            stream_buffer: config.stream_buffer,
            spam_interval: config.spam_interval,
            work_delay: config.work_delay,
        };

        let graceful = shutdown.clone();
        let (local_addr, server) = warp::serve(routes(state))
            .try_bind_with_graceful_shutdown(config.bind_addr, async move {
                graceful.cancelled().await
            })
            .map_err(|source| ServerError::Bind {
                addr: config.bind_addr,
                source,
            })?;

        let base_url = Self::base_url_for(local_addr);
        tracing::info!("Toast server listening on {}", local_addr);

        let server_handle = tokio::spawn(server);

        Ok(Self {
            local_addr,
            base_url,
            broadcaster,
            shutdown,
            server_handle: Some(server_handle),
        })
    }

    /// The address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Base URL of the server, e.g. `http://127.0.0.1:8080`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The broadcaster shared with every handler.
    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// Shutdown the server gracefully.
    ///
    /// Ends every open event stream, stops accepting connections and waits
    /// for in-flight requests to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        self.shutdown.cancel();

        if let Some(handle) = self.server_handle.take() {
            handle.await?;
        }

        tracing::info!("Toast server on {} stopped", self.local_addr);
        Ok(())
    }

    fn base_url_for(addr: SocketAddr) -> String {
        if addr.ip().is_unspecified() {
            format!("http://localhost:{}", addr.port())
        } else {
            format!("http://{addr}")
        }
    }
}

impl Drop for ToastServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Build the full route table.
pub fn routes(
    state: AppState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    let with_state = warp::any().map(move || state.clone());

    let index = warp::path::end().and(warp::get()).and_then(handlers::index);

    let sse = warp::path("sse")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state.clone())
        .and_then(handlers::sse);

    let trigger_toast = warp::path("trigger-toast")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state.clone())
        .and(form_values())
        .and_then(handlers::trigger_toast);

    let spam_toasts = warp::path("spam-toasts")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state.clone())
        .and_then(handlers::spam_toasts);

    let delete_item = warp::path("delete-item")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state.clone())
        .and_then(handlers::delete_item);

    let form_submit = warp::path("form-submit")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state)
        .and(form_values())
        .and_then(handlers::form_submit);

    let random_quote = warp::path("random-quote")
        .and(warp::path::end())
        .and_then(handlers::random_quote);

    index
        .or(sse)
        .or(trigger_toast)
        .or(spam_toasts)
        .or(delete_item)
        .or(form_submit)
        .or(random_quote)
        .with(warp::trace::request())
        .recover(handle_rejection)
}

/// Request fields from the query string and, when the body is form-encoded,
/// from the body. Body fields take precedence. Other or malformed bodies are
/// ignored rather than rejected.
fn form_values(
) -> impl Filter<Extract = (HashMap<String, String>,), Error = Infallible> + Clone {
    let query = warp::query::<HashMap<String, String>>()
        .or(warp::any().map(HashMap::new))
        .unify();
    let body = warp::body::form::<HashMap<String, String>>()
        .or(warp::any().map(HashMap::new))
        .unify();

    query
        .and(body)
        .map(|mut fields: HashMap<String, String>, body: HashMap<String, String>| {
            fields.extend(body);
            fields
        })
}

/// Handle rejections and convert them to HTTP responses.
async fn handle_rejection(
    err: warp::Rejection,
) -> std::result::Result<impl warp::Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not found";
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method not allowed";
    } else {
        tracing::warn!("Unhandled rejection: {:?}", err);
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal server error";
    }

    Ok(warp::reply::with_status(message, code))
}
