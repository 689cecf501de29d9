//! Request handlers.
//!
//! Every handler that produces a notification builds a [`Toast`] and hands
//! it to the shared [`Broadcaster`]; none of them know who is listening.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use sse_broadcast::{frame, Broadcaster, StreamingSession, Toast, ToastKind};
use tokio_util::sync::CancellationToken;
use warp::http::header::{HeaderValue, CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use warp::http::{Response, StatusCode};
use warp::hyper::Body;
use warp::Reply;

use crate::sink::body_channel;

static INDEX_HTML: &str = include_str!("../assets/index.html");

/// Quotes served by `/random-quote`.
pub const QUOTES: [&str; 6] = [
    "The best way to predict the future is to invent it. — Alan Kay",
    "Simplicity is the ultimate sophistication. — Leonardo da Vinci",
    "First, solve the problem. Then, write the code. — John Johnson",
    "Code is like humor. When you have to explain it, it's bad. — Cory House",
    "Make it work, make it right, make it fast. — Kent Beck",
    "Any fool can write code that a computer can understand. Good programmers write code that humans can understand. — Martin Fowler",
];

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub broadcaster: Arc<Broadcaster>,
    pub shutdown: CancellationToken,
    pub stream_buffer: usize,
    pub spam_interval: Duration,
    pub work_delay: Duration,
}

/// Canned text for each well-known toast kind.
pub fn default_message(kind: ToastKind) -> &'static str {
    match kind {
        ToastKind::Success => "Operation completed successfully!",
        ToastKind::Error => "Something went wrong!",
        ToastKind::Info => "Here's some information for you.",
        ToastKind::Warning => "Please be careful with this action.",
    }
}

/// Build the toast for a `/trigger-toast` request.
///
/// An empty type means `success`. An unknown type is kept as-is but gets
/// the info text.
pub fn toast_for_type(kind: &str) -> Toast {
    let kind = if kind.is_empty() {
        ToastKind::Success.as_str()
    } else {
        kind
    };
    let message = kind
        .parse::<ToastKind>()
        .map(default_message)
        .unwrap_or_else(|_| default_message(ToastKind::Info));

    Toast::new(kind, message)
}

/// The five toasts published by `/spam-toasts`, in order.
pub fn spam_sequence() -> [Toast; 5] {
    [
        Toast::success("First toast incoming!"),
        Toast::error("Oops, an error appeared!"),
        Toast::info("Here's some info for you."),
        Toast::warning("Warning: toast spam detected!"),
        Toast::success("And we're done!"),
    ]
}

/// Encode and broadcast a toast.
pub fn publish(broadcaster: &Broadcaster, toast: &Toast) {
    match toast.to_message() {
        Ok(message) => broadcaster.send(message),
        Err(e) => tracing::error!("Failed to encode toast: {}", e),
    }
}

pub async fn index() -> Result<impl Reply, Infallible> {
    Ok(warp::reply::html(INDEX_HTML))
}

/// Open a server-sent event stream for one viewer.
pub async fn sse(state: AppState) -> Result<Response<Body>, Infallible> {
    let (sink, body) = body_channel(state.stream_buffer);

    let session = match StreamingSession::open(&state.broadcaster, sink) {
        Ok(session) => session,
        Err(e) => {
            let mut response = Response::new(Body::from(e.to_string()));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            return Ok(response);
        }
    };

    tracing::info!(
        "Viewer {} connected ({} active)",
        session.subscriber_id(),
        state.broadcaster.subscriber_count()
    );
    tokio::spawn(session.run(state.shutdown.child_token()));

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(frame::CONTENT_TYPE));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    Ok(response)
}

pub async fn trigger_toast(
    state: AppState,
    form: HashMap<String, String>,
) -> Result<impl Reply, Infallible> {
    let kind = form.get("type").map(String::as_str).unwrap_or_default();
    let toast = toast_for_type(kind);

    tracing::debug!("Triggering {} toast", toast.kind);
    publish(&state.broadcaster, &toast);

    Ok(StatusCode::OK)
}

/// Publish the spam sequence in the background and answer immediately.
pub async fn spam_toasts(state: AppState) -> Result<impl Reply, Infallible> {
    tokio::spawn(async move {
        let mut toasts = spam_sequence().into_iter().peekable();
        while let Some(toast) = toasts.next() {
            publish(&state.broadcaster, &toast);
            if toasts.peek().is_none() {
                break;
            }
            tokio::select! {
                _ = state.shutdown.cancelled() => break,
                _ = tokio::time::sleep(state.spam_interval) => {}
            }
        }
    });

    Ok(StatusCode::OK)
}

pub async fn delete_item(state: AppState) -> Result<impl Reply, Infallible> {
    tokio::time::sleep(state.work_delay).await;
    publish(&state.broadcaster, &Toast::success("Item deleted successfully!"));

    Ok(StatusCode::OK)
}

pub async fn form_submit(
    state: AppState,
    form: HashMap<String, String>,
) -> Result<impl Reply, Infallible> {
    let name = form.get("name").map(String::as_str).unwrap_or_default();
    let email = form.get("email").map(String::as_str).unwrap_or_default();

    tokio::time::sleep(state.work_delay).await;
    publish(
        &state.broadcaster,
        &Toast::success(format!("Form submitted! Name: {name}, Email: {email}")),
    );

    Ok(StatusCode::OK)
}

pub async fn random_quote() -> Result<impl Reply, Infallible> {
    let quote = QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(QUOTES[0]);

    Ok(warp::reply::html(format!(
        r#"<blockquote class="text-lg italic">"{quote}"</blockquote>"#
    )))
}
