//! Real-time notification fan-out over server-sent events.
//!
//! This crate is the transport-agnostic core of toast-server. It has no
//! knowledge of HTTP routing; the server crate adapts its response bodies to
//! the [`EventSink`] trait and calls [`Broadcaster::send`] from its handlers.
//!
//! # Overview
//!
//! - [`Broadcaster`]: registry of active subscribers. Publishing performs a
//!   non-blocking enqueue into every subscriber's bounded mailbox and drops
//!   the message for subscribers whose mailbox is full.
//! - [`Subscriber`]: one bounded mailbox, deregistered when dropped.
//! - [`StreamingSession`]: drives one subscriber onto one [`EventSink`],
//!   emitting a `connected` frame followed by an `sse-toast` frame per
//!   delivered message until the peer disconnects or the server shuts down.
//! - [`Frame`]: byte-exact `text/event-stream` encoding.
//! - [`Toast`] / [`Message`]: the structured payload and its encoded body.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sse_broadcast::{Broadcaster, Frame, Toast};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let broadcaster = Arc::new(Broadcaster::new());
//! let mut viewer = broadcaster.subscribe();
//!
//! // Somewhere in a request handler
//! let toast = Toast::warning("Please be careful with this action.");
//! broadcaster.send(toast.to_message().unwrap());
//!
//! let message = viewer.recv().await.unwrap();
//! let frame = Frame::toast(&message).to_bytes();
//! assert!(frame.starts_with(b"event: sse-toast\ndata: "));
//! # }
//! ```

pub mod broadcaster;
pub mod error;
pub mod frame;
pub mod message;
pub mod session;

pub use broadcaster::{Broadcaster, Subscriber, SubscriberId, DEFAULT_MAILBOX_CAPACITY};
pub use error::{SessionError, SinkError};
pub use frame::Frame;
pub use message::{Message, Toast, ToastKind, UnknownToastKind};
pub use session::{EventSink, SessionEnd, StreamingSession};
