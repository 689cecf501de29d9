//! Per-connection streaming sessions.
//!
//! A [`StreamingSession`] ties one [`Subscriber`] to one [`EventSink`]. It
//! announces the connection with a `connected` frame and then forwards every
//! message that lands in the subscriber's mailbox as an `sse-toast` frame
//! until the peer disconnects or the server shuts down.

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::broadcaster::{Broadcaster, Subscriber, SubscriberId};
use crate::error::{SessionError, SinkError};
use crate::frame::Frame;

/// Outbound half of a streaming connection.
///
/// Implementations adapt a concrete transport (an HTTP response body, a
/// socket, a test buffer) to the session loop.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Whether frames can be pushed to the peer before the response ends.
    ///
    /// Sessions refuse to start on sinks that cannot flush.
    fn supports_flush(&self) -> bool {
        true
    }

    /// Queue an encoded frame for sending.
    async fn write(&mut self, frame: Bytes) -> Result<(), SinkError>;

    /// Push everything written so far to the peer.
    async fn flush(&mut self) -> Result<(), SinkError>;

    /// Resolves once the peer has disconnected.
    async fn closed(&self);
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer went away, observed either directly or as a failed write
    Disconnected,
    /// The shutdown token fired
    Shutdown,
    /// The broadcaster was dropped and the mailbox closed
    MailboxClosed,
}

/// A subscriber bound to an event sink.
///
/// Opening a session registers the subscriber; the registration is released
/// whenever the session is dropped, whether [`run`](StreamingSession::run)
/// finished, was cancelled, or never started.
///
/// # Example
///
/// ```no_run
/// # use sse_broadcast::{Broadcaster, EventSink, StreamingSession};
/// # use tokio_util::sync::CancellationToken;
/// # async fn serve<S: EventSink>(broadcaster: &Broadcaster, sink: S) {
/// let shutdown = CancellationToken::new();
/// match StreamingSession::open(broadcaster, sink) {
///     Ok(session) => {
///         let end = session.run(shutdown.child_token()).await;
///         println!("session ended: {end:?}");
///     }
///     Err(e) => eprintln!("{e}"),
/// }
/// # }
/// ```
pub struct StreamingSession<S> {
    subscriber: Subscriber,
    sink: S,
}

impl<S: EventSink> StreamingSession<S> {
    /// Check the sink and register a subscriber for it.
    ///
    /// Fails with [`SessionError::StreamingUnsupported`] before touching the
    /// registry when the sink cannot flush.
    pub fn open(broadcaster: &Broadcaster, sink: S) -> Result<Self, SessionError> {
        if !sink.supports_flush() {
            tracing::warn!("Refusing streaming session: sink cannot flush");
            return Err(SessionError::StreamingUnsupported);
        }

        Ok(Self {
            subscriber: broadcaster.subscribe(),
            sink,
        })
    }

    /// Identity of the registered subscriber.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscriber.id()
    }

    /// Drive the session until the peer disconnects or `shutdown` fires.
    ///
    /// The subscriber is deregistered before this returns.
    pub async fn run(self, shutdown: CancellationToken) -> SessionEnd {
        let Self {
            mut subscriber,
            mut sink,
        } = self;
        let id = subscriber.id();

        tracing::debug!("Streaming session {} started", id);
        let end = pump(&mut subscriber, &mut sink, &shutdown).await;
        drop(subscriber);
        tracing::debug!("Streaming session {} ended: {:?}", id, end);

        end
    }
}

async fn pump<S: EventSink>(
    subscriber: &mut Subscriber,
    sink: &mut S,
    shutdown: &CancellationToken,
) -> SessionEnd {
    if let Err(end) = deliver(sink, Frame::connected(), shutdown).await {
        return end;
    }

    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => return SessionEnd::Shutdown,
            _ = sink.closed() => return SessionEnd::Disconnected,
            message = subscriber.recv() => message,
        };

        let Some(message) = next else {
            return SessionEnd::MailboxClosed;
        };

        if let Err(end) = deliver(sink, Frame::toast(&message), shutdown).await {
            tracing::trace!("Delivery to {} stopped: {:?}", subscriber.id(), end);
            return end;
        }
    }
}

/// Write and flush one frame, giving up as soon as `shutdown` fires.
///
/// A peer that stops reading can leave `flush` pending indefinitely; a sink
/// whose peer is gone fails the write or flush instead.
async fn deliver<S: EventSink>(
    sink: &mut S,
    frame: Frame<'_>,
    shutdown: &CancellationToken,
) -> Result<(), SessionEnd> {
    let bytes = frame.to_bytes();
    tokio::select! {
        _ = shutdown.cancelled() => Err(SessionEnd::Shutdown),
        result = write_and_flush(sink, bytes) => result.map_err(|e| {
            tracing::trace!("Event sink failed: {}", e);
            SessionEnd::Disconnected
        }),
    }
}

async fn write_and_flush<S: EventSink>(sink: &mut S, frame: Bytes) -> Result<(), SinkError> {
    sink.write(frame).await?;
    sink.flush().await
}
