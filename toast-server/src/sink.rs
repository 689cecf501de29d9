//! Adapter from [`EventSink`] to a streaming HTTP response body.
//!
//! Frames written by a session are buffered until flushed; each flush becomes
//! one chunk of the response. When hyper drops the body because the client
//! went away, the channel closes and [`EventSink::closed`] resolves.

use std::convert::Infallible;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use sse_broadcast::{EventSink, SinkError};
use tokio::sync::mpsc;
use warp::hyper::Body;

/// Event sink feeding a hyper response body.
pub struct BodySink {
    buffer: BytesMut,
    chunks: mpsc::Sender<Result<Bytes, Infallible>>,
}

/// Create a sink and the response body it feeds.
///
/// `depth` bounds the number of flushed chunks waiting to be written to the
/// socket; a session writing faster than that waits on flush.
pub fn body_channel(depth: usize) -> (BodySink, Body) {
    let (tx, rx) = mpsc::channel(depth.max(1));

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    });

    let sink = BodySink {
        buffer: BytesMut::new(),
        chunks: tx,
    };
    (sink, Body::wrap_stream(stream))
}

#[async_trait]
impl EventSink for BodySink {
    async fn write(&mut self, frame: Bytes) -> Result<(), SinkError> {
        if self.chunks.is_closed() {
            return Err(SinkError::Closed);
        }
        self.buffer.extend_from_slice(&frame);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let chunk = self.buffer.split().freeze();
        self.chunks
            .send(Ok(chunk))
            .await
            .map_err(|_| SinkError::Closed)
    }

    async fn closed(&self) {
        self.chunks.closed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use sse_broadcast::{Broadcaster, SessionEnd, StreamingSession};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_flush_produces_one_chunk() {
        let (mut sink, mut body) = body_channel(4);

        sink.write(Bytes::from_static(b"event: a\n")).await.unwrap();
        sink.write(Bytes::from_static(b"data: 1\n\n")).await.unwrap();
        sink.flush().await.unwrap();

        let chunk = body.next().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"event: a\ndata: 1\n\n");
    }

    #[tokio::test]
    async fn test_empty_flush_sends_nothing() {
        let (mut sink, mut body) = body_channel(4);
        sink.flush().await.unwrap();
        drop(sink);
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_body_closes_sink() {
        let (mut sink, body) = body_channel(4);
        drop(body);

        sink.closed().await;
        assert!(matches!(
            sink.write(Bytes::from_static(b"x")).await,
            Err(SinkError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_unread_body_does_not_block_shutdown() {
        let broadcaster = Broadcaster::new();
        let shutdown = CancellationToken::new();

        // The body stays alive but is never polled, so the chunk channel fills up
        let (sink, _body) = body_channel(1);
        let session = StreamingSession::open(&broadcaster, sink).unwrap();
        let handle = tokio::spawn(session.run(shutdown.clone()));

        broadcaster.send("first");
        broadcaster.send("second");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        shutdown.cancel();
        let end = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("Session stayed blocked in flush after shutdown")
            .unwrap();
        assert_eq!(end, SessionEnd::Shutdown);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn test_supports_flush() {
        let (sink, _body) = body_channel(1);
        assert!(sink.supports_flush());
    }
}
