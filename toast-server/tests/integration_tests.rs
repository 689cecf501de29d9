//! Integration tests for the toast server.
//!
//! These tests start a real HTTP server, open real event streams with
//! reqwest and verify end-to-end delivery.

use futures::StreamExt;
use std::time::Duration;
use tokio::time::timeout;

use toast_server::{ServerConfig, ToastServer};

const CONNECTED: &str = "event: connected\ndata: {\"status\":\"connected\"}\n\n";

/// Reads whole SSE frames off a streaming response.
struct SseReader {
    stream: futures::stream::BoxStream<'static, reqwest::Result<bytes::Bytes>>,
    buffer: String,
}

impl SseReader {
    async fn connect(base_url: &str) -> (reqwest::header::HeaderMap, Self) {
        let response = reqwest::get(format!("{base_url}/sse"))
            .await
            .expect("Failed to open event stream");
        assert_eq!(response.status(), 200);

        let headers = response.headers().clone();
        let reader = Self {
            stream: response.bytes_stream().boxed(),
            buffer: String::new(),
        };
        (headers, reader)
    }

    /// Next complete frame, including its blank-line terminator.
    async fn next_frame(&mut self) -> Option<String> {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let frame: String = self.buffer.drain(..end + 2).collect();
                return Some(frame);
            }
            let chunk = timeout(Duration::from_secs(5), self.stream.next())
                .await
                .expect("Timeout waiting for frame")?
                .expect("Stream error");
            self.buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }
}

fn toast_frame(json: &str) -> String {
    format!("event: sse-toast\ndata: {json}\n\n")
}

async fn wait_for_subscribers(server: &ToastServer, expected: usize) {
    timeout(Duration::from_secs(5), async {
        while server.broadcaster().subscriber_count() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Timeout waiting for subscriber count");
}

#[tokio::test]
async fn test_trigger_toast_end_to_end() {
    let server = ToastServer::start(ServerConfig::local())
        .await
        .expect("Failed to start server");
    let base_url = server.base_url().to_string();

    let (headers, mut viewer) = SseReader::connect(&base_url).await;
    assert_eq!(headers["content-type"], "text/event-stream");
    assert_eq!(headers["cache-control"], "no-cache");
    assert_eq!(headers["x-accel-buffering"], "no");

    assert_eq!(viewer.next_frame().await.unwrap(), CONNECTED);

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base_url}/trigger-toast"))
        .form(&[("type", "success")])
        .send()
        .await
        .expect("Failed to trigger toast");
    assert_eq!(response.status(), 200);

    assert_eq!(
        viewer.next_frame().await.unwrap(),
        toast_frame(r#"{"message":"Operation completed successfully!","type":"success"}"#)
    );

    server.shutdown().await.expect("Failed to shutdown server");
}

#[tokio::test]
async fn test_spam_toasts_reach_all_viewers_in_order() {
    let server = ToastServer::start(ServerConfig::local())
        .await
        .expect("Failed to start server");
    let base_url = server.base_url().to_string();

    let (_, mut a) = SseReader::connect(&base_url).await;
    let (_, mut b) = SseReader::connect(&base_url).await;
    assert_eq!(a.next_frame().await.unwrap(), CONNECTED);
    assert_eq!(b.next_frame().await.unwrap(), CONNECTED);

    let response = reqwest::Client::new()
        .post(format!("{base_url}/spam-toasts"))
        .send()
        .await
        .expect("Failed to request spam");
    assert_eq!(response.status(), 200);

    let expected = [
        r#"{"message":"First toast incoming!","type":"success"}"#,
        r#"{"message":"Oops, an error appeared!","type":"error"}"#,
        r#"{"message":"Here's some info for you.","type":"info"}"#,
        r#"{"message":"Warning: toast spam detected!","type":"warning"}"#,
        r#"{"message":"And we're done!","type":"success"}"#,
    ];
    for json in expected {
        assert_eq!(a.next_frame().await.unwrap(), toast_frame(json));
        assert_eq!(b.next_frame().await.unwrap(), toast_frame(json));
    }

    server.shutdown().await.expect("Failed to shutdown server");
}

#[tokio::test]
async fn test_disconnect_unregisters_viewer() {
    let server = ToastServer::start(ServerConfig::local())
        .await
        .expect("Failed to start server");
    let base_url = server.base_url().to_string();

    let (_, mut viewer) = SseReader::connect(&base_url).await;
    assert_eq!(viewer.next_frame().await.unwrap(), CONNECTED);
    assert_eq!(server.broadcaster().subscriber_count(), 1);

    drop(viewer);
    wait_for_subscribers(&server, 0).await;

    // Publishing with nobody listening still succeeds
    let response = reqwest::Client::new()
        .post(format!("{base_url}/trigger-toast"))
        .form(&[("type", "info")])
        .send()
        .await
        .expect("Failed to trigger toast");
    assert_eq!(response.status(), 200);

    server.shutdown().await.expect("Failed to shutdown server");
}

#[tokio::test]
async fn test_form_submit_and_delete_item() {
    let server = ToastServer::start(ServerConfig::local())
        .await
        .expect("Failed to start server");
    let base_url = server.base_url().to_string();
    let client = reqwest::Client::new();

    let (_, mut viewer) = SseReader::connect(&base_url).await;
    assert_eq!(viewer.next_frame().await.unwrap(), CONNECTED);

    let response = client
        .post(format!("{base_url}/form-submit"))
        .form(&[("name", "Grace"), ("email", "grace@example.com")])
        .send()
        .await
        .expect("Failed to submit form");
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "");

    assert_eq!(
        viewer.next_frame().await.unwrap(),
        toast_frame(r#"{"message":"Form submitted! Name: Grace, Email: grace@example.com","type":"success"}"#)
    );

    let response = client
        .post(format!("{base_url}/delete-item"))
        .send()
        .await
        .expect("Failed to delete item");
    assert_eq!(response.status(), 200);

    assert_eq!(
        viewer.next_frame().await.unwrap(),
        toast_frame(r#"{"message":"Item deleted successfully!","type":"success"}"#)
    );

    server.shutdown().await.expect("Failed to shutdown server");
}

#[tokio::test]
async fn test_get_on_post_route_is_rejected() {
    let server = ToastServer::start(ServerConfig::local())
        .await
        .expect("Failed to start server");

    let response = reqwest::get(format!("{}/trigger-toast", server.base_url()))
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 405);
    assert_eq!(server.broadcaster().subscriber_count(), 0);

    server.shutdown().await.expect("Failed to shutdown server");
}

#[tokio::test]
async fn test_shutdown_ends_open_streams() {
    let server = ToastServer::start(ServerConfig::local())
        .await
        .expect("Failed to start server");
    let base_url = server.base_url().to_string();

    let (_, mut viewer) = SseReader::connect(&base_url).await;
    assert_eq!(viewer.next_frame().await.unwrap(), CONNECTED);

    let broadcaster = server.broadcaster().clone();
    timeout(Duration::from_secs(5), server.shutdown())
        .await
        .expect("Shutdown hung on open stream")
        .expect("Failed to shutdown server");

    assert_eq!(broadcaster.subscriber_count(), 0);
    assert!(viewer.next_frame().await.is_none());
}
