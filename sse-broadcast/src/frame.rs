//! `text/event-stream` framing.
//!
//! Frames are written in the exact form browsers and the existing client
//! expect:
//!
//! ```text
//! event: <name>\n
//! data: <line>\n      (one per payload line)
//! \n
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::message::Message;

/// Content type of a server-sent event stream.
pub const CONTENT_TYPE: &str = "text/event-stream";

/// Event sent once when a stream is established.
pub const CONNECTED_EVENT: &str = "connected";

/// Payload of the [`CONNECTED_EVENT`] frame.
pub const CONNECTED_DATA: &str = r#"{"status":"connected"}"#;

/// Event carrying a published toast.
pub const TOAST_EVENT: &str = "sse-toast";

/// A single server-sent event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    event: &'a str,
    data: &'a str,
}

impl<'a> Frame<'a> {
    /// Create a frame. `event` must not contain line breaks.
    pub fn new(event: &'a str, data: &'a str) -> Self {
        debug_assert!(
            !event.contains(['\n', '\r']),
            "event names cannot span lines"
        );
        Self { event, data }
    }

    /// The acknowledgement frame sent when a stream opens.
    pub fn connected() -> Frame<'static> {
        Frame::new(CONNECTED_EVENT, CONNECTED_DATA)
    }

    /// A frame delivering a published message.
    pub fn toast(message: &'a Message) -> Self {
        Frame::new(TOAST_EVENT, message.as_str())
    }

    /// Payload lines. `\r\n`, `\n` and a lone `\r` each end a line; an
    /// empty payload still produces one empty data line.
    fn data_lines(&self) -> impl Iterator<Item = &'a str> {
        let mut rest = Some(self.data);
        std::iter::from_fn(move || {
            let current = rest?;
            match current.find(['\r', '\n']) {
                Some(end) => {
                    let width = if current[end..].starts_with("\r\n") { 2 } else { 1 };
                    rest = Some(&current[end + width..]);
                    Some(&current[..end])
                }
                None => {
                    rest = None;
                    Some(current)
                }
            }
        })
    }

    /// Exact number of bytes [`encode`](Frame::encode) writes.
    pub fn encoded_len(&self) -> usize {
        let data: usize = self.data_lines().map(|line| "data: ".len() + line.len() + 1).sum();
        "event: ".len() + self.event.len() + 1 + data + 1
    }

    /// Append the encoded frame to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(self.encoded_len());
        buf.put_slice(b"event: ");
        buf.put_slice(self.event.as_bytes());
        buf.put_u8(b'\n');
        for line in self.data_lines() {
            buf.put_slice(b"data: ");
            buf.put_slice(line.as_bytes());
            buf.put_u8(b'\n');
        }
        buf.put_u8(b'\n');
    }

    /// Encode the frame into a standalone buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_connected_frame_bytes() {
        assert_eq!(
            &Frame::connected().to_bytes()[..],
            b"event: connected\ndata: {\"status\":\"connected\"}\n\n"
        );
    }

    #[test]
    fn test_toast_frame_bytes() {
        let message = Message::from(r#"{"message":"hi","type":"info"}"#);
        assert_eq!(
            &Frame::toast(&message).to_bytes()[..],
            b"event: sse-toast\ndata: {\"message\":\"hi\",\"type\":\"info\"}\n\n"
        );
    }

    #[test]
    fn test_multiline_data() {
        let frame = Frame::new("note", "first\r\nsecond\nthird");
        assert_eq!(
            &frame.to_bytes()[..],
            b"event: note\ndata: first\ndata: second\ndata: third\n\n"
        );
    }

    #[test]
    fn test_lone_carriage_return_splits_data() {
        let frame = Frame::new("note", "first\rsecond\r\n\rthird\n");
        assert_eq!(
            &frame.to_bytes()[..],
            b"event: note\ndata: first\ndata: second\ndata: \ndata: third\ndata: \n\n"
        );
    }

    #[test]
    fn test_empty_data() {
        assert_eq!(&Frame::new("ping", "").to_bytes()[..], b"event: ping\ndata: \n\n");
    }

    #[test]
    fn test_encode_appends() {
        let mut buf = BytesMut::new();
        Frame::new("a", "1").encode(&mut buf);
        Frame::new("b", "2").encode(&mut buf);
        assert_eq!(&buf[..], b"event: a\ndata: 1\n\nevent: b\ndata: 2\n\n");
    }

    proptest! {
        #[test]
        fn test_encoded_len_matches(event in "[a-z-]{1,16}", data in "[ -~\r\n]{0,64}") {
            let frame = Frame::new(&event, &data);
            prop_assert_eq!(frame.to_bytes().len(), frame.encoded_len());
        }

        #[test]
        fn test_data_lines_never_carry_line_breaks(data in "[ -~\r\n]{0,64}") {
            let bytes = Frame::new("note", &data).to_bytes();
            let text = std::str::from_utf8(&bytes).unwrap();
            prop_assert!(!text.contains('\r'));
            for line in text.trim_end_matches('\n').split('\n').skip(1) {
                prop_assert!(line.starts_with("data: "));
            }
        }

        #[test]
        fn test_frame_terminates_once(event in "[a-z-]{1,16}", data in "[ -~]{0,64}") {
            let bytes = Frame::new(&event, &data).to_bytes();
            let text = std::str::from_utf8(&bytes).unwrap();
            prop_assert!(text.ends_with("\n\n"));
            prop_assert_eq!(text.matches("\n\n").count(), 1);
        }
    }
}
