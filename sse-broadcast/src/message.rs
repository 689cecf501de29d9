//! Message types carried through the broadcaster.
//!
//! The broadcaster itself only ever sees [`Message`], an opaque, already
//! encoded body. [`Toast`] is the structured payload the browser client
//! understands; it is encoded to JSON once per publish and the resulting
//! body is shared by every mailbox it is delivered to.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// An immutable message body.
///
/// Cloning a `Message` only bumps a reference count, so fan-out to many
/// subscribers never copies the payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message(Arc<str>);

impl Message {
    /// Create a message from any string body.
    pub fn new(body: impl Into<Arc<str>>) -> Self {
        Self(body.into())
    }

    /// The raw message body.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Message {
    fn from(body: String) -> Self {
        Self::new(body)
    }
}

impl From<&str> for Message {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}

/// The well-known toast kinds rendered by the client.
///
/// The broadcaster never validates kinds; [`Toast::kind`] is a free-form
/// string so that unknown kinds pass through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

impl ToastKind {
    /// All known kinds, in display order.
    pub const ALL: [ToastKind; 4] = [
        ToastKind::Success,
        ToastKind::Error,
        ToastKind::Info,
        ToastKind::Warning,
    ];

    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
            ToastKind::Warning => "warning",
        }
    }
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized toast kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown toast kind: {0}")]
pub struct UnknownToastKind(pub String);

impl FromStr for ToastKind {
    type Err = UnknownToastKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToastKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownToastKind(s.to_string()))
    }
}

/// A toast notification as consumed by the browser client.
///
/// Serializes as `{"message": ..., "type": ...}`. Field order is part of the
/// wire format and matches what existing clients were written against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Human readable text
    pub message: String,
    /// Toast kind, usually one of [`ToastKind`] but not restricted to it
    #[serde(rename = "type")]
    pub kind: String,
}

impl Toast {
    /// Create a toast with an arbitrary kind.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: kind.into(),
        }
    }

    /// Create a toast with one of the well-known kinds.
    pub fn with_kind(kind: ToastKind, message: impl Into<String>) -> Self {
        Self::new(kind.as_str(), message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::with_kind(ToastKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_kind(ToastKind::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::with_kind(ToastKind::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_kind(ToastKind::Warning, message)
    }

    /// Encode this toast as a JSON message body.
    pub fn to_message(&self) -> Result<Message, serde_json::Error> {
        serde_json::to_string(self).map(Message::from)
    }
}
