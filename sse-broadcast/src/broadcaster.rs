//! Subscriber registry and best-effort fan-out.
//!
//! This module provides the [`Broadcaster`], which maintains the set of
//! active subscriber mailboxes and delivers every published [`Message`] to
//! each of them without ever blocking the publisher.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::message::Message;

/// Number of pending messages a mailbox holds before new ones are dropped.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 10;

/// Identity of a registered subscriber.
///
/// Ids are unique for the lifetime of the [`Broadcaster`] that issued them
/// and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Shared membership set. Holds only the sending half of each mailbox.
#[derive(Default)]
struct Registry {
    mailboxes: RwLock<HashMap<SubscriberId, mpsc::Sender<Message>>>,
    next_id: AtomicU64,
}

impl Registry {
    fn remove(&self, id: SubscriberId) -> bool {
        let mut mailboxes = self.mailboxes.write();
        let removed = mailboxes.remove(&id).is_some();
        if removed {
            tracing::debug!("Unsubscribed {} ({} active)", id, mailboxes.len());
        }
        removed
    }
}

/// Fans published messages out to every registered subscriber.
///
/// The `Broadcaster` owns a set of bounded mailboxes, one per subscriber.
/// Publishing with [`send`](Broadcaster::send) performs a non-blocking
/// enqueue into each of them; a mailbox that is already full simply misses
/// that message. Publishers are never slowed down by slow consumers and
/// never learn whether delivery happened.
///
/// Share one instance between handlers with `Arc<Broadcaster>`.
///
/// # Example
///
/// ```
/// use sse_broadcast::{Broadcaster, Toast};
///
/// # #[tokio::main]
/// # async fn main() {
/// let broadcaster = Broadcaster::new();
/// let mut subscriber = broadcaster.subscribe();
///
/// broadcaster.send(Toast::success("Saved").to_message().unwrap());
///
/// let message = subscriber.recv().await.unwrap();
/// assert_eq!(message.as_str(), r#"{"message":"Saved","type":"success"}"#);
///
/// broadcaster.unsubscribe(subscriber);
/// assert_eq!(broadcaster.subscriber_count(), 0);
/// # }
/// ```
pub struct Broadcaster {
    registry: Arc<Registry>,
    capacity: usize,
}

impl Broadcaster {
    /// Create a broadcaster whose mailboxes hold [`DEFAULT_MAILBOX_CAPACITY`]
    /// pending messages.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAILBOX_CAPACITY)
    }

    /// Create a broadcaster with a custom mailbox capacity.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            capacity: capacity.max(1),
        }
    }

    /// Mailbox capacity used for new subscribers.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Register a new subscriber.
    ///
    /// Allocates a bounded mailbox and adds it to the membership set. The
    /// returned [`Subscriber`] stays registered until it is passed to
    /// [`unsubscribe`](Broadcaster::unsubscribe) or dropped.
    pub fn subscribe(&self) -> Subscriber {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = SubscriberId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));

        let active = {
            let mut mailboxes = self.registry.mailboxes.write();
            mailboxes.insert(id, tx);
            mailboxes.len()
        };
        tracing::debug!("Subscribed {} ({} active)", id, active);

        Subscriber {
            id,
            mailbox: rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Remove a subscriber and dispose of its mailbox.
    ///
    /// Taking the subscriber by value makes a second unsubscribe impossible.
    pub fn unsubscribe(&self, subscriber: Subscriber) {
        drop(subscriber);
    }

    /// Publish a message to every registered subscriber.
    ///
    /// Delivery is attempted once per mailbox under a shared lock. A full
    /// mailbox drops the message for that subscriber only. This never blocks
    /// and never fails.
    pub fn send(&self, message: impl Into<Message>) {
        let message = message.into();
        let mailboxes = self.registry.mailboxes.read();

        for (id, mailbox) in mailboxes.iter() {
            match mailbox.try_send(message.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::trace!("Mailbox for {} is full, dropping message", id);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::trace!("Mailbox for {} is closed, dropping message", id);
                }
            }
        }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.mailboxes.read().len()
    }

    /// Whether the given subscriber is currently registered.
    pub fn is_registered(&self, id: SubscriberId) -> bool {
        self.registry.mailboxes.read().contains_key(&id)
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// A registered mailbox, owned by exactly one streaming connection.
///
/// Dropping a `Subscriber` deregisters it, so every exit path of the owning
/// connection (normal return, cancellation, panic) releases its slot.
pub struct Subscriber {
    id: SubscriberId,
    mailbox: mpsc::Receiver<Message>,
    registry: Weak<Registry>,
}

impl Subscriber {
    /// Identity of this subscriber within its broadcaster.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next message.
    ///
    /// Returns `None` only once the mailbox can no longer receive messages,
    /// which happens when the broadcaster has been dropped.
    pub async fn recv(&mut self) -> Option<Message> {
        self.mailbox.recv().await
    }

    /// Take the next pending message without waiting.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.mailbox.try_recv().ok()
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
        self.mailbox.close();
    }
}
