//! Publish/subscribe contract between the engine and transports.
//!
//! The engine only ever calls [`EventPublisher::publish`] (from session
//! threads) and the membership methods (from the registry). Delivery is the
//! implementation's business: [`Rooms`](crate::Rooms) fans out in memory, a
//! WebSocket transport would forward to its own room table.

use jantteri_event::Publication;
use jantteri_types::{SessionId, SubscriberId};
use tokio::sync::mpsc;

/// Per-session publication channel.
///
/// Implementations must be callable from any thread, including session
/// threads that are not inside a tokio runtime.
pub trait EventPublisher: Send + Sync {
    /// Delivers `publication` to every subscriber currently attached to
    /// `session`. Publishing to a room with no subscribers is a no-op.
    fn publish(&self, session: &SessionId, publication: Publication);

    /// Attaches a new subscriber to `session`'s room.
    fn join(&self, session: &SessionId) -> Subscription;

    /// Detaches a subscriber. Returns `false` if it was not attached.
    fn leave(&self, session: &SessionId, subscriber: SubscriberId) -> bool;

    /// Drops the whole room; attached subscribers see end-of-stream.
    fn close(&self, session: &SessionId);

    /// Number of subscribers attached to `session`.
    fn subscriber_count(&self, session: &SessionId) -> usize;
}

/// Receiving end of one subscriber's membership in a session room.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    session: SessionId,
    rx: mpsc::UnboundedReceiver<Publication>,
}

impl Subscription {
    #[must_use]
    pub fn new(
        id: SubscriberId,
        session: SessionId,
        rx: mpsc::UnboundedReceiver<Publication>,
    ) -> Self {
        Self { id, session, rx }
    }

    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    /// Waits for the next publication; `None` once the room is closed.
    pub async fn recv(&mut self) -> Option<Publication> {
        self.rx.recv().await
    }

    /// Takes a publication if one is already queued.
    pub fn try_recv(&mut self) -> Option<Publication> {
        self.rx.try_recv().ok()
    }

    /// Blocking variant of [`recv`](Self::recv) for non-async callers.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_recv(&mut self) -> Option<Publication> {
        self.rx.blocking_recv()
    }

    /// Drains everything queued right now.
    pub fn drain(&mut self) -> Vec<Publication> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
