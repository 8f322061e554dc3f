//! In-memory room table.
//!
//! ```text
//! Rooms
//!   ABCDEF ─┬─ sub:1 ─► UnboundedSender<Publication>
//!           └─ sub:2 ─► UnboundedSender<Publication>
//!   QWERTY ─── sub:3 ─► UnboundedSender<Publication>
//! ```
//!
//! Senders are unbounded so that a slow subscriber never blocks a session
//! thread. Subscribers whose receiver was dropped are pruned on the next
//! publish.

use crate::publisher::{EventPublisher, Subscription};
use jantteri_event::Publication;
use jantteri_types::{SessionId, SubscriberId};
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::mpsc;

type Room = HashMap<SubscriberId, mpsc::UnboundedSender<Publication>>;

/// Fan-out [`EventPublisher`] keyed by session id.
#[derive(Debug, Default)]
pub struct Rooms {
    rooms: RwLock<HashMap<SessionId, Room>>,
}

impl Rooms {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rooms with at least one subscriber.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }
}

impl EventPublisher for Rooms {
    fn publish(&self, session: &SessionId, publication: Publication) {
        let mut dead = Vec::new();
        {
            let rooms = self.rooms.read();
            let Some(room) = rooms.get(session) else {
                return;
            };
            for (id, tx) in room {
                if tx.send(publication.clone()).is_err() {
                    dead.push(*id);
                }
            }
        }

        if !dead.is_empty() {
            let mut rooms = self.rooms.write();
            if let Some(room) = rooms.get_mut(session) {
                for id in &dead {
                    room.remove(id);
                    tracing::debug!(session_id = %session, subscriber = %id, "Pruned closed subscriber");
                }
                if room.is_empty() {
                    rooms.remove(session);
                }
            }
        }
    }

    fn join(&self, session: &SessionId) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = SubscriberId::new();
        self.rooms
            .write()
            .entry(session.clone())
            .or_default()
            .insert(id, tx);
        tracing::debug!(session_id = %session, subscriber = %id, "Subscriber joined");
        Subscription::new(id, session.clone(), rx)
    }

    fn leave(&self, session: &SessionId, subscriber: SubscriberId) -> bool {
        let mut rooms = self.rooms.write();
        let Some(room) = rooms.get_mut(session) else {
            return false;
        };
        let removed = room.remove(&subscriber).is_some();
        if room.is_empty() {
            rooms.remove(session);
        }
        if removed {
            tracing::debug!(session_id = %session, subscriber = %subscriber, "Subscriber left");
        }
        removed
    }

    fn close(&self, session: &SessionId) {
        if let Some(room) = self.rooms.write().remove(session) {
            tracing::debug!(session_id = %session, subscribers = room.len(), "Room closed");
        }
    }

    fn subscriber_count(&self, session: &SessionId) -> usize {
        self.rooms.read().get(session).map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jantteri_event::ConsoleMessage;

    fn sid(s: &str) -> SessionId {
        s.parse().unwrap()
    }

    fn text(session: &SessionId, msg: &str) -> Publication {
        Publication::console(&ConsoleMessage::now(session.clone(), msg))
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let rooms = Rooms::new();
        let id = sid("AAAAAA");
        rooms.publish(&id, text(&id, "nobody"));
        assert_eq!(rooms.subscriber_count(&id), 0);
        assert_eq!(rooms.room_count(), 0);
    }

    #[test]
    fn fan_out_to_all_members() {
        let rooms = Rooms::new();
        let id = sid("AAAAAA");
        let mut a = rooms.join(&id);
        let mut b = rooms.join(&id);
        assert_eq!(rooms.subscriber_count(&id), 2);

        rooms.publish(&id, text(&id, "hello"));

        assert_eq!(a.try_recv().unwrap().console_text(), Some("hello"));
        assert_eq!(b.try_recv().unwrap().console_text(), Some("hello"));
    }

    #[test]
    fn rooms_are_isolated() {
        let rooms = Rooms::new();
        let first = sid("AAAAAA");
        let second = sid("BBBBBB");
        let mut a = rooms.join(&first);
        let mut b = rooms.join(&second);

        rooms.publish(&first, text(&first, "only first"));

        assert!(a.try_recv().is_some());
        assert!(b.try_recv().is_none());
    }

    #[test]
    fn leave_stops_delivery() {
        let rooms = Rooms::new();
        let id = sid("AAAAAA");
        let mut sub = rooms.join(&id);

        assert!(rooms.leave(&id, sub.id()));
        assert!(!rooms.leave(&id, sub.id()));
        rooms.publish(&id, text(&id, "late"));

        assert!(sub.try_recv().is_none());
        assert_eq!(rooms.room_count(), 0);
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let rooms = Rooms::new();
        let id = sid("AAAAAA");
        let keep = rooms.join(&id);
        let gone = rooms.join(&id);
        drop(gone);

        rooms.publish(&id, text(&id, "x"));

        assert_eq!(rooms.subscriber_count(&id), 1);
        drop(keep);
    }

    #[test]
    fn close_ends_stream() {
        let rooms = Rooms::new();
        let id = sid("AAAAAA");
        let mut sub = rooms.join(&id);
        rooms.publish(&id, text(&id, "last"));
        rooms.close(&id);

        assert_eq!(sub.blocking_recv().unwrap().console_text(), Some("last"));
        assert!(sub.blocking_recv().is_none());
    }

    #[tokio::test]
    async fn async_receive() {
        let rooms = Rooms::new();
        let id = sid("AAAAAA");
        let mut sub = rooms.join(&id);
        rooms.publish(&id, text(&id, "async"));

        let publication = sub.recv().await.unwrap();
        assert_eq!(publication.console_text(), Some("async"));
        assert_eq!(sub.session_id(), &id);
    }
}
