//! MessageHub: realtime fan-out of conversation events
//!
//! ```text
//! POST /api/conversations/{id}/messages ─┐
//! POST /api/conversations/{id}/read ─────┤ publish(recipients, event)
//!                                        ▼
//! MessageHub
//!   ├── users: user_id → broadcast::Sender<MessageEvent>
//!   └── connections: user_id → open socket count
//!                                        │
//!                                        ▼
//! Message WS handler (one receiver per socket)
//! ```
//!
//! Socket slots are held by a `ConnectionSlot` guard and released on drop, so
//! a socket whose upgrade never completes does not keep its slot.
//!
//! A user only ever receives events for conversations they belong to,
//! because publishers address the participant and the agency owner directly.

use dashmap::DashMap;
use shared::models::MessageEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;

/// Broadcast channel capacity per user
const BROADCAST_CAPACITY: usize = 256;

#[derive(Clone, Default)]
pub struct MessageHub {
    users: Arc<DashMap<String, broadcast::Sender<MessageEvent>>>,
    connections: Arc<DashMap<String, AtomicUsize>>,
}

impl MessageHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a user's event stream
    pub fn subscribe(&self, user_id: &str) -> broadcast::Receiver<MessageEvent> {
        self.users
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(BROADCAST_CAPACITY).0)
            .subscribe()
    }

    /// Deliver an event to each recipient that has an open subscription.
    /// Returns the number of users reached.
    pub fn publish(&self, recipients: &[&str], event: &MessageEvent) -> usize {
        let mut reached = 0;
        for user_id in dedup(recipients) {
            if let Some(tx) = self.users.get(user_id)
                && tx.send(event.clone()).is_ok()
            {
                reached += 1;
            }
        }
        reached
    }

    /// Reserve a socket slot; `Err(current)` when the user is at `max`
    pub fn try_connect(&self, user_id: &str, max: usize) -> Result<ConnectionSlot, usize> {
        let counter = self
            .connections
            .entry(user_id.to_string())
            .or_insert_with(|| AtomicUsize::new(0));
        let prev = counter.fetch_add(1, Ordering::SeqCst);
        if prev >= max {
            counter.fetch_sub(1, Ordering::SeqCst);
            return Err(prev);
        }
        Ok(ConnectionSlot {
            hub: self.clone(),
            user_id: user_id.to_string(),
        })
    }

    /// Release a socket slot and drop idle channels
    fn disconnect(&self, user_id: &str) {
        let remaining = self
            .connections
            .get(user_id)
            .map(|c| c.fetch_sub(1, Ordering::SeqCst).saturating_sub(1))
            .unwrap_or(0);
        if remaining == 0 {
            self.connections
                .remove_if(user_id, |_, c| c.load(Ordering::SeqCst) == 0);
            self.users
                .remove_if(user_id, |_, tx| tx.receiver_count() == 0);
        }
    }

    pub fn connection_count(&self, user_id: &str) -> usize {
        self.connections
            .get(user_id)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

/// One reserved socket slot; released when dropped
pub struct ConnectionSlot {
    hub: MessageHub,
    user_id: String,
}

impl ConnectionSlot {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.hub.disconnect(&self.user_id);
    }
}

fn dedup<'a>(ids: &[&'a str]) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Message;

    fn created(conversation_id: i64, sender: &str) -> MessageEvent {
        MessageEvent::MessageCreated {
            conversation_id,
            message: Message {
                id: 1,
                conversation_id,
                sender_id: sender.into(),
                body: "hello".into(),
                read_at: None,
                created_at: 0,
            },
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_only_recipients() {
        let hub = MessageHub::new();
        let mut alice = hub.subscribe("alice");
        let mut bob = hub.subscribe("bob");
        let mut eve = hub.subscribe("eve");

        let reached = hub.publish(&["alice", "bob"], &created(7, "alice"));
        assert_eq!(reached, 2);

        assert_eq!(alice.recv().await.unwrap(), created(7, "alice"));
        assert_eq!(bob.recv().await.unwrap(), created(7, "alice"));
        assert!(matches!(
            eve.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let hub = MessageHub::new();
        assert_eq!(hub.publish(&["nobody"], &MessageEvent::Resync), 0);
    }

    #[tokio::test]
    async fn test_duplicate_recipient_gets_one_event() {
        let hub = MessageHub::new();
        let mut owner = hub.subscribe("owner");
        // Owner messaging their own agency is both participant and owner
        assert_eq!(hub.publish(&["owner", "owner"], &MessageEvent::Resync), 1);
        assert_eq!(owner.recv().await.unwrap(), MessageEvent::Resync);
        assert!(owner.try_recv().is_err());
    }

    #[test]
    fn test_connection_limit() {
        let hub = MessageHub::new();
        let mut slots: Vec<ConnectionSlot> = (0..5).map(|_| hub.try_connect("u1", 5).unwrap()).collect();
        assert_eq!(hub.try_connect("u1", 5).err(), Some(5));
        assert_eq!(hub.connection_count("u1"), 5);
        let _other = hub.try_connect("u2", 5).unwrap();

        slots.pop();
        assert_eq!(hub.connection_count("u1"), 4);
        assert!(hub.try_connect("u1", 5).is_ok());
    }

    #[test]
    fn test_unused_slot_is_released_on_drop() {
        let hub = MessageHub::new();
        // A slot reserved for an upgrade that never runs
        let pending = move |slot: ConnectionSlot| async move { slot.user_id().len() };
        for _ in 0..10 {
            let slot = hub.try_connect("u1", 5).unwrap();
            drop(pending(slot));
        }
        assert_eq!(hub.connection_count("u1"), 0);
    }

    #[test]
    fn test_last_disconnect_drops_idle_channel() {
        let hub = MessageHub::new();
        let slot = hub.try_connect("u1", 5).unwrap();
        let rx = hub.subscribe("u1");
        drop(rx);
        drop(slot);
        assert_eq!(hub.connection_count("u1"), 0);
        assert!(hub.users.get("u1").is_none());
    }

    #[tokio::test]
    async fn test_lagged_receiver() {
        let hub = MessageHub::new();
        let mut rx = hub.subscribe("u1");
        for _ in 0..(BROADCAST_CAPACITY + 10) {
            hub.publish(&["u1"], &MessageEvent::Resync);
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
    }
}
