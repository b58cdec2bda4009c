//! Fan-out of channel events to any number of subscribers.
//!
//! Each subscriber owns the receiving end of its own queue and drains it on
//! its own schedule. Dropping the [`Subscription`] unsubscribes; no screen
//! can take over another's slot.

use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::error::NetError;
use crate::snapshot::{PlayerId, Snapshot};

/// Something the channel observed.
#[derive(Clone, Debug)]
pub enum ChannelEvent {
    /// The server named this connection's player.
    AssignedId(PlayerId),
    /// A full authoritative snapshot.
    Snapshot(Arc<Snapshot>),
    /// The connection is gone. `None` means it was closed on purpose.
    Disconnected {
        /// Underlying failure, if any.
        cause: Option<Arc<NetError>>,
    },
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<(u64, Sender<ChannelEvent>)>,
}

/// Publisher side.
#[derive(Debug, Default)]
pub struct ObserverHub {
    registry: Arc<Mutex<Registry>>,
}

impl ObserverHub {
    /// Hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = unbounded();
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.subscribers.push((id, tx));
        Subscription { id, rx, registry: Arc::downgrade(&self.registry) }
    }

    /// Delivers `event` to every live subscriber.
    pub fn publish(&self, event: &ChannelEvent) {
        self.registry
            .lock()
            .subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    /// Live subscriber count.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().subscribers.len()
    }
}

/// Receiving side of one subscriber.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: Receiver<ChannelEvent>,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Next queued event, without blocking.
    pub fn try_recv(&self) -> Option<ChannelEvent> {
        self.rx.try_recv().ok()
    }

    /// Every queued event, without blocking.
    pub fn drain(&self) -> impl Iterator<Item = ChannelEvent> + '_ {
        self.rx.try_iter()
    }

    /// Waits up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChannelEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assigned(id: &str) -> ChannelEvent {
        ChannelEvent::AssignedId(PlayerId::new(id))
    }

    #[test]
    fn test_every_subscriber_sees_every_event() {
        let hub = ObserverHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();
        hub.publish(&assigned("p1"));

        assert!(matches!(a.try_recv(), Some(ChannelEvent::AssignedId(id)) if id.as_str() == "p1"));
        assert!(matches!(b.try_recv(), Some(ChannelEvent::AssignedId(_))));
        assert!(a.try_recv().is_none());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let hub = ObserverHub::new();
        let a = hub.subscribe();
        {
            let _b = hub.subscribe();
            assert_eq!(hub.subscriber_count(), 2);
        }
        assert_eq!(hub.subscriber_count(), 1);
        hub.publish(&ChannelEvent::Disconnected { cause: None });
        assert_eq!(a.drain().count(), 1);
    }

    #[test]
    fn test_subscription_outlives_hub() {
        let hub = ObserverHub::new();
        let a = hub.subscribe();
        hub.publish(&assigned("p1"));
        drop(hub);
        assert_eq!(a.drain().count(), 1);
        assert!(a.recv_timeout(Duration::from_millis(1)).is_none());
    }
}
