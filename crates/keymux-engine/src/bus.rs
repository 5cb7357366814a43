//! Event fan-out
//!
//! Each subscriber owns an unbounded queue, so a slow consumer never makes
//! `publish` block or drop events for anyone else. Delivery order between
//! subscribers is unspecified.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::trace;

use crate::KeyboardEvent;

#[derive(Default)]
struct BusInner {
    subscribers: RwLock<HashMap<u64, mpsc::UnboundedSender<KeyboardEvent>>>,
    next_id: AtomicU64,
}

/// Observer list for lifecycle and key-input events.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer. Dropping the returned handle unsubscribes.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.write().insert(id, sender);
        trace!(subscription = id, "Subscribed to keyboard events");

        Subscription {
            id,
            receiver,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to every observer. Returns how many received it.
    pub fn publish(&self, event: KeyboardEvent) -> usize {
        let subscribers = self.inner.subscribers.read();
        subscribers
            .values()
            .filter(|sender| sender.send(event.clone()).is_ok())
            .count()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }
}

/// Receiving end of an [`EventBus`] subscription.
pub struct Subscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<KeyboardEvent>,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next event, or `None` once the bus is gone and the queue drained.
    pub async fn recv(&mut self) -> Option<KeyboardEvent> {
        self.receiver.recv().await
    }

    /// Next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<KeyboardEvent> {
        self.receiver.try_recv().ok()
    }

    /// Everything currently queued.
    pub fn drain(&mut self) -> Vec<KeyboardEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.subscribers.write().remove(&self.id);
            trace!(subscription = self.id, "Unsubscribed from keyboard events");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyboardId;

    fn disconnected(path: &str) -> KeyboardEvent {
        KeyboardEvent::KeyboardDisconnected {
            id: KeyboardId::from_device_path(path),
        }
    }

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.publish(disconnected("/dev/hidraw0")), 2);
        assert_eq!(a.drain().len(), 1);
        assert_eq!(b.drain().len(), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(a);
        b.unsubscribe();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(disconnected("/dev/hidraw0")), 0);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        bus.publish(disconnected("/dev/hidraw0"));
        drop(bus);
        assert!(sub.try_recv().is_some());
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_recv_preserves_publish_order() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        bus.publish(disconnected("/dev/hidraw0"));
        bus.publish(disconnected("/dev/hidraw1"));

        let first = sub.recv().await.map(|e| e.keyboard_id().clone());
        let second = sub.recv().await.map(|e| e.keyboard_id().clone());
        assert_eq!(first, Some(KeyboardId::from_device_path("/dev/hidraw0")));
        assert_eq!(second, Some(KeyboardId::from_device_path("/dev/hidraw1")));
    }
}
