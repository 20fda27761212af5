//! In-process live-push channel. Producers publish items for a stream;
//! every subscriber of that stream receives its own copy.

use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Identity of a conversation or feed. Subscriptions are scoped to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(pub u64);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct BusState<T> {
    next_id: u64,
    subscribers: IndexMap<u64, (StreamId, mpsc::UnboundedSender<T>)>,
}

pub struct PushBus<T> {
    state: Arc<Mutex<BusState<T>>>,
}

impl<T> Clone for PushBus<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for PushBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half of one subscription.
pub struct Subscription<T> {
    id: u64,
    stream: StreamId,
    receiver: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn stream(&self) -> StreamId {
        self.stream
    }

    /// Waits for the next item. `None` once the subscription was removed
    /// from the bus.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

impl<T> PushBus<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState {
                next_id: 1,
                subscribers: IndexMap::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BusState<T>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self, stream: StreamId) -> Subscription<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.insert(id, (stream, sender));

        Subscription {
            id,
            stream,
            receiver,
        }
    }

    /// Removes the subscription. Items already queued for it stay readable.
    pub fn unsubscribe(&self, subscription: &Subscription<T>) -> bool {
        self.lock().subscribers.shift_remove(&subscription.id).is_some()
    }

    pub fn subscriber_count(&self, stream: StreamId) -> usize {
        self.lock()
            .subscribers
            .values()
            .filter(|(subscribed, _)| *subscribed == stream)
            .count()
    }
}

impl<T: Clone> PushBus<T> {
    /// Delivers `item` to every live subscriber of `stream` and returns how
    /// many received it. Subscribers whose receiver was dropped are pruned.
    pub fn publish(&self, stream: StreamId, item: T) -> usize {
        let mut state = self.lock();
        let mut delivered = 0;
        state.subscribers.retain(|_, (subscribed, sender)| {
            if *subscribed != stream {
                return true;
            }
            match sender.send(item.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_stream_subscribers_only() {
        let bus = PushBus::new();
        let mut first = bus.subscribe(StreamId(1));
        let mut second = bus.subscribe(StreamId(1));
        let mut other = bus.subscribe(StreamId(2));

        assert_eq!(bus.publish(StreamId(1), "hello"), 2);

        assert_eq!(first.recv().await, Some("hello"));
        assert_eq!(second.recv().await, Some("hello"));
        assert_eq!(other.try_recv(), None);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = PushBus::new();
        let mut subscription = bus.subscribe(StreamId(1));

        assert!(bus.unsubscribe(&subscription));
        assert!(!bus.unsubscribe(&subscription));
        assert_eq!(bus.publish(StreamId(1), 7), 0);
        assert_eq!(subscription.try_recv(), None);
    }

    #[test]
    fn test_dropped_receivers_are_pruned() {
        let bus = PushBus::new();
        let subscription = bus.subscribe(StreamId(3));
        assert_eq!(bus.subscriber_count(StreamId(3)), 1);

        drop(subscription);

        assert_eq!(bus.publish(StreamId(3), 1), 0);
        assert_eq!(bus.subscriber_count(StreamId(3)), 0);
    }

    #[test]
    fn test_subscription_ids_are_unique() {
        let bus: PushBus<u8> = PushBus::new();
        let a = bus.subscribe(StreamId(1));
        let b = bus.subscribe(StreamId(1));

        assert_ne!(a.id(), b.id());
        assert_eq!(b.stream(), StreamId(1));
    }

    #[test]
    fn test_stream_id_display() {
        assert_eq!(StreamId(42).to_string(), "#42");
    }
}
