//! dispatcher.rs — location fix broadcast
//!
//! Fans incoming fixes out to interested observers. Semantics are
//! deliberately minimal: delivery order matches arrival order, a fix
//! published with zero subscribers is dropped (at-most-once, no replay),
//! and cancelling one handle never affects the others.
//!
//! The dispatcher never starts or stops the location provider — the engine
//! facade owns that policy, keyed off [`FixDispatcher::subscriber_count`].

use std::sync::Mutex;

use tokio::sync::mpsc;
use trailwatch_types::LocationFix;

/// Opaque handle identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberHandle(u64);

/// A live subscription: keep the receiver, pass the handle back to
/// [`FixDispatcher::cancel`] when done.
pub struct FixSubscription {
    pub handle: SubscriberHandle,
    pub rx: mpsc::UnboundedReceiver<LocationFix>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    // Vec keeps subscribe order; the set stays tiny.
    senders: Vec<(u64, mpsc::UnboundedSender<LocationFix>)>,
}

/// Broadcast of location fixes with explicit subscribe/cancel.
#[derive(Default)]
pub struct FixDispatcher {
    registry: Mutex<Registry>,
}

impl FixDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> FixSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut reg = self.registry.lock().expect("dispatcher lock poisoned");
        reg.next_id += 1;
        let id = reg.next_id;
        reg.senders.push((id, tx));
        FixSubscription {
            handle: SubscriberHandle(id),
            rx,
        }
    }

    /// Remove a subscription. Safe to call repeatedly; returns whether the
    /// handle was still registered.
    pub fn cancel(&self, handle: SubscriberHandle) -> bool {
        let mut reg = self.registry.lock().expect("dispatcher lock poisoned");
        let before = reg.senders.len();
        reg.senders.retain(|(id, _)| *id != handle.0);
        reg.senders.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().expect("dispatcher lock poisoned").senders.len()
    }

    /// Deliver one fix to every live subscriber. Subscribers whose receiver
    /// was dropped are pruned here.
    pub fn publish(&self, fix: &LocationFix) {
        let mut reg = self.registry.lock().expect("dispatcher lock poisoned");
        reg.senders.retain(|(_, tx)| tx.send(*fix).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailwatch_types::LatLon;

    fn fix(n: i64) -> LocationFix {
        LocationFix {
            position: LatLon::new(45.0, 9.0),
            course_deg: 0.0,
            speed_mps: 1.0,
            timestamp_ms: n,
        }
    }

    #[test]
    fn delivers_in_arrival_order() {
        let d = FixDispatcher::new();
        let mut sub = d.subscribe();
        d.publish(&fix(1));
        d.publish(&fix(2));
        d.publish(&fix(3));
        assert_eq!(sub.rx.try_recv().unwrap().timestamp_ms, 1);
        assert_eq!(sub.rx.try_recv().unwrap().timestamp_ms, 2);
        assert_eq!(sub.rx.try_recv().unwrap().timestamp_ms, 3);
        assert!(sub.rx.try_recv().is_err());
    }

    #[test]
    fn zero_subscriber_publish_is_dropped() {
        let d = FixDispatcher::new();
        d.publish(&fix(1));
        // A later subscriber sees no replay
        let mut sub = d.subscribe();
        assert!(sub.rx.try_recv().is_err());
    }

    #[test]
    fn cancel_is_idempotent_and_isolated() {
        let d = FixDispatcher::new();
        let mut a = d.subscribe();
        let mut b = d.subscribe();
        assert_eq!(d.subscriber_count(), 2);

        assert!(d.cancel(a.handle));
        assert!(!d.cancel(a.handle));
        assert!(!d.cancel(a.handle));
        assert_eq!(d.subscriber_count(), 1);

        d.publish(&fix(9));
        assert!(a.rx.try_recv().is_err());
        assert_eq!(b.rx.try_recv().unwrap().timestamp_ms, 9);
    }

    #[test]
    fn dropped_receivers_are_pruned_on_publish() {
        let d = FixDispatcher::new();
        let sub = d.subscribe();
        drop(sub.rx);
        assert_eq!(d.subscriber_count(), 1);
        d.publish(&fix(1));
        assert_eq!(d.subscriber_count(), 0);
    }
}
