//! In-process subscription fan-out.
//!
//! # Responsibility
//! - Track open subscriptions per (scope, collection).
//! - Queue snapshot deliveries for the owning subscription to drain.
//!
//! # Invariants
//! - A cancelled or dropped subscription is unregistered immediately and
//!   never receives another delivery.
//! - Deliveries to one subscription keep their send order.
//! - Single-threaded: the hub lives behind `Rc`, not `Arc`.

use crate::model::collection::{Collection, CollectionSnapshot};
use crate::model::scope::UserScope;
use log::debug;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

pub type SubscriptionId = u64;

/// Payload delivered to a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    /// Full current contents of the subscribed collection.
    Snapshot(CollectionSnapshot),
    /// The store failed to produce a snapshot.
    Error(String),
}

struct Listener {
    scope: UserScope,
    collection: Collection,
    sender: Sender<SubscriptionEvent>,
}

/// Registry of open subscriptions for one store.
#[derive(Default)]
pub struct SubscriptionHub {
    next_id: Cell<SubscriptionId>,
    listeners: RefCell<BTreeMap<SubscriptionId, Listener>>,
}

impl SubscriptionHub {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Registers a listener and returns its receiving handle.
    pub fn register(self: &Rc<Self>, scope: &UserScope, collection: Collection) -> Subscription {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);

        let (sender, receiver) = mpsc::channel();
        self.listeners.borrow_mut().insert(
            id,
            Listener {
                scope: scope.clone(),
                collection,
                sender,
            },
        );
        debug!(
            "event=subscription_open module=store status=ok subscription_id={id} collection={collection}"
        );

        Subscription {
            id,
            collection,
            receiver,
            hub: Rc::clone(self),
        }
    }

    /// Whether any open subscription watches `collection` in `scope`.
    pub fn has_listeners(&self, scope: &UserScope, collection: Collection) -> bool {
        self.listeners
            .borrow()
            .values()
            .any(|listener| listener.collection == collection && &listener.scope == scope)
    }

    /// Queues `event` for every subscription on (`scope`, `collection`).
    ///
    /// Returns the number of subscriptions the event was queued for.
    pub fn publish(
        &self,
        scope: &UserScope,
        collection: Collection,
        event: &SubscriptionEvent,
    ) -> usize {
        let listeners = self.listeners.borrow();
        let mut delivered = 0;
        for listener in listeners
            .values()
            .filter(|listener| listener.collection == collection && &listener.scope == scope)
        {
            if listener.sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Queues `event` for one subscription only.
    pub fn deliver_to(&self, id: SubscriptionId, event: SubscriptionEvent) -> bool {
        self.listeners
            .borrow()
            .get(&id)
            .is_some_and(|listener| listener.sender.send(event).is_ok())
    }

    /// Number of open subscriptions across all scopes.
    pub fn active_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Number of open subscriptions in one scope.
    pub fn active_count_for(&self, scope: &UserScope) -> usize {
        self.listeners
            .borrow()
            .values()
            .filter(|listener| &listener.scope == scope)
            .count()
    }

    fn unregister(&self, id: SubscriptionId) -> bool {
        let removed = self.listeners.borrow_mut().remove(&id).is_some();
        if removed {
            debug!("event=subscription_close module=store status=ok subscription_id={id}");
        }
        removed
    }
}

/// Receiving end of one collection subscription.
///
/// Dropping the handle cancels the subscription.
pub struct Subscription {
    id: SubscriptionId,
    collection: Collection,
    receiver: Receiver<SubscriptionEvent>,
    hub: Rc<SubscriptionHub>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Takes the oldest queued delivery, if any.
    pub fn try_next(&self) -> Option<SubscriptionEvent> {
        self.receiver.try_recv().ok()
    }

    /// Unregisters from the hub and discards queued deliveries.
    pub fn cancel(self) {
        self.hub.unregister(self.id);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unregister(self.id);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("collection", &self.collection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{SubscriptionEvent, SubscriptionHub};
    use crate::model::collection::{Collection, CollectionSnapshot};
    use crate::model::scope::UserScope;

    fn scope(value: &str) -> UserScope {
        UserScope::parse(value).unwrap()
    }

    #[test]
    fn publish_reaches_only_matching_scope_and_collection() {
        let hub = SubscriptionHub::new();
        let alice_cycles = hub.register(&scope("alice"), Collection::Cycles);
        let alice_workouts = hub.register(&scope("alice"), Collection::Workouts);
        let bob_cycles = hub.register(&scope("bob"), Collection::Cycles);

        let event = SubscriptionEvent::Snapshot(CollectionSnapshot::empty(Collection::Cycles));
        assert_eq!(hub.publish(&scope("alice"), Collection::Cycles, &event), 1);

        assert_eq!(alice_cycles.try_next(), Some(event));
        assert_eq!(alice_workouts.try_next(), None);
        assert_eq!(bob_cycles.try_next(), None);
    }

    #[test]
    fn cancel_and_drop_unregister() {
        let hub = SubscriptionHub::new();
        let first = hub.register(&scope("alice"), Collection::Cycles);
        let second = hub.register(&scope("alice"), Collection::Workouts);
        assert_eq!(hub.active_count(), 2);

        first.cancel();
        assert_eq!(hub.active_count(), 1);
        drop(second);
        assert_eq!(hub.active_count(), 0);
        assert!(!hub.has_listeners(&scope("alice"), Collection::Cycles));
    }

    #[test]
    fn deliveries_keep_send_order() {
        let hub = SubscriptionHub::new();
        let subscription = hub.register(&scope("alice"), Collection::Cycles);
        hub.deliver_to(subscription.id(), SubscriptionEvent::Error("first".to_string()));
        hub.deliver_to(subscription.id(), SubscriptionEvent::Error("second".to_string()));

        assert_eq!(
            subscription.try_next(),
            Some(SubscriptionEvent::Error("first".to_string()))
        );
        assert_eq!(
            subscription.try_next(),
            Some(SubscriptionEvent::Error("second".to_string()))
        );
        assert_eq!(subscription.try_next(), None);
    }
}
