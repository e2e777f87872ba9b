// SPDX-License-Identifier: MIT

//! State observers
//!
//! Each store owns an observer list that is notified with the committed
//! state after every mutation. Observers run after the state lock has been
//! released, so they may read the store or send to it.

use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

type Observer<S> = Arc<dyn Fn(&S) + Send + Sync>;

pub(crate) struct Observers<S> {
    entries: RwLock<Vec<(Uuid, Observer<S>)>>,
}

impl<S: 'static> Observers<S> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register an observer; it stays attached until the subscription drops
    pub(crate) fn attach<F>(self: &Arc<Self>, observer: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        self.entries.write().push((id, Arc::new(observer)));

        let list: Weak<Self> = Arc::downgrade(self);
        Subscription::new(id, move || {
            if let Some(list) = list.upgrade() {
                list.detach(&id);
            }
        })
    }

    fn detach(&self, id: &Uuid) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry, _)| entry != id);
        entries.len() != before
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Call every observer with `state`, in registration order
    pub(crate) fn notify(&self, state: &S) {
        // Snapshot first: observers may attach or detach while being notified.
        let observers: Vec<Observer<S>> = self
            .entries
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(state);
        }
    }
}

/// Keeps an observer attached to a store
///
/// Dropping the subscription detaches the observer.
#[must_use = "the observer is detached as soon as the subscription is dropped"]
pub struct Subscription {
    id: Uuid,
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new<F>(id: Uuid, detach: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            id,
            detach: Some(Box::new(detach)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Detach the observer now
    pub fn cancel(mut self) {
        self.run_detach();
    }

    fn run_detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_detach();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_notify_in_order() {
        let observers = Arc::new(Observers::<u32>::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        let _a = observers.attach(move |n| first.lock().push(("a", *n)));
        let second = seen.clone();
        let _b = observers.attach(move |n| second.lock().push(("b", *n)));

        observers.notify(&4);
        assert_eq!(*seen.lock(), vec![("a", 4), ("b", 4)]);
    }

    #[test]
    fn test_drop_detaches() {
        let observers = Arc::new(Observers::<u32>::new());
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let subscription = observers.attach(move |_| *counter.lock() += 1);
        assert_eq!(observers.len(), 1);

        observers.notify(&1);
        drop(subscription);
        observers.notify(&2);

        assert!(observers.is_empty());
        assert_eq!(*calls.lock(), 1);
    }

    #[test]
    fn test_cancel_detaches() {
        let observers = Arc::new(Observers::<u32>::new());
        let subscription = observers.attach(|_| {});
        subscription.cancel();
        assert!(observers.is_empty());
    }

    #[test]
    fn test_subscription_outlives_list() {
        let observers = Arc::new(Observers::<u32>::new());
        let subscription = observers.attach(|_| {});
        drop(observers);
        drop(subscription);
    }

    #[test]
    fn test_observer_may_detach_during_notify() {
        let observers = Arc::new(Observers::<u32>::new());
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let inner_slot = slot.clone();
        let subscription = observers.attach(move |_| {
            inner_slot.lock().take();
        });
        *slot.lock() = Some(subscription);

        observers.notify(&1);
        assert!(observers.is_empty());
    }
}
