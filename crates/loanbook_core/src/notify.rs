//! Change notifications: observers register per collection and are called after each
//! committed mutation with "collection X changed" (no diff).

use crate::models::Collection;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;

type Callback = Arc<dyn Fn(Collection) + Send + Sync>;

struct Observer {
    id: u64,
    collections: Vec<Collection>,
    active: Arc<AtomicBool>,
    callback: Callback,
}

#[derive(Default)]
struct HubInner {
    next_id: AtomicU64,
    observers: Mutex<Vec<Observer>>,
}

impl HubInner {
    fn remove(&self, id: u64) {
        if let Ok(mut list) = self.observers.lock() {
            list.retain(|o| o.id != id);
        }
    }
}

/// Listener registry shared by a store and its subscriptions.
#[derive(Clone, Default)]
pub struct ChangeHub {
    inner: Arc<HubInner>,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `callback` after every change to `collection` until the returned
    /// subscription is unsubscribed or dropped.
    pub fn subscribe<F>(&self, collection: Collection, callback: F) -> Subscription
    where
        F: Fn(Collection) + Send + Sync + 'static,
    {
        self.subscribe_many(&[collection], callback)
    }

    pub fn subscribe_many<F>(&self, collections: &[Collection], callback: F) -> Subscription
    where
        F: Fn(Collection) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));
        let observer = Observer {
            id,
            collections: collections.to_vec(),
            active: active.clone(),
            callback: Arc::new(callback),
        };
        if let Ok(mut list) = self.inner.observers.lock() {
            list.push(observer);
        }
        Subscription {
            id,
            active,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Async flavour: every change to one of `collections` is queued on a channel.
    pub fn watch(&self, collections: &[Collection]) -> LiveQuery {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe_many(collections, move |c| {
            // Receiver gone means the LiveQuery is being dropped.
            let _ = tx.send(c);
        });
        LiveQuery { rx, subscription }
    }

    /// Tell every active observer of `collection` that it changed.
    /// Callbacks run outside the registry lock so they may subscribe or unsubscribe.
    pub fn notify(&self, collection: Collection) {
        let targets: Vec<(Arc<AtomicBool>, Callback)> = match self.inner.observers.lock() {
            Ok(list) => list
                .iter()
                .filter(|o| o.collections.contains(&collection))
                .map(|o| (o.active.clone(), o.callback.clone()))
                .collect(),
            Err(_) => return,
        };
        for (active, callback) in targets {
            if active.load(Ordering::Acquire) {
                callback(collection);
            }
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.lock().map(|l| l.len()).unwrap_or(0)
    }
}

/// Handle for one registered observer. Dropping it unsubscribes too.
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    hub: Weak<HubInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn detach(&mut self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Stream of change signals for a live view. Re-read the store on each signal.
pub struct LiveQuery {
    rx: mpsc::UnboundedReceiver<Collection>,
    subscription: Subscription,
}

impl LiveQuery {
    /// Wait for the next change. `None` once the store side is gone.
    pub async fn changed(&mut self) -> Option<Collection> {
        self.rx.recv().await
    }

    /// Next queued change without waiting.
    pub fn try_changed(&mut self) -> Option<Collection> {
        self.rx.try_recv().ok()
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    pub fn unsubscribe(self) {}
}
