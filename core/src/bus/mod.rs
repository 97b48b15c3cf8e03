//! Rewind event bus
//!
//! A per-level publish/subscribe register for the "rewind occurred"
//! notification. The notification carries no payload.
//!
//! # Delivery
//!
//! - [`RewindBus::publish`] delivers synchronously to every current subscriber.
//! - [`RewindBus::raise`] only queues the notification. Components call it
//!   from inside their own step (while the scheduler still holds them
//!   mutably) and the scheduler calls [`RewindBus::flush`] right after, so
//!   delivery still happens within the same tick.
//! - A publish issued while a dispatch is in progress is queued and delivered
//!   after the current pass. Subscribers are never invoked recursively.
//!
//! Subscribers must not rely on invocation order.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use hashbrown::HashMap;


type Callback = Rc<RefCell<dyn FnMut()>>;

/// Receives rewind notifications through [`RewindBus::subscribe_listener`]
pub trait RewindListener {
    fn on_rewind(&mut self);
}

/// Identity of one subscription, returned by [`RewindBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<u64, Callback>,
    /// Notifications waiting for delivery
    pending: u32,
    dispatching: bool,
    published: u64,
}

/// Cheap-clone handle to a level's rewind register
#[derive(Clone, Default)]
pub struct RewindBus {
    inner: Rc<RefCell<Registry>>,
}

impl RewindBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zero-argument callback
    pub fn subscribe(&self, callback: impl FnMut() + 'static) -> SubscriptionHandle {
        let mut registry = self.inner.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .subscribers
            .insert(id, Rc::new(RefCell::new(callback)));
        SubscriptionHandle(id)
    }

    /// Register a shared component without keeping it alive
    ///
    /// The callback holds a weak reference. Once the owner is dropped the
    /// callback is skipped; the owner should still unsubscribe on teardown.
    pub fn subscribe_listener<T: RewindListener + 'static>(
        &self,
        listener: &Rc<RefCell<T>>,
    ) -> SubscriptionHandle {
        let weak: Weak<RefCell<T>> = Rc::downgrade(listener);
        self.subscribe(move || match weak.upgrade() {
            Some(listener) => listener.borrow_mut().on_rewind(),
            None => tracing::warn!("rewind listener dropped without unsubscribing"),
        })
    }

    /// Remove a subscription. Returns `false` if the handle was not registered.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.inner
            .borrow_mut()
            .subscribers
            .remove(&handle.0)
            .is_some()
    }

    /// Queue a rewind notification and deliver everything pending
    pub fn publish(&self) {
        self.raise();
        self.flush();
    }

    /// Queue a rewind notification without delivering it yet
    pub fn raise(&self) {
        self.inner.borrow_mut().pending += 1;
    }

    /// Deliver every pending notification
    ///
    /// Each pending notification invokes every subscriber registered at the
    /// time that pass starts and still registered when its turn comes. Returns the number of notifications delivered.
    pub fn flush(&self) -> u32 {
        {
            let mut registry = self.inner.borrow_mut();
            if registry.dispatching || registry.pending == 0 {
                return 0;
            }
            registry.dispatching = true;
        }

        let mut delivered = 0;
        loop {
            // Snapshot the subscriber list so callbacks may (un)subscribe freely
            let callbacks: Vec<(u64, Callback)> = {
                let mut registry = self.inner.borrow_mut();
                if registry.pending == 0 {
                    registry.dispatching = false;
                    break;
                }
                registry.pending -= 1;
                registry.published += 1;
                registry
                    .subscribers
                    .iter()
                    .map(|(id, callback)| (*id, callback.clone()))
                    .collect()
            };

            tracing::debug!(subscribers = callbacks.len(), "dispatching rewind");
            for (id, callback) in callbacks {
                // Unsubscribed earlier in this pass
                if !self.inner.borrow().subscribers.contains_key(&id) {
                    continue;
                }
                (&mut *callback.borrow_mut())();
            }
            delivered += 1;
        }
        delivered
    }

    /// Number of notifications waiting for [`flush`](Self::flush)
    pub fn pending(&self) -> u32 {
        self.inner.borrow().pending
    }

    /// Number of current subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Total notifications delivered since creation
    pub fn published_count(&self) -> u64 {
        self.inner.borrow().published
    }
}

impl std::fmt::Debug for RewindBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.inner.borrow();
        f.debug_struct("RewindBus")
            .field("subscribers", &registry.subscribers.len())
            .field("pending", &registry.pending)
            .field("published", &registry.published)
            .finish()
    }
}
