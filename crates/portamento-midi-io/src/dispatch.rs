//! Listener registry for decoded messages.
//!
//! Direct listeners run on the transport callback thread right after a
//! message is decoded. Deferred listeners run on the consumer thread when the
//! session is polled. Within each mode listeners run in registration order.
//!
//! The direct list is published through an [`ArcSwap`] shared with the
//! callback, so adding or removing a listener never blocks the callback.

use std::sync::Arc;

use arc_swap::ArcSwap;
use portamento_midi::Message;
use serde::{Deserialize, Serialize};

/// Where a listener runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeliveryMode {
    /// On the transport callback thread. Must not block.
    Direct,
    /// On the thread that calls [`InputSession::poll`](crate::InputSession::poll).
    #[default]
    Deferred,
}

/// Handle returned when registering a listener; pass it back to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerFn = Arc<dyn Fn(&Message, &[u8]) + Send + Sync>;

#[derive(Clone)]
struct Listener {
    id: ListenerId,
    callback: ListenerFn,
}

/// Read side of the direct listener list, owned by the transport callback.
#[derive(Clone)]
pub(crate) struct DirectListeners(Arc<ArcSwap<Vec<Listener>>>);

impl DirectListeners {
    #[inline]
    pub(crate) fn dispatch(&self, msg: &Message, raw: &[u8]) {
        let listeners = self.0.load();
        for listener in listeners.iter() {
            (listener.callback)(msg, raw);
        }
    }
}

pub struct DispatchRouter {
    next_id: u64,
    direct: Arc<ArcSwap<Vec<Listener>>>,
    deferred: Vec<Listener>,
}

impl DispatchRouter {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            direct: Arc::new(ArcSwap::from_pointee(Vec::new())),
            deferred: Vec::new(),
        }
    }

    /// Register a listener for decoded messages.
    pub fn add<F>(&mut self, mode: DeliveryMode, listener: F) -> ListenerId
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.insert(mode, Arc::new(move |msg: &Message, _: &[u8]| listener(msg)))
    }

    /// Register a listener that also receives the undecoded bytes.
    pub fn add_raw<F>(&mut self, mode: DeliveryMode, listener: F) -> ListenerId
    where
        F: Fn(&Message, &[u8]) + Send + Sync + 'static,
    {
        self.insert(mode, Arc::new(listener))
    }

    /// Returns `false` if `id` was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        if let Some(pos) = self.deferred.iter().position(|l| l.id == id) {
            self.deferred.remove(pos);
            return true;
        }

        let current = self.direct.load();
        if !current.iter().any(|l| l.id == id) {
            return false;
        }
        let remaining: Vec<Listener> = current.iter().filter(|l| l.id != id).cloned().collect();
        self.direct.store(Arc::new(remaining));
        true
    }

    pub fn len(&self) -> usize {
        self.direct.load().len() + self.deferred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run deferred listeners for one message.
    pub fn dispatch_deferred(&self, msg: &Message, raw: &[u8]) {
        for listener in &self.deferred {
            (listener.callback)(msg, raw);
        }
    }

    pub(crate) fn direct_listeners(&self) -> DirectListeners {
        DirectListeners(Arc::clone(&self.direct))
    }

    fn insert(&mut self, mode: DeliveryMode, callback: ListenerFn) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        let listener = Listener { id, callback };

        match mode {
            DeliveryMode::Deferred => self.deferred.push(listener),
            DeliveryMode::Direct => {
                let mut updated = Vec::clone(&self.direct.load());
                updated.push(listener);
                self.direct.store(Arc::new(updated));
            }
        }
        id
    }
}

impl Default for DispatchRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DispatchRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchRouter")
            .field("direct", &self.direct.load().len())
            .field("deferred", &self.deferred.len())
            .finish()
    }
}
