//! Listener registry for the inbound message stream.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::ClientError;
use crate::message::DecodedMessage;

/// Something observed on a connection's inbound side.
#[derive(Clone, Copy, Debug)]
pub enum ConnectionEvent<'a> {
    /// A decoded inbound message.
    Message(&'a DecodedMessage),
    /// The connection closed, optionally because of an error.
    Closed(Option<&'a ClientError>),
}

pub(crate) type Listener = Arc<dyn Fn(&ConnectionEvent<'_>) + Send + Sync>;

/// Listeners in registration order.
#[derive(Default)]
pub(crate) struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

impl Registry {
    pub(crate) fn insert(&mut self, listener: Listener) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.listeners.iter().any(|(existing, _)| *existing == id)
    }

    pub(crate) fn snapshot(&self) -> Vec<(u64, Listener)> {
        self.listeners.clone()
    }

    pub(crate) fn drain(&mut self) -> Vec<(u64, Listener)> {
        std::mem::take(&mut self.listeners)
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}

/// Handle to a registered listener.
///
/// Unsubscribing is idempotent and may happen from inside the listener while
/// it is being dispatched to. Dropping the handle does not unsubscribe.
#[derive(Clone, Debug)]
pub struct ListenerHandle {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl ListenerHandle {
    pub(crate) fn new(id: u64, registry: &Arc<Mutex<Registry>>) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
        }
    }

    /// Detach the listener. Returns whether it was still registered.
    pub fn unsubscribe(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.lock().remove(self.id),
            None => false,
        }
    }

    /// Whether the listener is still registered.
    pub fn is_subscribed(&self) -> bool {
        self.registry
            .upgrade()
            .map_or(false, |registry| registry.lock().contains(self.id))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("next_id", &self.next_id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Listener {
        Arc::new(|_: &ConnectionEvent<'_>| {})
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let registry = Arc::new(Mutex::new(Registry::default()));
        let id = registry.lock().insert(noop());
        let handle = ListenerHandle::new(id, &registry);

        assert!(handle.is_subscribed());
        assert!(handle.unsubscribe());
        assert!(!handle.unsubscribe());
        assert!(!handle.is_subscribed());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut registry = Registry::default();
        let a = registry.insert(noop());
        registry.remove(a);
        let b = registry.insert(noop());
        assert_ne!(a, b);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_handle_outliving_registry() {
        let registry = Arc::new(Mutex::new(Registry::default()));
        let id = registry.lock().insert(noop());
        let handle = ListenerHandle::new(id, &registry);
        drop(registry);
        assert!(!handle.unsubscribe());
    }
}
