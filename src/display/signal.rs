// Signal - Single-threaded repaint notification
//
// Listeners are plain closures registered under a unique id. Dispatch runs
// synchronously on the calling thread. Listeners may add or remove listeners
// (themselves included) while a dispatch is running; a listener removed
// mid-dispatch is not called afterwards.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Listener = Rc<dyn Fn()>;

/// Handle identifying one registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
}

impl Registry {
    fn contains(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|(lid, _)| *lid == id)
    }

    fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }
}

/// Repaint signal
///
/// Cloning yields another handle to the same listener list.
#[derive(Clone, Default)]
pub struct Signal {
    registry: Rc<Registry>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn add(&self, listener: impl Fn() + 'static) -> ListenerId {
        let id = ListenerId(self.registry.next_id.get());
        self.registry.next_id.set(id.0 + 1);
        self.registry
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        id
    }

    /// Unregister a listener
    ///
    /// Returns `false` if the id was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        self.registry.remove(id)
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.registry.contains(id)
    }

    pub fn listener_count(&self) -> usize {
        self.registry.listeners.borrow().len()
    }

    /// Notify every listener registered when dispatch starts
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self) -> usize {
        let snapshot: Vec<(ListenerId, Listener)> = self
            .registry
            .listeners
            .borrow()
            .iter()
            .map(|(id, listener)| (*id, Rc::clone(listener)))
            .collect();

        let mut invoked = 0;
        for (id, listener) in snapshot {
            if self.registry.contains(id) {
                listener();
                invoked += 1;
            }
        }
        invoked
    }

    /// Non-owning handle, used by subscriptions so they never keep a signal
    /// alive on their own
    pub fn downgrade(&self) -> WeakSignal {
        WeakSignal {
            registry: Rc::downgrade(&self.registry),
        }
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Weak handle to a [`Signal`]
#[derive(Clone, Debug)]
pub struct WeakSignal {
    registry: Weak<Registry>,
}

impl WeakSignal {
    /// Remove a listener if the signal still exists
    pub fn remove(&self, id: ListenerId) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(id),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_calls_listeners() {
        let signal = Signal::new();
        let hits = Rc::new(Cell::new(0));

        let h = Rc::clone(&hits);
        signal.add(move || h.set(h.get() + 1));
        let h = Rc::clone(&hits);
        signal.add(move || h.set(h.get() + 10));

        assert_eq!(signal.dispatch(), 2);
        assert_eq!(hits.get(), 11);
    }

    #[test]
    fn test_remove() {
        let signal = Signal::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let id = signal.add(move || h.set(h.get() + 1));
        assert!(signal.contains(id));

        assert!(signal.remove(id));
        assert!(!signal.contains(id));
        assert!(!signal.remove(id));
        assert_eq!(signal.dispatch(), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let signal = Signal::new();
        let a = signal.add(|| {});
        signal.remove(a);
        let b = signal.add(|| {});
        assert_ne!(a, b);
    }

    #[test]
    fn test_listener_removed_mid_dispatch_is_skipped() {
        let signal = Signal::new();
        let hits = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(None));

        let s = signal.clone();
        let victim = Rc::clone(&second);
        signal.add(move || {
            if let Some(id) = victim.get() {
                s.remove(id);
            }
        });
        let h = Rc::clone(&hits);
        second.set(Some(signal.add(move || h.set(h.get() + 1))));

        assert_eq!(signal.dispatch(), 1);
        assert_eq!(hits.get(), 0);
        assert_eq!(signal.listener_count(), 1);
    }

    #[test]
    fn test_weak_remove_after_drop() {
        let signal = Signal::new();
        let id = signal.add(|| {});
        let weak = signal.downgrade();
        assert!(weak.remove(id));

        let id = signal.add(|| {});
        drop(signal);
        assert!(!weak.remove(id));
    }
}
