//! Indirection between connections and the signal that issued them.
//!
//! A signal keeps its slot table inside a single heap-allocated socket and
//! holds the only strong reference to it. Connections hold a type-erased
//! [`Weak`](std::rc::Weak) to the same socket, so:
//!
//! - moving or swapping signals moves the `Rc`, never the socket, and every
//!   connection keeps resolving to the table it was issued from;
//! - dropping the signal drops the socket, and every outstanding connection
//!   observes an expired reference instead of a dangling one.
//!
//! # Borrowing
//!
//! The table sits in a `RefCell`. No user code ever runs while it is
//! borrowed: fires work from a snapshot, and removed callables are dropped
//! only after the borrow is released. Slots may therefore connect, close,
//! or clear from inside a fire.

use std::cell::RefCell;

use tracing::trace;

use super::table::{Slot, SlotKey, SlotTable, Snapshot};

/// The queries a connection is allowed to make, independent of the
/// signal's argument and return types.
pub(crate) trait Socket {
    /// Whether `key` is still registered.
    fn connected(&self, key: SlotKey) -> bool;

    /// Unregister `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not registered. Callers check [`Socket::connected`]
    /// first; reaching the panic means the bookkeeping is broken.
    fn disconnect(&self, key: SlotKey);
}

pub(crate) struct SignalSocket<A, R> {
    table: RefCell<SlotTable<A, R>>,
}

impl<A, R> SignalSocket<A, R> {
    pub(crate) fn new(table: SlotTable<A, R>) -> Self {
        Self {
            table: RefCell::new(table),
        }
    }

    pub(crate) fn insert(&self, slot: Slot<A, R>) -> SlotKey {
        self.table.borrow_mut().insert(slot)
    }

    pub(crate) fn snapshot(&self) -> Snapshot<A, R> {
        self.table.borrow().snapshot()
    }

    pub(crate) fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.table.borrow().is_empty()
    }

    /// Empty the table. Returns how many slots were removed.
    pub(crate) fn clear(&self) -> usize {
        let stale = self.table.borrow_mut().clear();
        let removed = stale.len();
        drop(stale);
        removed
    }
}

impl<A, R> Socket for SignalSocket<A, R> {
    fn connected(&self, key: SlotKey) -> bool {
        self.table.borrow().contains(key)
    }

    fn disconnect(&self, key: SlotKey) {
        let removed = self.table.borrow_mut().remove(key);
        assert!(removed.is_some(), "slot {key:?} is not registered");
        trace!(slot_id = key.id(), epoch = key.epoch(), "slot disconnected");
        drop(removed);
    }
}

impl<A, R> std::fmt::Debug for SignalSocket<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.table.try_borrow() {
            Ok(table) => f.debug_struct("SignalSocket").field("table", &*table).finish(),
            Err(_) => f.write_str("SignalSocket { <borrowed> }"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    fn socket() -> SignalSocket<(), ()> {
        SignalSocket::new(SlotTable::with_capacity(0))
    }

    #[test]
    fn disconnect_removes_the_key() {
        let socket = socket();
        let key = socket.insert(Rc::new(|_: &()| Some(())));

        assert!(socket.connected(key));
        socket.disconnect(key);
        assert!(!socket.connected(key));
        assert!(socket.is_empty());
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn disconnecting_an_unregistered_key_panics() {
        let socket = socket();
        let key = socket.insert(Rc::new(|_: &()| Some(())));

        socket.disconnect(key);
        socket.disconnect(key);
    }

    #[test]
    fn dropping_a_removed_slot_may_reenter_the_socket() {
        struct CloseOnDrop(Rc<SignalSocket<(), ()>>, SlotKey);

        impl Drop for CloseOnDrop {
            fn drop(&mut self) {
                if self.0.connected(self.1) {
                    self.0.disconnect(self.1);
                }
            }
        }

        let socket = Rc::new(socket());
        let other = socket.insert(Rc::new(|_: &()| Some(())));
        let guard = CloseOnDrop(Rc::clone(&socket), other);
        let key = socket.insert(Rc::new(move |_: &()| {
            let _ = &guard;
            Some(())
        }));
        assert_eq!(socket.len(), 2);

        socket.disconnect(key);
        assert_eq!(socket.len(), 0);
    }
}
