//! Signal Implementation
//!
//! A [`Signal`] is a typed broadcaster. Callables are connected to it, and
//! firing the signal invokes every connected callable in the order it was
//! connected.
//!
//! # Ownership
//!
//! The signal owns its slot table through the only strong reference to a
//! heap-allocated socket. Each [`Connection`] holds a weak reference to that
//! socket. Moving a signal moves the reference, not the socket, so
//! connections issued before a move keep working on the moved-to value.
//! Dropping the signal releases the socket and every connection turns
//! invalid.
//!
//! # Firing
//!
//! [`Signal::emit`] and [`Signal::collect`] capture the connected slots
//! before invoking any of them, and check each slot is still connected right
//! before invoking it. A slot may connect, close, or clear while a fire is
//! running:
//!
//! - slots closed during the fire are skipped for the rest of it;
//! - slots connected during the fire are first invoked by the next one.
//!
//! A slot that panics aborts the fire. Later slots are not invoked and the
//! panic reaches the caller unchanged.
//!
//! # Threading
//!
//! Signals, connections, and receivers are `!Send` and `!Sync`. Everything
//! runs to completion on the calling thread.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::connection::{Connection, ScopedConnection};
use super::receiver::Receiver;
use super::socket::{SignalSocket, Socket};
use super::table::{Slot, SlotTable};

/// A typed broadcaster.
///
/// # Type Parameters
///
/// - `A`: The argument passed to each slot by reference. Use a tuple for
///   several values and `()` for none.
/// - `R`: The value each slot returns. Ignored by [`Signal::emit`],
///   gathered by [`Signal::collect`].
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use proto_core::Signal;
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let signal: Signal<i32> = Signal::new();
///
/// let sink = Rc::clone(&seen);
/// let conn = signal.connect(move |value| sink.borrow_mut().push(*value));
///
/// signal.emit(1);
/// conn.close();
/// signal.emit(2);
///
/// assert_eq!(*seen.borrow(), vec![1]);
/// ```
pub struct Signal<A, R = ()> {
    socket: Rc<SignalSocket<A, R>>,
}

impl<A: 'static, R: 'static> Signal<A, R> {
    /// Create a signal with no slots.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a signal with room for `capacity` slots before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            socket: Rc::new(SignalSocket::new(SlotTable::with_capacity(capacity))),
        }
    }

    /// Connect a callable.
    pub fn connect<F>(&self, slot: F) -> Connection
    where
        F: Fn(&A) -> R + 'static,
    {
        self.register(Rc::new(move |args: &A| Some(slot(args))))
    }

    /// Connect a callable and close it when the returned guard is dropped.
    pub fn connect_scoped<F>(&self, slot: F) -> ScopedConnection
    where
        F: Fn(&A) -> R + 'static,
    {
        ScopedConnection::from(self.connect(slot))
    }

    /// Connect a method of a receiver through a shared reference.
    ///
    /// The slot holds the receiver weakly. The connection is recorded in the
    /// receiver's [`Connections`](super::Connections) and closed when the
    /// receiver is dropped.
    pub fn connect_method<T, F>(&self, receiver: &Rc<T>, method: F) -> Connection
    where
        T: Receiver + 'static,
        F: Fn(&T, &A) -> R + 'static,
    {
        let weak = Rc::downgrade(receiver);
        let conn = self.register(Rc::new(move |args: &A| {
            weak.upgrade().map(|receiver| method(&*receiver, args))
        }));
        receiver.connections().append(conn.clone());
        conn
    }

    /// Connect a method of a receiver that needs exclusive access.
    ///
    /// Behaves like [`Signal::connect_method`], borrowing the receiver
    /// mutably for each invocation.
    ///
    /// # Panics
    ///
    /// Panics if the receiver is mutably borrowed when connecting, or
    /// borrowed at all when the signal fires (for example, a receiver
    /// method that fires a signal it is itself connected to).
    pub fn connect_method_mut<T, F>(&self, receiver: &Rc<RefCell<T>>, method: F) -> Connection
    where
        T: Receiver + 'static,
        F: Fn(&mut T, &A) -> R + 'static,
    {
        let weak: Weak<RefCell<T>> = Rc::downgrade(receiver);
        let conn = self.register(Rc::new(move |args: &A| {
            weak.upgrade().map(|receiver| {
                let mut receiver = receiver.borrow_mut();
                method(&mut *receiver, args)
            })
        }));
        receiver.borrow().connections().append(conn.clone());
        conn
    }

    fn register(&self, slot: Slot<A, R>) -> Connection {
        let key = self.socket.insert(slot);
        trace!(slot_id = key.id(), epoch = key.epoch(), "slot connected");

        let weak = Rc::downgrade(&self.socket);
        let socket: Weak<dyn Socket> = weak;
        Connection::new(key, socket)
    }

    /// Invoke every connected slot with `args`, in connection order.
    pub fn emit(&self, args: A) {
        let snapshot = self.socket.snapshot();
        trace!(slots = snapshot.len(), "emitting signal");

        for (key, slot) in snapshot {
            if self.socket.connected(key) {
                slot(&args);
            }
        }
    }

    /// Invoke every connected slot with `args`, appending each return value
    /// to `sink` in connection order.
    ///
    /// Slots returning a zero-sized type carry nothing to collect, so this
    /// is rejected when the signal is built:
    ///
    /// ```compile_fail
    /// use proto_core::Signal;
    ///
    /// let signal: Signal<i32> = Signal::new();
    /// let mut out = Vec::new();
    /// signal.collect(&mut out, 1);
    /// ```
    pub fn collect<E>(&self, sink: &mut E, args: A)
    where
        E: Extend<R>,
    {
        #[allow(clippy::let_unit_value)]
        let () = Collectable::<R>::CHECK;

        let snapshot = self.socket.snapshot();
        trace!(slots = snapshot.len(), "collecting signal");

        for (key, slot) in snapshot {
            if !self.socket.connected(key) {
                continue;
            }
            if let Some(value) = slot(&args) {
                sink.extend(Some(value));
            }
        }
    }

    /// Number of connected slots.
    pub fn size(&self) -> usize {
        self.socket.len()
    }

    /// Whether no slot is connected.
    pub fn is_empty(&self) -> bool {
        self.socket.is_empty()
    }

    /// Disconnect every slot and restart identifiers at 0.
    ///
    /// Every connection issued so far becomes invalid and stays invalid,
    /// including ones whose identifier is handed out again afterwards.
    pub fn clear(&self) {
        let removed = self.socket.clear();
        trace!(removed, "signal cleared");
    }

    /// Exchange the slots of two signals.
    ///
    /// Connections follow their slots: a connection issued by `self` now
    /// refers to `other`, and the other way round.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.socket, &mut other.socket);
        trace!(left = self.size(), right = other.size(), "signals swapped");
    }
}

/// Compile-time guard for [`Signal::collect`].
struct Collectable<R>(PhantomData<R>);

impl<R> Collectable<R> {
    const CHECK: () = assert!(
        std::mem::size_of::<R>() != 0,
        "cannot collect from slots returning a zero-sized type"
    );
}

impl<A: 'static, R: 'static> Default for Signal<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> Drop for Signal<A, R> {
    fn drop(&mut self) {
        let remaining = self.socket.len();
        if remaining > 0 {
            debug!(remaining, "signal dropped with connected slots");
        }
    }
}

impl<A, R> fmt::Debug for Signal<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("socket", &self.socket)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::broadcast::Connections;

    fn recorder() -> (Rc<RefCell<Vec<i32>>>, impl Fn(i32) -> Box<dyn Fn(&()) + 'static>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |value: i32| -> Box<dyn Fn(&()) + 'static> {
            let sink = Rc::clone(&sink);
            Box::new(move |_: &()| sink.borrow_mut().push(value))
        };
        (log, make)
    }

    #[test]
    fn emit_runs_slots_in_connection_order() {
        let signal: Signal<()> = Signal::new();
        let (log, make) = recorder();

        signal.connect(make(1));
        signal.connect(make(2));
        signal.connect(make(3));
        signal.emit(());

        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn emit_passes_arguments() {
        let signal: Signal<(i32, i32)> = Signal::new();
        let total = Rc::new(Cell::new(0));

        let sum = Rc::clone(&total);
        signal.connect(move |(a, b)| sum.set(sum.get() + a + b));
        signal.emit((2, 3));
        signal.emit((4, 5));

        assert_eq!(total.get(), 14);
    }

    #[test]
    fn collect_appends_return_values_in_order() {
        let signal: Signal<(), i32> = Signal::new();
        signal.connect(|_| 1);
        signal.connect(|_| 2);
        signal.connect(|_| 3);

        let mut out = vec![0];
        signal.collect(&mut out, ());

        assert_eq!(out, vec![0, 1, 2, 3]);
        assert_eq!(out.iter().sum::<i32>(), 6);
    }

    #[test]
    fn size_tracks_valid_connections() {
        let signal: Signal<()> = Signal::with_capacity(4);
        assert!(signal.is_empty());

        let a = signal.connect(|_| {});
        let b = signal.connect(|_| {});
        let c = signal.connect(|_| {});
        assert_eq!(signal.size(), 3);

        b.close();
        assert_eq!(signal.size(), 2);
        let valid = [&a, &b, &c].iter().filter(|conn| conn.valid()).count();
        assert_eq!(valid, signal.size());
    }

    #[test]
    fn clear_invalidates_connections_for_good() {
        let signal: Signal<()> = Signal::new();
        let old = signal.connect(|_| {});
        let older = signal.connect(|_| {});

        signal.clear();
        assert!(signal.is_empty());
        assert!(!old.valid());
        assert!(!older.valid());

        let fresh = signal.connect(|_| {});
        assert_eq!(fresh.slot_id(), old.slot_id());
        assert!(fresh.valid());
        assert!(!old.valid());
        assert_ne!(fresh, old);

        old.close();
        assert_eq!(signal.size(), 1);
    }

    #[test]
    fn dropping_the_signal_invalidates_connections() {
        let signal: Signal<()> = Signal::new();
        let conn = signal.connect(|_| {});

        drop(signal);
        assert!(!conn.valid());
        conn.close();
    }

    #[test]
    fn moving_keeps_connections_bound() {
        let signal: Signal<()> = Signal::new();
        let first = signal.connect(|_| {});
        let second = signal.connect(|_| {});

        let moved = signal;
        assert!(first.valid());
        assert!(second.valid());

        first.close();
        assert_eq!(moved.size(), 1);
    }

    #[test]
    fn taking_leaves_an_empty_signal() {
        let mut signal: Signal<()> = Signal::new();
        let conn = signal.connect(|_| {});

        let taken = std::mem::take(&mut signal);
        assert!(signal.is_empty());
        assert_eq!(taken.size(), 1);
        assert!(conn.valid());

        signal.connect(|_| {});
        conn.close();
        assert!(taken.is_empty());
        assert_eq!(signal.size(), 1);
    }

    #[test]
    fn swap_moves_connections_with_their_slots() {
        let mut left: Signal<()> = Signal::new();
        let mut right: Signal<()> = Signal::new();
        let l = left.connect(|_| {});
        let r1 = right.connect(|_| {});
        let _r2 = right.connect(|_| {});

        left.swap(&mut right);
        assert_eq!(left.size(), 2);
        assert_eq!(right.size(), 1);

        r1.close();
        assert_eq!(left.size(), 1);
        l.close();
        assert!(right.is_empty());
    }

    #[test]
    fn slot_closed_during_fire_is_skipped() {
        let signal: Signal<()> = Signal::new();
        let (log, make) = recorder();
        let victim = Rc::new(RefCell::new(Connection::default()));

        let target = Rc::clone(&victim);
        signal.connect(move |_| target.borrow().close());
        *victim.borrow_mut() = signal.connect(make(2));
        signal.emit(());

        assert!(log.borrow().is_empty());
        assert_eq!(signal.size(), 1);
    }

    #[test]
    fn slot_connected_during_fire_waits_for_next_fire() {
        let signal = Rc::new(Signal::<()>::new());
        let (log, make) = recorder();
        let make = Rc::new(make);

        let weak = Rc::downgrade(&signal);
        let factory = Rc::clone(&make);
        let once = Cell::new(false);
        signal.connect(move |_| {
            if !once.replace(true) {
                if let Some(signal) = weak.upgrade() {
                    signal.connect(factory(7));
                }
            }
        });

        signal.emit(());
        assert!(log.borrow().is_empty());
        signal.emit(());
        assert_eq!(*log.borrow(), vec![7]);
    }

    #[test]
    fn slot_may_clear_its_own_signal() {
        let signal = Rc::new(Signal::<()>::new());
        let (log, make) = recorder();

        let weak = Rc::downgrade(&signal);
        signal.connect(move |_| {
            if let Some(signal) = weak.upgrade() {
                signal.clear();
            }
        });
        signal.connect(make(1));
        signal.emit(());

        assert!(log.borrow().is_empty());
        assert!(signal.is_empty());
    }

    #[test]
    fn mutable_method_receives_exclusive_access() {
        #[derive(Default)]
        struct Total {
            sum: i32,
            connections: Connections,
        }

        impl Total {
            fn add(&mut self, value: &i32) -> i32 {
                self.sum += value;
                self.sum
            }
        }

        impl Receiver for Total {
            fn connections(&self) -> &Connections {
                &self.connections
            }
        }

        let signal: Signal<i32, i32> = Signal::new();
        let total = Rc::new(RefCell::new(Total::default()));
        signal.connect_method_mut(&total, Total::add);

        let mut out = Vec::new();
        signal.collect(&mut out, 5);
        signal.collect(&mut out, 10);
        assert_eq!(out, vec![5, 15]);
        assert_eq!(total.borrow().connections().num_connections(), 1);

        drop(total);
        assert!(signal.is_empty());
    }

    #[test]
    #[should_panic(expected = "subscriber failed")]
    fn panicking_slot_propagates_to_caller() {
        let signal: Signal<()> = Signal::new();
        signal.connect(|_| panic!("subscriber failed"));
        signal.emit(());
    }
}
