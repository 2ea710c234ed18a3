//! Receiver capability.
//!
//! A type that implements [`Receiver`] owns a [`Connections`] set. Every
//! method it binds through [`Signal::connect_method`] or
//! [`Signal::connect_method_mut`] is recorded there, and dropping the
//! receiver closes all of them.
//!
//! Bound methods are only accepted for receivers living in an `Rc`, which
//! fixes the receiver's address for as long as any slot can reach it.
//!
//! [`Signal::connect_method`]: super::Signal::connect_method
//! [`Signal::connect_method_mut`]: super::Signal::connect_method_mut

use std::cell::RefCell;
use std::fmt;

use tracing::debug;

use super::connection::Connection;

/// A subscriber whose bound connections are released when it is dropped.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use proto_core::{Connections, Receiver, Signal};
///
/// #[derive(Default)]
/// struct Logger {
///     connections: Connections,
/// }
///
/// impl Logger {
///     fn log(&self, line: &String) {
///         println!("{line}");
///     }
/// }
///
/// impl Receiver for Logger {
///     fn connections(&self) -> &Connections {
///         &self.connections
///     }
/// }
///
/// let signal: Signal<String> = Signal::new();
/// let logger = Rc::new(Logger::default());
/// let conn = signal.connect_method(&logger, Logger::log);
/// assert_eq!(logger.connections().num_connections(), 1);
///
/// drop(logger);
/// assert!(!conn.valid());
/// assert!(signal.is_empty());
/// ```
///
/// Binding a method of a type that is not a receiver does not compile:
///
/// ```compile_fail
/// use std::rc::Rc;
/// use proto_core::Signal;
///
/// struct Plain;
///
/// impl Plain {
///     fn on(&self, _: &i32) {}
/// }
///
/// let signal: Signal<i32> = Signal::new();
/// signal.connect_method(&Rc::new(Plain), Plain::on);
/// ```
pub trait Receiver {
    /// The set tracking this receiver's bound connections.
    fn connections(&self) -> &Connections;
}

/// Connections bound to one receiver.
///
/// Not `Clone`: the set belongs to exactly one receiver.
#[derive(Default)]
pub struct Connections {
    conns: RefCell<Vec<Connection>>,
}

impl Connections {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a connection.
    ///
    /// Entries that are no longer valid are pruned first so that a
    /// long-lived receiver reconnecting often does not accumulate them.
    pub(crate) fn append(&self, conn: Connection) {
        let mut conns = self.conns.borrow_mut();
        conns.retain(Connection::valid);
        conns.push(conn);
    }

    /// Number of recorded connections that are still valid.
    pub fn num_connections(&self) -> usize {
        self.conns.borrow().iter().filter(|conn| conn.valid()).count()
    }

    /// Close every recorded connection now.
    ///
    /// Dropping the set does the same.
    pub fn close_all(&self) {
        let conns = std::mem::take(&mut *self.conns.borrow_mut());
        let live = conns.iter().filter(|conn| conn.valid()).count();
        for conn in &conns {
            conn.close();
        }
        if live > 0 {
            debug!(closed = live, "receiver released its connections");
        }
    }
}

impl Drop for Connections {
    fn drop(&mut self) {
        self.close_all();
    }
}

impl fmt::Debug for Connections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connections")
            .field("recorded", &self.conns.borrow().len())
            .field("valid", &self.num_connections())
            .finish()
    }
}
