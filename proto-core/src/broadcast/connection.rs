//! Connection handles.
//!
//! A [`Connection`] names one slot of one signal. It holds only a weak
//! reference to the signal's socket, so it never keeps the signal alive and
//! never dangles: once the signal is gone, the connection reports itself as
//! invalid.
//!
//! [`ScopedConnection`] owns a connection and closes it when dropped.

use std::fmt;
use std::rc::Weak;

use tracing::trace;

use crate::error::ConnectionError;

use super::socket::Socket;
use super::table::SlotKey;

/// Handle to one registered slot.
///
/// Connections are cheap to clone; every clone refers to the same slot, and
/// closing any of them disconnects it for all.
///
/// A default connection refers to nothing and is never valid.
#[derive(Clone, Default)]
pub struct Connection {
    key: SlotKey,
    socket: Option<Weak<dyn Socket>>,
}

impl Connection {
    pub(crate) fn new(key: SlotKey, socket: Weak<dyn Socket>) -> Self {
        Self {
            key,
            socket: Some(socket),
        }
    }

    /// The identifier of the slot within its signal.
    pub fn slot_id(&self) -> u64 {
        self.key.id()
    }

    /// The full key of the slot, including the clear epoch it was issued in.
    pub fn key(&self) -> SlotKey {
        self.key
    }

    /// Whether the slot is still registered with a live signal.
    pub fn valid(&self) -> bool {
        self.socket
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|socket| socket.connected(self.key))
    }

    /// Disconnect the slot if it is still registered.
    ///
    /// Closing a connection that is already closed, expired, or detached does
    /// nothing.
    pub fn close(&self) {
        if let Err(err) = self.disconnect() {
            trace!(slot_id = self.key.id(), reason = err.as_label(), "close had nothing to do");
        }
    }

    /// Disconnect the slot, reporting why nothing happened if it was not
    /// registered.
    pub fn disconnect(&self) -> Result<(), ConnectionError> {
        let socket = self.socket.as_ref().ok_or(ConnectionError::Detached)?;
        let socket = socket.upgrade().ok_or(ConnectionError::Expired {
            slot_id: self.key.id(),
        })?;

        if !socket.connected(self.key) {
            return Err(ConnectionError::NotConnected {
                slot_id: self.key.id(),
            });
        }

        socket.disconnect(self.key);
        Ok(())
    }
}

/// Two connections are equal when they were issued by the same signal for
/// the same slot.
impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        let same_socket = match (&self.socket, &other.socket) {
            (Some(a), Some(b)) => Weak::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_socket && self.key == other.key
    }
}

impl Eq for Connection {}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("slot_id", &self.key.id())
            .field("epoch", &self.key.epoch())
            .field("valid", &self.valid())
            .finish()
    }
}

/// A connection that is closed when this value is dropped.
///
/// Assigning over a `ScopedConnection` drops the old value, which closes the
/// connection it held.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScopedConnection {
    conn: Connection,
}

impl ScopedConnection {
    /// Take ownership of `conn`, closing it when this value is dropped.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Whether the wrapped slot is still registered with a live signal.
    pub fn valid(&self) -> bool {
        self.conn.valid()
    }

    /// The identifier of the wrapped slot within its signal.
    pub fn slot_id(&self) -> u64 {
        self.conn.slot_id()
    }

    /// Close the connection now. Dropping afterwards does nothing more.
    pub fn close(&self) {
        self.conn.close();
    }

    /// Give up ownership without closing, returning the plain connection.
    pub fn release(mut self) -> Connection {
        std::mem::take(&mut self.conn)
    }

    /// Borrow the wrapped connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl From<Connection> for ScopedConnection {
    fn from(conn: Connection) -> Self {
        Self::new(conn)
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        self.conn.close();
    }
}
