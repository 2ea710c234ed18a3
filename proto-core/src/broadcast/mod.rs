//! Signals and Slots
//!
//! This module implements a single-threaded publish/subscribe primitive.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A [`Signal`] owns an ordered table of callables (slots). Firing the
//! signal invokes each slot in the order it was connected.
//!
//! ## Connections
//!
//! Connecting a slot returns a [`Connection`]. The connection can be asked
//! whether its slot is still registered and can disconnect it. It never
//! keeps the signal alive: when the signal is dropped, or cleared, the
//! connection simply reports itself as invalid. A [`ScopedConnection`]
//! disconnects its slot when it goes out of scope.
//!
//! ## Receivers
//!
//! A type implementing [`Receiver`] carries a [`Connections`] set. Methods
//! bound with [`Signal::connect_method`] or [`Signal::connect_method_mut`]
//! are tracked there and disconnected when the receiver is dropped.
//!
//! # Implementation Notes
//!
//! Connections reach the slot table through a socket, a heap allocation
//! owned by the signal and referenced weakly by every connection. All
//! disconnect paths (a connection, a scoped connection going out of scope,
//! a receiver being dropped) end in the same socket call, which refuses to
//! remove a slot that is not registered.

mod connection;
mod receiver;
mod signal;
mod socket;
mod table;

pub use connection::{Connection, ScopedConnection};
pub use receiver::{Connections, Receiver};
pub use signal::Signal;
pub use table::SlotKey;
