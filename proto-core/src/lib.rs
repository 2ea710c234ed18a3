//! Proto Core
//!
//! Typed signals and slots with safe connection lifetimes.
//!
//! - [`Signal`] broadcasts to an ordered set of callables.
//! - [`Connection`] and [`ScopedConnection`] name a single subscription and
//!   stay safe to use after the signal is moved, swapped, cleared, or
//!   dropped.
//! - [`Receiver`] lets a subscriber type have its subscriptions released
//!   automatically when it is dropped.
//!
//! Everything here is single-threaded and synchronous. Callers that need to
//! share a signal across threads must wrap the whole signal in their own
//! lock.
//!
//! # Example
//!
//! ```
//! use proto_core::{Signal, ScopedConnection};
//!
//! let signal: Signal<(), i32> = Signal::new();
//! signal.connect(|_| 1);
//! {
//!     let _scoped: ScopedConnection = signal.connect_scoped(|_| 2);
//!     let mut out = Vec::new();
//!     signal.collect(&mut out, ());
//!     assert_eq!(out, vec![1, 2]);
//! }
//! assert_eq!(signal.size(), 1);
//! ```

pub mod broadcast;
pub mod error;

pub use broadcast::{Connection, Connections, Receiver, ScopedConnection, Signal, SlotKey};
pub use error::ConnectionError;
