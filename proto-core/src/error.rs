//! Error types.

use thiserror::Error;

/// Why a strict [`Connection::disconnect`](crate::Connection::disconnect)
/// had nothing to do.
///
/// [`Connection::close`](crate::Connection::close) treats all of these as
/// no-ops; they are only surfaced to callers that ask for them.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    /// The connection was default-constructed and never referred to a signal.
    #[error("connection is not attached to any signal")]
    Detached,

    /// The signal that issued the connection has been dropped.
    #[error("signal for slot {slot_id} no longer exists")]
    Expired {
        /// Identifier of the slot the connection referred to.
        slot_id: u64,
    },

    /// The signal exists but the slot was already removed, by an earlier
    /// close or by a clear.
    #[error("slot {slot_id} is not connected")]
    NotConnected {
        /// Identifier of the slot the connection referred to.
        slot_id: u64,
    },
}

impl ConnectionError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConnectionError::Detached => "connection_detached",
            ConnectionError::Expired { .. } => "connection_expired",
            ConnectionError::NotConnected { .. } => "connection_not_connected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_slot() {
        let err = ConnectionError::NotConnected { slot_id: 3 };
        assert_eq!(err.to_string(), "slot 3 is not connected");
        assert_eq!(err.as_label(), "connection_not_connected");
        assert_eq!(
            ConnectionError::Expired { slot_id: 1 }.to_string(),
            "signal for slot 1 no longer exists"
        );
    }
}
