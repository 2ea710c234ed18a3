//! Slot Table
//!
//! The ordered registry of callables owned by exactly one signal.
//!
//! Identifiers come from a per-table counter that only moves forward, so
//! traversal in insertion order is traversal in ascending identifier order.
//! `clear` restarts the counter at 0 and advances the table's epoch; a key
//! carries the epoch it was issued in, which keeps keys from before a clear
//! from ever matching a slot registered after it.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

/// Identity of one registered slot within one signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SlotKey {
    epoch: u64,
    id: u64,
}

impl SlotKey {
    /// The slot identifier, unique within the epoch it was issued in.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The number of times the owning table had been cleared when this key
    /// was issued.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// A registered callable.
///
/// Free callables always produce `Some`. Callables bound to a subscriber
/// produce `None` once the subscriber is gone.
pub(crate) type Slot<A, R> = Rc<dyn Fn(&A) -> Option<R>>;

/// Slots captured at the start of a fire.
pub(crate) type Snapshot<A, R> = SmallVec<[(SlotKey, Slot<A, R>); 8]>;

pub(crate) struct SlotTable<A, R> {
    next_id: u64,
    epoch: u64,
    slots: IndexMap<u64, Slot<A, R>>,
}

impl<A, R> SlotTable<A, R> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            next_id: 0,
            epoch: 0,
            slots: IndexMap::with_capacity(capacity),
        }
    }

    /// Register a slot under the next identifier.
    pub(crate) fn insert(&mut self, slot: Slot<A, R>) -> SlotKey {
        let key = SlotKey {
            epoch: self.epoch,
            id: self.next_id,
        };
        self.next_id += 1;
        self.slots.insert(key.id, slot);
        key
    }

    pub(crate) fn contains(&self, key: SlotKey) -> bool {
        key.epoch == self.epoch && self.slots.contains_key(&key.id)
    }

    /// Remove a slot, keeping the order of the remaining ones.
    ///
    /// The removed callable is handed back so the caller decides where it
    /// gets dropped.
    pub(crate) fn remove(&mut self, key: SlotKey) -> Option<Slot<A, R>> {
        if key.epoch != self.epoch {
            return None;
        }
        self.slots.shift_remove(&key.id)
    }

    /// Remove every slot and restart identifiers at 0.
    ///
    /// Returns the removed slots for the same reason as [`Self::remove`].
    pub(crate) fn clear(&mut self) -> IndexMap<u64, Slot<A, R>> {
        self.next_id = 0;
        self.epoch = self.epoch.wrapping_add(1);
        std::mem::take(&mut self.slots)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Capture the current slots in ascending identifier order.
    pub(crate) fn snapshot(&self) -> Snapshot<A, R> {
        self.slots
            .iter()
            .map(|(&id, slot)| {
                let key = SlotKey {
                    epoch: self.epoch,
                    id,
                };
                (key, Rc::clone(slot))
            })
            .collect()
    }
}

impl<A, R> fmt::Debug for SlotTable<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotTable")
            .field("next_id", &self.next_id)
            .field("epoch", &self.epoch)
            .field("ids", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}
