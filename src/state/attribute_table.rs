//! A single lock-protected attribute category.

use std::collections::BTreeMap;

use crate::sync::{read, write, RwLock, RwLockWriteGuard};
use crate::PlayerId;

/// One attribute category keyed by player, guarded by its own lock.
///
/// A table never decides on its own whether a player exists. Readers and writers pass a
/// membership check which is evaluated while the table lock is held, so a value is only
/// observed or modified for a player that is registered at that instant.
pub struct AttributeTable<T> {
    name: &'static str,
    sentinel: T,
    values: RwLock<BTreeMap<PlayerId, T>>,
}

impl<T: Copy> AttributeTable<T> {
    /// Creates an empty table. `sentinel` is both the value a new player starts with
    /// and the value reported for unknown players.
    pub fn new(name: &'static str, sentinel: T) -> Self {
        Self {
            name,
            sentinel,
            values: RwLock::new(BTreeMap::new()),
        }
    }

    /// Category name used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The default/invalid value of this category.
    pub fn sentinel(&self) -> T {
        self.sentinel
    }

    /// Reads the value for `id` if `is_member(id)` holds while the table is locked.
    pub fn get(&self, id: PlayerId, is_member: impl FnOnce(PlayerId) -> bool) -> Option<T> {
        let values = read(&self.values);
        if !is_member(id) {
            return None;
        }
        values.get(&id).copied()
    }

    /// Overwrites the value for `id` in place.
    ///
    /// Returns `false` when the write was dropped because the player is not a member or
    /// has no slot. Never inserts.
    pub fn set(&self, id: PlayerId, value: T, is_member: impl FnOnce(PlayerId) -> bool) -> bool {
        let mut values = write(&self.values);
        if !is_member(id) {
            return false;
        }
        match values.get_mut(&id) {
            Some(slot) => {
                *slot = value;
                true
            },
            None => false,
        }
    }

    /// Exclusive access for membership changes, which must hold every table at once.
    pub(crate) fn lock_exclusive(&self) -> TableGuard<'_, T> {
        TableGuard {
            sentinel: self.sentinel,
            values: write(&self.values),
        }
    }

    /// Number of slots currently allocated, including slots of players hidden by
    /// `set_invalid`.
    pub fn slot_count(&self) -> usize {
        read(&self.values).len()
    }
}

impl<T> std::fmt::Debug for AttributeTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeTable")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Write guard over one table, held while players are added or removed.
pub(crate) struct TableGuard<'a, T> {
    sentinel: T,
    values: RwLockWriteGuard<'a, BTreeMap<PlayerId, T>>,
}

impl<T: Copy> TableGuard<'_, T> {
    /// Creates or resets the slot of `id` to the sentinel.
    pub(crate) fn reset(&mut self, id: PlayerId) {
        self.values.insert(id, self.sentinel);
    }

    /// Discards the slot of `id`, if any.
    pub(crate) fn discard(&mut self, id: PlayerId) {
        self.values.remove(&id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn table() -> AttributeTable<u8> {
        AttributeTable::new("battery_charge", 0)
    }

    #[test]
    fn set_never_inserts() {
        let table = table();
        assert!(!table.set(PlayerId::new(1), 50, |_| true));
        assert_eq!(table.slot_count(), 0);
        assert_eq!(table.get(PlayerId::new(1), |_| true), None);
    }

    #[test]
    fn reset_then_set_then_get() {
        let table = table();
        table.lock_exclusive().reset(PlayerId::new(1));
        assert_eq!(table.get(PlayerId::new(1), |_| true), Some(0));
        assert!(table.set(PlayerId::new(1), 50, |_| true));
        assert_eq!(table.get(PlayerId::new(1), |_| true), Some(50));

        table.lock_exclusive().reset(PlayerId::new(1));
        assert_eq!(table.get(PlayerId::new(1), |_| true), Some(0));
    }

    #[test]
    fn membership_check_hides_existing_slots() {
        let table = table();
        table.lock_exclusive().reset(PlayerId::new(2));
        assert_eq!(table.get(PlayerId::new(2), |_| false), None);
        assert!(!table.set(PlayerId::new(2), 9, |_| false));
        assert_eq!(table.get(PlayerId::new(2), |_| true), Some(0));
    }

    #[test]
    fn discard_removes_slot() {
        let table = table();
        let mut guard = table.lock_exclusive();
        guard.reset(PlayerId::new(3));
        guard.discard(PlayerId::new(3));
        guard.discard(PlayerId::new(4));
        drop(guard);
        assert_eq!(table.slot_count(), 0);
        assert_eq!(table.name(), "battery_charge");
        assert_eq!(table.sentinel(), 0);
    }
}
