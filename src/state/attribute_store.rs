//! The nine attribute categories of a team.

use crate::state::attribute_table::AttributeTable;
use crate::state::player_registry::PlayerRegistry;
use crate::types::{Angle, AngularSpeed, Position, Velocity};
use crate::PlayerId;

/// Per-player storage split into independently locked categories.
///
/// Lock order: the tables in field declaration order, then the registry. Single-category
/// accesses lock one table and then take a registry read lock inside it, so they never
/// contend with accesses to other categories.
#[derive(Debug)]
pub struct AttributeStore {
    pub(crate) position: AttributeTable<Position>,
    pub(crate) orientation: AttributeTable<Angle>,
    pub(crate) velocity: AttributeTable<Velocity>,
    pub(crate) angular_speed: AttributeTable<AngularSpeed>,
    pub(crate) ball_possession: AttributeTable<bool>,
    pub(crate) kick_enabled: AttributeTable<bool>,
    pub(crate) dribble_enabled: AttributeTable<bool>,
    pub(crate) battery_charge: AttributeTable<u8>,
    pub(crate) capacitor_charge: AttributeTable<u8>,
}

impl Default for AttributeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeStore {
    /// Creates a store with no player slots.
    pub fn new() -> Self {
        Self {
            position: AttributeTable::new("position", Position::INVALID),
            orientation: AttributeTable::new("orientation", Angle::INVALID),
            velocity: AttributeTable::new("velocity", Velocity::INVALID),
            angular_speed: AttributeTable::new("angular_speed", AngularSpeed::INVALID),
            ball_possession: AttributeTable::new("ball_possession", false),
            kick_enabled: AttributeTable::new("kick_enabled", false),
            dribble_enabled: AttributeTable::new("dribble_enabled", false),
            battery_charge: AttributeTable::new("battery_charge", 0),
            capacitor_charge: AttributeTable::new("capacitor_charge", 0),
        }
    }

    /// Resets every slot of `id` to its default and registers the player.
    ///
    /// All tables are held for the whole operation, so no reader can observe a player
    /// that is registered in some categories and not in others.
    pub(crate) fn add_player(&self, id: PlayerId, registry: &PlayerRegistry) {
        let mut position = self.position.lock_exclusive();
        let mut orientation = self.orientation.lock_exclusive();
        let mut velocity = self.velocity.lock_exclusive();
        let mut angular_speed = self.angular_speed.lock_exclusive();
        let mut ball_possession = self.ball_possession.lock_exclusive();
        let mut kick_enabled = self.kick_enabled.lock_exclusive();
        let mut dribble_enabled = self.dribble_enabled.lock_exclusive();
        let mut battery_charge = self.battery_charge.lock_exclusive();
        let mut capacitor_charge = self.capacitor_charge.lock_exclusive();

        position.reset(id);
        orientation.reset(id);
        velocity.reset(id);
        angular_speed.reset(id);
        ball_possession.reset(id);
        kick_enabled.reset(id);
        dribble_enabled.reset(id);
        battery_charge.reset(id);
        capacitor_charge.reset(id);

        registry.insert(id);
    }

    /// Unregisters `id` and discards its slots. Returns `true` if it was registered.
    pub(crate) fn remove_player(&self, id: PlayerId, registry: &PlayerRegistry) -> bool {
        let mut position = self.position.lock_exclusive();
        let mut orientation = self.orientation.lock_exclusive();
        let mut velocity = self.velocity.lock_exclusive();
        let mut angular_speed = self.angular_speed.lock_exclusive();
        let mut ball_possession = self.ball_possession.lock_exclusive();
        let mut kick_enabled = self.kick_enabled.lock_exclusive();
        let mut dribble_enabled = self.dribble_enabled.lock_exclusive();
        let mut battery_charge = self.battery_charge.lock_exclusive();
        let mut capacitor_charge = self.capacitor_charge.lock_exclusive();

        position.discard(id);
        orientation.discard(id);
        velocity.discard(id);
        angular_speed.discard(id);
        ball_possession.discard(id);
        kick_enabled.discard(id);
        dribble_enabled.discard(id);
        battery_charge.discard(id);
        capacitor_charge.discard(id);

        registry.remove(id)
    }

    /// Slot counts per category, in lock order.
    pub fn slot_counts(&self) -> [(&'static str, usize); 9] {
        [
            (self.position.name(), self.position.slot_count()),
            (self.orientation.name(), self.orientation.slot_count()),
            (self.velocity.name(), self.velocity.slot_count()),
            (self.angular_speed.name(), self.angular_speed.slot_count()),
            (self.ball_possession.name(), self.ball_possession.slot_count()),
            (self.kick_enabled.name(), self.kick_enabled.slot_count()),
            (self.dribble_enabled.name(), self.dribble_enabled.slot_count()),
            (self.battery_charge.name(), self.battery_charge.slot_count()),
            (self.capacitor_charge.name(), self.capacitor_charge.slot_count()),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn add_allocates_one_slot_per_category() {
        let store = AttributeStore::new();
        let registry = PlayerRegistry::new(true);
        store.add_player(PlayerId::new(1), &registry);
        store.add_player(PlayerId::new(1), &registry);
        store.add_player(PlayerId::new(2), &registry);

        for (name, count) in store.slot_counts() {
            assert_eq!(count, 2, "category {name}");
        }
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn re_add_resets_values() {
        let store = AttributeStore::new();
        let registry = PlayerRegistry::new(true);
        let id = PlayerId::new(4);
        store.add_player(id, &registry);
        let member = |p| registry.is_valid(p);
        assert!(store.battery_charge.set(id, 80, member));

        store.add_player(id, &registry);
        assert_eq!(store.battery_charge.get(id, |p| registry.is_valid(p)), Some(0));
    }

    #[test]
    fn remove_discards_all_slots() {
        let store = AttributeStore::new();
        let registry = PlayerRegistry::new(true);
        store.add_player(PlayerId::new(1), &registry);
        assert!(store.remove_player(PlayerId::new(1), &registry));
        assert!(!store.remove_player(PlayerId::new(1), &registry));

        for (name, count) in store.slot_counts() {
            assert_eq!(count, 0, "category {name}");
        }
    }
}
