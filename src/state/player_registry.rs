//! Team membership.

use smallvec::SmallVec;
use std::collections::BTreeSet;

use crate::sync::{read, write, RwLock};
use crate::PlayerId;

/// Player list returned by [`PlayerRegistry::list`]. Teams rarely field more than a
/// dozen robots, so the list normally lives on the stack.
pub type PlayerList = SmallVec<[PlayerId; 16]>;

#[derive(Debug, Default)]
struct Membership {
    team_valid: bool,
    players: BTreeSet<PlayerId>,
}

/// The set of registered players of one team, together with the team validity flag.
///
/// Keeping the flag under the same lock as the set makes "team valid and player
/// registered" a single atomic observation.
pub struct PlayerRegistry {
    membership: RwLock<Membership>,
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}

impl std::fmt::Debug for PlayerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let membership = read(&self.membership);
        f.debug_struct("PlayerRegistry")
            .field("team_valid", &membership.team_valid)
            .field("players", &membership.players)
            .finish()
    }
}

impl PlayerRegistry {
    /// Creates an empty registry for a team with the given validity.
    pub fn new(team_valid: bool) -> Self {
        Self {
            membership: RwLock::new(Membership {
                team_valid,
                players: BTreeSet::new(),
            }),
        }
    }

    /// Registers `id`. Returns `true` if the player was not registered before.
    pub(crate) fn insert(&self, id: PlayerId) -> bool {
        write(&self.membership).players.insert(id)
    }

    /// Unregisters `id`. Returns `true` if the player was registered.
    pub(crate) fn remove(&self, id: PlayerId) -> bool {
        write(&self.membership).players.remove(&id)
    }

    /// Whether `id` is registered on a valid team.
    pub fn is_valid(&self, id: PlayerId) -> bool {
        let membership = read(&self.membership);
        membership.team_valid && membership.players.contains(&id)
    }

    /// Registered players in ascending id order, taken in one snapshot. Empty while the
    /// team is invalid.
    pub fn list(&self) -> PlayerList {
        let membership = read(&self.membership);
        if !membership.team_valid {
            return PlayerList::new();
        }
        membership.players.iter().copied().collect()
    }

    /// Number of players [`list`](Self::list) would return.
    pub fn len(&self) -> usize {
        let membership = read(&self.membership);
        if membership.team_valid {
            membership.players.len()
        } else {
            0
        }
    }

    /// Whether [`list`](Self::list) would be empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Marks the team invalid and drops all membership.
    pub(crate) fn clear(&self) {
        let mut membership = write(&self.membership);
        membership.team_valid = false;
        membership.players.clear();
    }

    /// Marks the team valid. Membership is untouched.
    pub(crate) fn mark_team_valid(&self) {
        write(&self.membership).team_valid = true;
    }

    /// Whether the owning team is valid.
    pub fn team_valid(&self) -> bool {
        read(&self.membership).team_valid
    }
}
