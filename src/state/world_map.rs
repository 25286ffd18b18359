//! Lookup from team number to shared team state.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::state::team::TeamState;
use crate::sync::{read, write, RwLock};
use crate::TeamNumber;

/// Anything that can resolve a team number to its [`TeamState`].
///
/// Inbound radio handlers only need this lookup; the wider world model that owns teams,
/// ball and field geometry lives outside this crate.
pub trait WorldMap: Send + Sync {
    /// Returns the team with the given number, if it is known.
    fn team(&self, number: TeamNumber) -> Option<Arc<TeamState>>;
}

impl<W: WorldMap + ?Sized> WorldMap for Arc<W> {
    fn team(&self, number: TeamNumber) -> Option<Arc<TeamState>> {
        (**self).team(number)
    }
}

/// A minimal [`WorldMap`]: a locked map of teams.
///
/// # Example
///
/// ```
/// use fieldstate::{TeamDirectory, TeamState, WorldMap};
/// use std::sync::Arc;
///
/// let directory = TeamDirectory::new();
/// directory.insert(Arc::new(TeamState::new(1, "Blue")));
///
/// assert_eq!(directory.team(1).map(|t| t.name()), Some("Blue".to_owned()));
/// assert!(directory.team(2).is_none());
/// ```
pub struct TeamDirectory {
    teams: RwLock<BTreeMap<TeamNumber, Arc<TeamState>>>,
}

impl Default for TeamDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TeamDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamDirectory")
            .field("teams", &self.team_numbers())
            .finish()
    }
}

impl TeamDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            teams: RwLock::new(BTreeMap::new()),
        }
    }

    /// Registers `team` under its current number, returning the team it replaced.
    pub fn insert(&self, team: Arc<TeamState>) -> Option<Arc<TeamState>> {
        let number = team.number();
        write(&self.teams).insert(number, team)
    }

    /// Registers `team` under an explicit number.
    pub fn insert_as(&self, number: TeamNumber, team: Arc<TeamState>) -> Option<Arc<TeamState>> {
        write(&self.teams).insert(number, team)
    }

    /// Removes the team registered under `number`.
    pub fn remove(&self, number: TeamNumber) -> Option<Arc<TeamState>> {
        write(&self.teams).remove(&number)
    }

    /// Team numbers in ascending order.
    pub fn team_numbers(&self) -> Vec<TeamNumber> {
        read(&self.teams).keys().copied().collect()
    }

    /// Number of registered teams.
    pub fn len(&self) -> usize {
        read(&self.teams).len()
    }

    /// Whether no team is registered.
    pub fn is_empty(&self) -> bool {
        read(&self.teams).is_empty()
    }
}

impl WorldMap for TeamDirectory {
    fn team(&self, number: TeamNumber) -> Option<Arc<TeamState>> {
        read(&self.teams).get(&number).cloned()
    }
}
