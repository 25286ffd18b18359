//! Concurrent per-team player state.

use std::sync::Arc;

use crate::state::attribute_store::AttributeStore;
use crate::state::attribute_table::AttributeTable;
use crate::state::player_registry::{PlayerList, PlayerRegistry};
use crate::sync::{read, write, RwLock};
use crate::telemetry::{
    report_to_observer, DiagnosticKind, DiagnosticObserver, DiagnosticSeverity, SharedObserver,
};
use crate::types::{Angle, AngularSpeed, Position, Velocity};
use crate::{diagnostic, PlayerId, TeamNumber};

#[derive(Debug, Clone, Default)]
struct TeamInfo {
    number: TeamNumber,
    name: String,
}

/// Every per-player attribute of one team, safe to share between a control loop, game
/// logic and inbound radio handlers.
///
/// Each attribute category has its own lock, so a writer updating battery charge never
/// blocks a reader polling positions. Reads for unknown players return the category's
/// sentinel ([`Position::INVALID`], `false`, `0`, ...) and writes for unknown players
/// are dropped. Both are reported as [`DiagnosticKind::InvalidPlayer`] diagnostics and
/// never surface as errors.
///
/// While the team is invalid (see [`set_invalid`](Self::set_invalid)) every player
/// counts as unknown.
///
/// # Example
///
/// ```
/// use fieldstate::{PlayerId, Position, TeamState};
///
/// let team = TeamState::new(1, "Blue");
/// let striker = PlayerId::new(3);
/// team.add_player(striker);
///
/// team.set_position(striker, Position::new(1.5, -0.2));
/// team.set_player_battery_charge(striker, 200);
///
/// assert!(team.position(striker).valid);
/// assert_eq!(team.battery_charge(striker), 200);
///
/// team.remove_player(striker);
/// assert_eq!(team.battery_charge(striker), 0);
/// ```
pub struct TeamState {
    info: RwLock<TeamInfo>,
    registry: PlayerRegistry,
    store: AttributeStore,
    observer: Option<SharedObserver>,
}

impl Default for TeamState {
    fn default() -> Self {
        Self::invalid()
    }
}

impl std::fmt::Debug for TeamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let info = read(&self.info).clone();
        f.debug_struct("TeamState")
            .field("number", &info.number)
            .field("name", &info.name)
            .field("registry", &self.registry)
            .field("has_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl TeamState {
    /// Creates a valid team with no players.
    pub fn new(number: TeamNumber, name: impl Into<String>) -> Self {
        Self {
            info: RwLock::new(TeamInfo {
                number,
                name: name.into(),
            }),
            registry: PlayerRegistry::new(true),
            store: AttributeStore::new(),
            observer: None,
        }
    }

    /// Creates an invalid team. It becomes valid once a number or name is assigned.
    pub fn invalid() -> Self {
        Self {
            info: RwLock::new(TeamInfo::default()),
            registry: PlayerRegistry::new(false),
            store: AttributeStore::new(),
            observer: None,
        }
    }

    /// Routes this team's diagnostics to `observer` instead of the tracing fallback.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DiagnosticObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    // ---------------------------------------------------------------------
    // Team info
    // ---------------------------------------------------------------------

    /// The team number.
    pub fn number(&self) -> TeamNumber {
        read(&self.info).number
    }

    /// The team name.
    pub fn name(&self) -> String {
        read(&self.info).name.clone()
    }

    /// Whether the team is valid.
    pub fn is_valid(&self) -> bool {
        self.registry.team_valid()
    }

    /// Assigns the team number. This also makes the team valid again.
    pub fn set_number(&self, number: TeamNumber) {
        write(&self.info).number = number;
        self.registry.mark_team_valid();
    }

    /// Assigns the team name. This also makes the team valid again.
    pub fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        write(&self.info).name = name;
        self.registry.mark_team_valid();
    }

    /// Invalidates the team and forgets every player.
    ///
    /// Attribute storage is kept; adding a player afterwards re-initialises its slots.
    pub fn set_invalid(&self) {
        self.registry.clear();
    }

    // ---------------------------------------------------------------------
    // Membership
    // ---------------------------------------------------------------------

    /// Registers `id` with default attribute values. Adding an existing player resets
    /// all of its values.
    ///
    /// Players added to an invalid team stay hidden until the team becomes valid.
    pub fn add_player(&self, id: PlayerId) {
        self.store.add_player(id, &self.registry);
        tracing::trace!(team = self.number(), player = %id, "player added");
    }

    /// Unregisters `id` and discards its values. Unknown players are ignored.
    pub fn remove_player(&self, id: PlayerId) {
        if self.store.remove_player(id, &self.registry) {
            tracing::trace!(team = self.number(), player = %id, "player removed");
        }
    }

    /// Registered players in ascending id order.
    pub fn players(&self) -> PlayerList {
        self.registry.list()
    }

    /// Whether `id` is registered on this (valid) team.
    pub fn is_player_valid(&self, id: PlayerId) -> bool {
        self.registry.is_valid(id)
    }

    /// Number of registered players.
    pub fn player_count(&self) -> usize {
        self.registry.len()
    }

    // ---------------------------------------------------------------------
    // Kinematics
    // ---------------------------------------------------------------------

    /// Position of `id`, or [`Position::INVALID`].
    pub fn position(&self, id: PlayerId) -> Position {
        self.read_attribute(&self.store.position, id)
    }

    /// Orientation of `id`, or [`Angle::INVALID`].
    pub fn orientation(&self, id: PlayerId) -> Angle {
        self.read_attribute(&self.store.orientation, id)
    }

    /// Velocity of `id`, or [`Velocity::INVALID`].
    pub fn velocity(&self, id: PlayerId) -> Velocity {
        self.read_attribute(&self.store.velocity, id)
    }

    /// Angular speed of `id`, or [`AngularSpeed::INVALID`].
    pub fn angular_speed(&self, id: PlayerId) -> AngularSpeed {
        self.read_attribute(&self.store.angular_speed, id)
    }

    /// Stores the position of `id`.
    pub fn set_position(&self, id: PlayerId, position: Position) {
        self.write_attribute(&self.store.position, id, position);
    }

    /// Stores the orientation of `id`.
    pub fn set_orientation(&self, id: PlayerId, orientation: Angle) {
        self.write_attribute(&self.store.orientation, id, orientation);
    }

    /// Stores the velocity of `id`.
    pub fn set_velocity(&self, id: PlayerId, velocity: Velocity) {
        self.write_attribute(&self.store.velocity, id, velocity);
    }

    /// Stores the angular speed of `id`.
    pub fn set_angular_speed(&self, id: PlayerId, angular_speed: AngularSpeed) {
        self.write_attribute(&self.store.angular_speed, id, angular_speed);
    }

    // ---------------------------------------------------------------------
    // Devices and actuators
    // ---------------------------------------------------------------------

    /// Whether `id` holds the ball.
    pub fn ball_possession(&self, id: PlayerId) -> bool {
        self.read_attribute(&self.store.ball_possession, id)
    }

    /// Whether the kicker of `id` is enabled.
    pub fn kick_enabled(&self, id: PlayerId) -> bool {
        self.read_attribute(&self.store.kick_enabled, id)
    }

    /// Whether the dribbler of `id` is enabled.
    pub fn dribble_enabled(&self, id: PlayerId) -> bool {
        self.read_attribute(&self.store.dribble_enabled, id)
    }

    /// Battery charge reported by `id`.
    pub fn battery_charge(&self, id: PlayerId) -> u8 {
        self.read_attribute(&self.store.battery_charge, id)
    }

    /// Kick capacitor charge reported by `id`.
    pub fn capacitor_charge(&self, id: PlayerId) -> u8 {
        self.read_attribute(&self.store.capacitor_charge, id)
    }

    /// Records whether `id` holds the ball.
    pub fn set_ball_possession(&self, id: PlayerId, possession: bool) {
        self.write_attribute(&self.store.ball_possession, id, possession);
    }

    /// Records whether the kicker of `id` is enabled.
    pub fn set_player_kick_status(&self, id: PlayerId, enabled: bool) {
        self.write_attribute(&self.store.kick_enabled, id, enabled);
    }

    /// Records whether the dribbler of `id` is enabled.
    pub fn set_player_dribble_status(&self, id: PlayerId, enabled: bool) {
        self.write_attribute(&self.store.dribble_enabled, id, enabled);
    }

    /// Records the battery charge of `id`.
    pub fn set_player_battery_charge(&self, id: PlayerId, charge: u8) {
        self.write_attribute(&self.store.battery_charge, id, charge);
    }

    /// Records the kick capacitor charge of `id`.
    pub fn set_player_capacitor_charge(&self, id: PlayerId, charge: u8) {
        self.write_attribute(&self.store.capacitor_charge, id, charge);
    }

    /// Attribute storage, exposed for inspection in tests and benchmarks.
    #[doc(hidden)]
    pub fn store(&self) -> &AttributeStore {
        &self.store
    }

    fn read_attribute<T: Copy>(&self, table: &AttributeTable<T>, id: PlayerId) -> T {
        match table.get(id, |p| self.registry.is_valid(p)) {
            Some(value) => value,
            None => {
                self.report_invalid_player(table.name(), id, "read");
                table.sentinel()
            },
        }
    }

    fn write_attribute<T: Copy>(&self, table: &AttributeTable<T>, id: PlayerId, value: T) {
        if !table.set(id, value, |p| self.registry.is_valid(p)) {
            self.report_invalid_player(table.name(), id, "write");
        }
    }

    // Called only after the table guard has been released.
    fn report_invalid_player(&self, attribute: &'static str, id: PlayerId, access: &'static str) {
        let info = read(&self.info).clone();
        let diagnostic = diagnostic!(
            DiagnosticSeverity::Warning,
            DiagnosticKind::InvalidPlayer,
            "no such player #{} in team #{} ({})",
            id,
            info.number,
            info.name
        )
        .with_team(info.number)
        .with_player(id)
        .with_context("attribute", attribute)
        .with_context("access", access);
        report_to_observer(self.observer.as_ref(), &diagnostic);
    }
}

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp
)]
mod tests {
    use super::*;
    use crate::telemetry::CollectingObserver;
    use std::sync::mpsc;
    use std::time::Duration;

    fn observed_team() -> (TeamState, Arc<CollectingObserver>) {
        let observer = Arc::new(CollectingObserver::new());
        let team = TeamState::new(1, "Blue").with_observer(observer.clone());
        (team, observer)
    }

    #[test]
    fn new_player_has_default_values() {
        let (team, observer) = observed_team();
        let id = PlayerId::new(3);
        team.add_player(id);

        assert_eq!(team.position(id), Position::INVALID);
        assert_eq!(team.orientation(id), Angle::INVALID);
        assert_eq!(team.velocity(id), Velocity::INVALID);
        assert_eq!(team.angular_speed(id), AngularSpeed::INVALID);
        assert!(!team.ball_possession(id));
        assert!(!team.kick_enabled(id));
        assert!(!team.dribble_enabled(id));
        assert_eq!(team.battery_charge(id), 0);
        assert_eq!(team.capacitor_charge(id), 0);
        crate::assert_no_diagnostics!(observer);
    }

    #[test]
    fn writes_are_visible_to_reads() {
        let (team, _) = observed_team();
        let id = PlayerId::new(2);
        team.add_player(id);

        team.set_position(id, Position::with_z(1.0, 2.0, 0.1));
        team.set_orientation(id, Angle::new(1.57));
        team.set_velocity(id, Velocity::new(0.5, -0.5));
        team.set_angular_speed(id, AngularSpeed::new(3.0));
        team.set_ball_possession(id, true);
        team.set_player_kick_status(id, true);
        team.set_player_dribble_status(id, true);
        team.set_player_battery_charge(id, 180);
        team.set_player_capacitor_charge(id, 90);

        assert_eq!(team.position(id), Position::with_z(1.0, 2.0, 0.1));
        assert_eq!(team.orientation(id).value, 1.57);
        assert_eq!(team.velocity(id), Velocity::new(0.5, -0.5));
        assert_eq!(team.angular_speed(id).value, 3.0);
        assert!(team.ball_possession(id));
        assert!(team.kick_enabled(id));
        assert!(team.dribble_enabled(id));
        assert_eq!(team.battery_charge(id), 180);
        assert_eq!(team.capacitor_charge(id), 90);
    }

    #[test]
    fn unknown_player_degrades_and_reports() {
        let (team, observer) = observed_team();
        let ghost = PlayerId::new(9);

        team.set_player_battery_charge(ghost, 50);
        assert_eq!(team.battery_charge(ghost), 0);
        assert_eq!(team.position(ghost), Position::INVALID);

        let reports = observer.diagnostics_of_kind(DiagnosticKind::InvalidPlayer);
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].context.get("access").unwrap(), "write");
        assert_eq!(reports[0].context.get("attribute").unwrap(), "battery_charge");
        assert_eq!(reports[1].context.get("access").unwrap(), "read");
        assert_eq!(reports[0].team, Some(1));
        assert_eq!(reports[0].player, Some(ghost));
        for (_, count) in team.store().slot_counts() {
            assert_eq!(count, 0, "an invalid write must not allocate");
        }
    }

    #[test]
    fn set_invalid_hides_players_and_set_number_revives_team() {
        let (team, _) = observed_team();
        team.add_player(PlayerId::new(1));
        team.add_player(PlayerId::new(2));
        team.set_player_battery_charge(PlayerId::new(1), 77);

        team.set_invalid();
        assert!(!team.is_valid());
        assert!(team.players().is_empty());
        assert_eq!(team.player_count(), 0);
        assert!(!team.is_player_valid(PlayerId::new(1)));
        assert_eq!(team.battery_charge(PlayerId::new(1)), 0);

        team.set_number(4);
        assert!(team.is_valid());
        assert_eq!(team.number(), 4);
        assert!(team.players().is_empty(), "membership is not restored");

        team.add_player(PlayerId::new(1));
        assert_eq!(team.battery_charge(PlayerId::new(1)), 0);
    }

    #[test]
    fn set_name_revives_invalid_team() {
        let team = TeamState::invalid();
        assert!(!team.is_valid());
        team.add_player(PlayerId::new(5));
        assert!(!team.is_player_valid(PlayerId::new(5)));

        team.set_name("Yellow");
        assert!(team.is_valid());
        assert_eq!(team.name(), "Yellow");
        assert!(team.is_player_valid(PlayerId::new(5)));
    }

    #[test]
    fn players_are_listed_in_ascending_order() {
        let team = TeamState::new(0, "Blue");
        for id in [4, 0, 2] {
            team.add_player(PlayerId::new(id));
        }
        team.remove_player(PlayerId::new(7));
        let ids: Vec<u8> = team.players().iter().map(|p| p.as_u8()).collect();
        assert_eq!(ids, vec![0, 2, 4]);
        assert_eq!(team.player_count(), 3);
    }

    #[test]
    fn blocked_category_does_not_stall_other_categories() {
        let team = Arc::new(TeamState::new(1, "Blue"));
        let id = PlayerId::new(1);
        team.add_player(id);
        team.set_position(id, Position::new(3.0, 4.0));

        let battery_guard = team.store().battery_charge.lock_exclusive();

        let (tx, rx) = mpsc::channel();
        let reader = Arc::clone(&team);
        let handle = std::thread::spawn(move || {
            tx.send(reader.position(id)).unwrap();
        });

        let position = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("position read must not wait for the battery lock");
        assert_eq!(position, Position::new(3.0, 4.0));

        drop(battery_guard);
        handle.join().unwrap();
    }

    #[test]
    fn debug_output_names_the_team() {
        let team = TeamState::new(3, "Red");
        let text = format!("{team:?}");
        assert!(text.contains("Red"));
        assert!(text.contains("has_observer: false"));
    }
}
