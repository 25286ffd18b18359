//! Inbound radio calls written into team state.

use std::sync::Arc;

use crate::telemetry::{
    report_to_observer, DiagnosticKind, DiagnosticObserver, DiagnosticSeverity, SharedObserver,
};
use crate::{diagnostic, PlayerId, RadioSensorApi, TeamNumber, TeamState, WorldMap};

/// Forwards each inbound call to the matching [`TeamState`] setter.
///
/// This is a pure translation layer: no buffering, no reordering. Calls for unknown teams
/// are dropped and reported as [`DiagnosticKind::UnknownTeam`]; calls for unknown players
/// are handled by the team like any other invalid write.
pub struct RadioSensorHandler<W> {
    world: W,
    observer: Option<SharedObserver>,
}

impl<W> std::fmt::Debug for RadioSensorHandler<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadioSensorHandler")
            .field("has_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl<W: WorldMap> RadioSensorHandler<W> {
    /// Creates a handler resolving teams through `world`.
    pub fn new(world: W) -> Self {
        Self {
            world,
            observer: None,
        }
    }

    /// Routes unknown-team diagnostics to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DiagnosticObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The world map teams are resolved through.
    pub fn world(&self) -> &W {
        &self.world
    }

    fn with_team(
        &self,
        team: TeamNumber,
        player: PlayerId,
        operation: &'static str,
        apply: impl FnOnce(&TeamState),
    ) {
        match self.world.team(team) {
            Some(state) => apply(&state),
            None => {
                let diagnostic = diagnostic!(
                    DiagnosticSeverity::Warning,
                    DiagnosticKind::UnknownTeam,
                    "dropping inbound {} for unknown team #{}",
                    operation,
                    team
                )
                .with_team(team)
                .with_player(player)
                .with_context("operation", operation);
                report_to_observer(self.observer.as_ref(), &diagnostic);
            },
        }
    }
}

impl<W: WorldMap> RadioSensorApi for RadioSensorHandler<W> {
    fn set_player_battery_charge(&self, team: TeamNumber, player: PlayerId, charge: u8) {
        self.with_team(team, player, "set_player_battery_charge", |state| {
            state.set_player_battery_charge(player, charge);
        });
    }

    fn set_player_capacitor_charge(&self, team: TeamNumber, player: PlayerId, charge: u8) {
        self.with_team(team, player, "set_player_capacitor_charge", |state| {
            state.set_player_capacitor_charge(player, charge);
        });
    }

    fn set_player_dribble_status(&self, team: TeamNumber, player: PlayerId, enabled: bool) {
        self.with_team(team, player, "set_player_dribble_status", |state| {
            state.set_player_dribble_status(player, enabled);
        });
    }

    fn set_player_kick_status(&self, team: TeamNumber, player: PlayerId, enabled: bool) {
        self.with_team(team, player, "set_player_kick_status", |state| {
            state.set_player_kick_status(player, enabled);
        });
    }
}
