//! # fieldstate
//!
//! Shared runtime state of a robot-soccer team controller.
//!
//! For every player of a team, [`TeamState`] holds the kinematic state (position,
//! orientation, velocity, angular speed) and the device telemetry (ball possession,
//! kick/dribble enable flags, battery and capacitor charge). A control loop, game logic
//! and inbound radio events read and write it concurrently; each attribute category is
//! guarded by its own lock.
//!
//! Actuator commands travel over a radio link:
//!
//! - [`RadioSensor`] is the client side. It connects to a robot radio station and
//!   forwards `set_player_*` calls to it while connected.
//! - [`RadioServer`] is the server side. It receives the same calls and hands them to a
//!   [`RadioSensorHandler`], which writes them into the matching [`TeamState`].
//!
//! Unknown players, disconnected sessions and failed remote calls never panic and never
//! surface as errors from the setters; they are reported through [`telemetry`].
//!
//! ```
//! use fieldstate::{PlayerId, TeamDirectory, TeamState, RadioSensorApi, RadioSensorHandler};
//! use std::sync::Arc;
//!
//! let directory = Arc::new(TeamDirectory::new());
//! let blue = Arc::new(TeamState::new(1, "Blue"));
//! blue.add_player(PlayerId::new(3));
//! directory.insert(blue.clone());
//!
//! // An inbound radio report lands in the team state.
//! let handler = RadioSensorHandler::new(directory);
//! handler.set_player_battery_charge(1, PlayerId::new(3), 200);
//! assert_eq!(blue.battery_charge(PlayerId::new(3)), 200);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

pub use error::{ConnectionFailureKind, FieldStateError, FieldStateResult, InvalidConfigKind};
pub use network::messages::RadioCommand;
pub use network::radio_server::RadioServer;
pub use network::udp_link::{UdpRadioLink, UdpRadioTransport};
pub use radio::config::{
    CallFailurePolicy, Endpoint, RadioConfig, RadioServerConfig, DEFAULT_INTERFACE, DEFAULT_PORT,
};
pub use radio::handler::RadioSensorHandler;
pub use radio::sensor::{RadioSensor, SessionState};
pub use state::player_registry::PlayerList;
pub use state::team::TeamState;
pub use state::world_map::{TeamDirectory, WorldMap};
pub use types::{Angle, AngularSpeed, PlayerId, Position, TeamNumber, Velocity};

#[doc(hidden)]
pub mod error;
pub mod prelude;
#[doc(hidden)]
pub mod sync;
pub mod telemetry;
pub mod types;
pub mod state {
    //! Per-team attribute storage.
    pub mod attribute_store;
    pub mod attribute_table;
    pub mod player_registry;
    pub mod team;
    pub mod world_map;
}
pub mod radio {
    //! Client and server roles of the radio actuation link.
    pub mod config;
    pub mod handler;
    pub mod sensor;
}
pub mod network {
    //! Wire format and UDP transport of the radio link.

    /// Binary codec for radio datagrams.
    ///
    /// Provides the single bincode configuration shared by clients and servers.
    pub mod codec;
    pub mod messages;
    pub mod radio_server;
    pub mod udp_link;
}

/// Internal module exposing implementation details for testing and benchmarking.
///
/// # ⚠️ WARNING: No Stability Guarantees
///
/// **This module is NOT part of the public API.** Everything here may change without
/// notice and is intended only for property tests, loom models and benchmarks in this
/// repository.
#[doc(hidden)]
pub mod __internal {
    pub use crate::network::codec::{decode_message, encode_message, MAX_DATAGRAM_SIZE};
    pub use crate::network::messages::{MessageBody, MessageHeader, RadioMessage, RADIO_MAGIC};
    pub use crate::state::attribute_store::AttributeStore;
    pub use crate::state::attribute_table::AttributeTable;
    pub use crate::state::player_registry::PlayerRegistry;
}

// #############
// #  TRAITS   #
// #############

/// The four remote actuator operations.
///
/// Implemented by the outbound [`RadioSensor`], which forwards each call to a radio
/// station, and by the inbound [`RadioSensorHandler`], which writes it into local team
/// state. None of the operations report failure to the caller.
pub trait RadioSensorApi: Send + Sync {
    /// Battery charge of `player` in `team`.
    fn set_player_battery_charge(&self, team: TeamNumber, player: PlayerId, charge: u8);

    /// Kick capacitor charge of `player` in `team`.
    fn set_player_capacitor_charge(&self, team: TeamNumber, player: PlayerId, charge: u8);

    /// Dribbler enable flag of `player` in `team`.
    fn set_player_dribble_status(&self, team: TeamNumber, player: PlayerId, enabled: bool);

    /// Kicker enable flag of `player` in `team`.
    fn set_player_kick_status(&self, team: TeamNumber, player: PlayerId, enabled: bool);

    /// Routes a decoded [`RadioCommand`] to the matching operation.
    fn dispatch(&self, command: &RadioCommand) {
        match *command {
            RadioCommand::BatteryCharge {
                team,
                player,
                charge,
            } => self.set_player_battery_charge(team, player, charge),
            RadioCommand::CapacitorCharge {
                team,
                player,
                charge,
            } => self.set_player_capacitor_charge(team, player, charge),
            RadioCommand::DribbleStatus {
                team,
                player,
                enabled,
            } => self.set_player_dribble_status(team, player, enabled),
            RadioCommand::KickStatus {
                team,
                player,
                enabled,
            } => self.set_player_kick_status(team, player, enabled),
        }
    }
}

impl<T: RadioSensorApi + ?Sized> RadioSensorApi for Arc<T> {
    fn set_player_battery_charge(&self, team: TeamNumber, player: PlayerId, charge: u8) {
        (**self).set_player_battery_charge(team, player, charge);
    }

    fn set_player_capacitor_charge(&self, team: TeamNumber, player: PlayerId, charge: u8) {
        (**self).set_player_capacitor_charge(team, player, charge);
    }

    fn set_player_dribble_status(&self, team: TeamNumber, player: PlayerId, enabled: bool) {
        (**self).set_player_dribble_status(team, player, enabled);
    }

    fn set_player_kick_status(&self, team: TeamNumber, player: PlayerId, enabled: bool) {
        (**self).set_player_kick_status(team, player, enabled);
    }
}

/// An established link to a remote radio object.
///
/// A link is owned by exactly one [`RadioSensor`] and only used while its session lock
/// is held, so it needs to be `Send` but not `Sync`.
pub trait RadioLink: Send {
    /// Delivers one command. A transport fault is returned as
    /// [`FieldStateError::RemoteCall`].
    fn call(&mut self, command: &RadioCommand) -> FieldStateResult<()>;

    /// Interface identifier the remote object reported during the handshake.
    fn interface(&self) -> &str;
}

/// Opens [`RadioLink`]s.
///
/// `open` resolves the endpoint, sets up the channel and completes the handshake. It
/// must return [`ConnectionFailureKind::NilHandle`] when the endpoint exposes no object
/// and [`ConnectionFailureKind::InterfaceMismatch`] when it exposes a different one,
/// and it must give up after [`RadioConfig::handshake_timeout`].
pub trait RadioTransport: Send + Sync {
    /// Opens a link to `endpoint`.
    fn open(
        &self,
        endpoint: &Endpoint,
        config: &RadioConfig,
    ) -> FieldStateResult<Box<dyn RadioLink>>;
}

impl<T: RadioTransport + ?Sized> RadioTransport for Arc<T> {
    fn open(
        &self,
        endpoint: &Endpoint,
        config: &RadioConfig,
    ) -> FieldStateResult<Box<dyn RadioLink>> {
        (**self).open(endpoint, config)
    }
}

// ###################
// # UNIT TESTS      #
// ###################
