//! Convenient re-exports for common usage.
//!
//! ```rust
//! use fieldstate::prelude::*;
//!
//! let team = TeamState::new(1, "Blue");
//! team.add_player(PlayerId::new(3));
//! team.set_position(PlayerId::new(3), Position::new(0.0, 1.0));
//! assert!(team.position(PlayerId::new(3)).valid);
//! ```
//!
//! # What's Included
//!
//! - **Team state**: [`TeamState`], [`TeamDirectory`], [`WorldMap`], [`PlayerList`]
//! - **Attribute types**: [`PlayerId`], [`TeamNumber`], [`Position`], [`Angle`],
//!   [`Velocity`], [`AngularSpeed`]
//! - **Radio link**: [`RadioSensor`], [`RadioSensorHandler`], [`RadioServer`],
//!   [`RadioSensorApi`], [`RadioCommand`], [`SessionState`]
//! - **Transport seam**: [`RadioTransport`], [`RadioLink`], [`UdpRadioTransport`]
//! - **Configuration**: [`RadioConfig`], [`RadioServerConfig`], [`CallFailurePolicy`]
//! - **Error handling**: [`FieldStateError`], [`FieldStateResult`], [`ConnectionFailureKind`]

// Team state
pub use crate::{PlayerList, TeamDirectory, TeamState, WorldMap};

// Attribute types
pub use crate::{Angle, AngularSpeed, PlayerId, Position, TeamNumber, Velocity};

// Radio link
pub use crate::{
    RadioCommand, RadioSensor, RadioSensorApi, RadioSensorHandler, RadioServer, SessionState,
};

// Transport seam
pub use crate::{RadioLink, RadioTransport, UdpRadioTransport};

// Configuration
pub use crate::{CallFailurePolicy, RadioConfig, RadioServerConfig};

// Error handling
pub use crate::{ConnectionFailureKind, FieldStateError, FieldStateResult};
