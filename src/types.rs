//! Per-player attribute value types.
//!
//! Each kinematic type carries its own `valid` flag. `Default` and the associated
//! `INVALID` constant are the sentinel returned for players that are not registered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a robot, unique within one team only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(u8);

impl PlayerId {
    /// Wraps a raw player number.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Returns the raw player number.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl From<u8> for PlayerId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of a team as used by the world map and on the wire.
pub type TeamNumber = u8;

/// A point in field coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Whether the coordinates carry information.
    pub valid: bool,
    /// Field x coordinate.
    pub x: f32,
    /// Field y coordinate.
    pub y: f32,
    /// Height above the field.
    pub z: f32,
}

impl Position {
    /// Sentinel for unknown players.
    pub const INVALID: Self = Self {
        valid: false,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// A valid position on the field plane.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            valid: true,
            x,
            y,
            z: 0.0,
        }
    }

    /// A valid position with an explicit height.
    #[must_use]
    pub const fn with_z(x: f32, y: f32, z: f32) -> Self {
        Self { valid: true, x, y, z }
    }
}

/// An orientation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Angle {
    /// Whether the value carries information.
    pub valid: bool,
    /// Orientation in radians.
    pub value: f32,
}

impl Angle {
    /// Sentinel for unknown players.
    pub const INVALID: Self = Self {
        valid: false,
        value: 0.0,
    };

    /// A valid angle.
    #[must_use]
    pub const fn new(value: f32) -> Self {
        Self { valid: true, value }
    }
}

/// Planar linear velocity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    /// Whether the components carry information.
    pub valid: bool,
    /// Velocity along x.
    pub vx: f32,
    /// Velocity along y.
    pub vy: f32,
}

impl Velocity {
    /// Sentinel for unknown players.
    pub const INVALID: Self = Self {
        valid: false,
        vx: 0.0,
        vy: 0.0,
    };

    /// A valid velocity.
    #[must_use]
    pub const fn new(vx: f32, vy: f32) -> Self {
        Self { valid: true, vx, vy }
    }

    /// Magnitude of the velocity vector.
    #[must_use]
    pub fn abs(&self) -> f32 {
        self.vx.hypot(self.vy)
    }
}

/// Rotational speed in radians per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AngularSpeed {
    /// Whether the value carries information.
    pub valid: bool,
    /// Angular speed in rad/s.
    pub value: f32,
}

impl AngularSpeed {
    /// Sentinel for unknown players.
    pub const INVALID: Self = Self {
        valid: false,
        value: 0.0,
    };

    /// A valid angular speed.
    #[must_use]
    pub const fn new(value: f32) -> Self {
        Self { valid: true, value }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_invalid_sentinels() {
        assert_eq!(Position::default(), Position::INVALID);
        assert_eq!(Angle::default(), Angle::INVALID);
        assert_eq!(Velocity::default(), Velocity::INVALID);
        assert_eq!(AngularSpeed::default(), AngularSpeed::INVALID);
        assert!(!Position::INVALID.valid);
    }

    #[test]
    fn constructors_mark_values_valid() {
        assert!(Position::new(1.0, 2.0).valid);
        assert_eq!(Position::with_z(1.0, 2.0, 0.5).z, 0.5);
        assert!(Angle::new(0.0).valid);
        assert!(AngularSpeed::new(3.0).valid);
        assert_eq!(Velocity::new(3.0, 4.0).abs(), 5.0);
    }

    #[test]
    fn player_id_orders_and_displays_as_number() {
        assert!(PlayerId::new(1) < PlayerId::new(2));
        assert_eq!(PlayerId::from(9).to_string(), "9");
        assert_eq!(PlayerId::new(4).as_u8(), 4);
    }
}
