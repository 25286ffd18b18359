//! Radio datagram types.

use serde::{Deserialize, Serialize};

use crate::{PlayerId, TeamNumber};

/// Magic number carried by every radio datagram. Datagrams with any other value are
/// discarded before their body is interpreted.
pub const RADIO_MAGIC: u16 = 0x6E51;

/// One remote actuator call.
///
/// The same four operations flow in both directions: a [`RadioSensor`] sends them to a
/// robot's radio station, and a [`RadioServer`] receives them and writes the reported
/// values into local team state.
///
/// [`RadioSensor`]: crate::RadioSensor
/// [`RadioServer`]: crate::RadioServer
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RadioCommand {
    /// Battery charge of a player.
    BatteryCharge {
        /// Target team.
        team: TeamNumber,
        /// Target player.
        player: PlayerId,
        /// Charge value.
        charge: u8,
    },
    /// Kick capacitor charge of a player.
    CapacitorCharge {
        /// Target team.
        team: TeamNumber,
        /// Target player.
        player: PlayerId,
        /// Charge value.
        charge: u8,
    },
    /// Dribbler enable flag of a player.
    DribbleStatus {
        /// Target team.
        team: TeamNumber,
        /// Target player.
        player: PlayerId,
        /// Whether the dribbler is enabled.
        enabled: bool,
    },
    /// Kicker enable flag of a player.
    KickStatus {
        /// Target team.
        team: TeamNumber,
        /// Target player.
        player: PlayerId,
        /// Whether the kicker is enabled.
        enabled: bool,
    },
}

impl RadioCommand {
    /// Name of the remote operation, as used in logs and errors.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::BatteryCharge { .. } => "set_player_battery_charge",
            Self::CapacitorCharge { .. } => "set_player_capacitor_charge",
            Self::DribbleStatus { .. } => "set_player_dribble_status",
            Self::KickStatus { .. } => "set_player_kick_status",
        }
    }

    /// The team this command targets.
    #[must_use]
    pub const fn team(&self) -> TeamNumber {
        match *self {
            Self::BatteryCharge { team, .. }
            | Self::CapacitorCharge { team, .. }
            | Self::DribbleStatus { team, .. }
            | Self::KickStatus { team, .. } => team,
        }
    }

    /// The player this command targets.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        match *self {
            Self::BatteryCharge { player, .. }
            | Self::CapacitorCharge { player, .. }
            | Self::DribbleStatus { player, .. }
            | Self::KickStatus { player, .. } => player,
        }
    }
}

/// Fixed prefix of every datagram.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Must equal [`RADIO_MAGIC`].
    pub magic: u16,
}

/// Payload of a radio datagram.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBody {
    /// Sent by a connecting client. `interface` is the remote object the client expects.
    HandshakeRequest {
        /// Correlates the reply with this request.
        nonce: u32,
        /// Interface identifier the client speaks.
        interface: String,
    },
    /// Server answer echoing the nonce. An empty `interface` means the server exposes no
    /// remote object.
    HandshakeReply {
        /// Nonce copied from the request.
        nonce: u32,
        /// Interface identifier of the exposed object.
        interface: String,
    },
    /// A remote actuator call. Commands are fire-and-forget.
    Command(RadioCommand),
}

/// A datagram exchanged between a [`RadioSensor`](crate::RadioSensor) and a
/// [`RadioServer`](crate::RadioServer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioMessage {
    /// Datagram header.
    pub header: MessageHeader,
    /// Datagram payload.
    pub body: MessageBody,
}

impl RadioMessage {
    fn with_body(body: MessageBody) -> Self {
        Self {
            header: MessageHeader { magic: RADIO_MAGIC },
            body,
        }
    }

    /// A command datagram.
    #[must_use]
    pub fn command(command: RadioCommand) -> Self {
        Self::with_body(MessageBody::Command(command))
    }

    /// A handshake request for `interface`.
    #[must_use]
    pub fn handshake_request(nonce: u32, interface: &str) -> Self {
        Self::with_body(MessageBody::HandshakeRequest {
            nonce,
            interface: interface.to_owned(),
        })
    }

    /// A handshake reply advertising `interface`.
    #[must_use]
    pub fn handshake_reply(nonce: u32, interface: &str) -> Self {
        Self::with_body(MessageBody::HandshakeReply {
            nonce,
            interface: interface.to_owned(),
        })
    }

    /// Whether the header carries [`RADIO_MAGIC`].
    #[must_use]
    pub const fn has_valid_magic(&self) -> bool {
        self.header.magic == RADIO_MAGIC
    }
}
