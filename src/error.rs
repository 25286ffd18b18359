use std::error::Error;
use std::fmt;
use std::fmt::Display;

use crate::network::codec::CodecError;

/// Result alias used throughout the crate.
pub type FieldStateResult<T> = Result<T, FieldStateError>;

/// Errors surfaced by fallible operations in this crate.
///
/// Attribute reads and writes on a [`TeamState`] never return errors: unknown players
/// degrade to sentinel values and dropped writes are reported through
/// [`telemetry`](crate::telemetry). Only the radio connection path and configuration
/// validation produce a `FieldStateError`.
///
/// [`TeamState`]: crate::TeamState
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldStateError {
    /// A step of the connect handshake failed. The session is left disconnected.
    ConnectionFailure {
        /// The `host:port` that was being connected to.
        endpoint: String,
        /// Which handshake step failed.
        kind: ConnectionFailureKind,
    },
    /// A remote call on an established link failed at the transport level.
    RemoteCall {
        /// The remote operation that was attempted.
        operation: &'static str,
        /// A description of the transport fault.
        context: String,
    },
    /// A remote call was attempted while no session was established.
    NotConnected {
        /// The remote operation that was attempted.
        operation: &'static str,
    },
    /// A configuration value was rejected.
    InvalidConfig {
        /// Further specifies why the configuration was rejected.
        kind: InvalidConfigKind,
    },
    /// Serialization or deserialization of a radio message failed.
    Serialization {
        /// A description of what failed to serialize/deserialize.
        context: String,
    },
    /// A network socket operation failed outside of a handshake or remote call.
    SocketError {
        /// A description of the socket error.
        context: String,
    },
}

/// The handshake step at which a connection attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ConnectionFailureKind {
    /// The host name could not be resolved to any address.
    Resolution {
        /// Resolver output, if any.
        context: String,
    },
    /// A local socket could not be bound.
    Bind {
        /// The underlying I/O error.
        context: String,
    },
    /// The transport raised a fault while exchanging handshake messages.
    Transport {
        /// The underlying I/O or codec error.
        context: String,
    },
    /// The endpoint did not answer the handshake within the configured timeout.
    Timeout {
        /// The timeout that elapsed, in milliseconds.
        millis: u128,
    },
    /// The endpoint answered but did not expose any remote object.
    NilHandle,
    /// The endpoint exposes a remote object of a different interface.
    InterfaceMismatch {
        /// The interface this proxy speaks.
        expected: String,
        /// The interface the endpoint reported.
        actual: String,
    },
    /// Another connect attempt is already in flight on this proxy.
    AlreadyConnecting,
    /// The attempt was abandoned because `disconnect()` was called while it was in flight.
    Cancelled,
}

impl Display for ConnectionFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolution { context } => write!(f, "could not resolve endpoint: {context}"),
            Self::Bind { context } => write!(f, "could not bind local socket: {context}"),
            Self::Transport { context } => write!(f, "transport fault during handshake: {context}"),
            Self::Timeout { millis } => write!(f, "no handshake reply within {millis}ms"),
            Self::NilHandle => write!(f, "endpoint returned a nil remote handle"),
            Self::InterfaceMismatch { expected, actual } => {
                write!(f, "endpoint speaks '{actual}', expected '{expected}'")
            },
            Self::AlreadyConnecting => write!(f, "a connect attempt is already in progress"),
            Self::Cancelled => write!(f, "connect attempt cancelled by disconnect"),
        }
    }
}

/// Why a configuration was rejected by `validate()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum InvalidConfigKind {
    /// The handshake timeout must be greater than zero.
    ZeroHandshakeTimeout,
    /// The handshake retry interval must be greater than zero.
    ZeroRetryInterval,
    /// The interface identifier must not be empty.
    EmptyInterface,
    /// The default port used for `port == 0` addressing must not itself be zero.
    ZeroDefaultPort,
    /// A server must accept at least one datagram per poll.
    ZeroDatagramBudget,
    /// The interface identifier makes a handshake larger than one datagram.
    InterfaceTooLong {
        /// Identifier length in bytes.
        len: usize,
    },
}

impl Display for InvalidConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroHandshakeTimeout => write!(f, "handshake_timeout must be greater than zero"),
            Self::ZeroRetryInterval => {
                write!(f, "handshake_retry_interval must be greater than zero")
            },
            Self::EmptyInterface => write!(f, "interface identifier must not be empty"),
            Self::ZeroDefaultPort => write!(f, "default_port must not be zero"),
            Self::ZeroDatagramBudget => {
                write!(f, "max_datagrams_per_poll must be greater than zero")
            },
            Self::InterfaceTooLong { len } => write!(
                f,
                "interface identifier of {len} bytes does not fit in a handshake datagram"
            ),
        }
    }
}

impl From<InvalidConfigKind> for FieldStateError {
    fn from(kind: InvalidConfigKind) -> Self {
        Self::InvalidConfig { kind }
    }
}

impl From<CodecError> for FieldStateError {
    fn from(err: CodecError) -> Self {
        Self::Serialization {
            context: err.to_string(),
        }
    }
}

impl Display for FieldStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailure { endpoint, kind } => {
                write!(f, "Connection to {} failed: {}", endpoint, kind)
            },
            Self::RemoteCall { operation, context } => {
                write!(f, "Remote call {} failed: {}", operation, context)
            },
            Self::NotConnected { operation } => {
                write!(f, "Remote call {} dropped: the radio sensor is not connected", operation)
            },
            Self::InvalidConfig { kind } => write!(f, "Invalid configuration: {}", kind),
            Self::Serialization { context } => write!(f, "Serialization error: {}", context),
            Self::SocketError { context } => write!(f, "Socket error: {}", context),
        }
    }
}

impl Error for FieldStateError {}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn connection_failure_display_names_endpoint_and_step() {
        let err = FieldStateError::ConnectionFailure {
            endpoint: "robots.local:2809".to_owned(),
            kind: ConnectionFailureKind::Timeout { millis: 250 },
        };
        let text = err.to_string();
        assert!(text.contains("robots.local:2809"));
        assert!(text.contains("250ms"));
    }

    #[test]
    fn interface_mismatch_display_shows_both_sides() {
        let kind = ConnectionFailureKind::InterfaceMismatch {
            expected: "FieldState.RadioSensor".to_owned(),
            actual: "FieldState.Vision".to_owned(),
        };
        let text = kind.to_string();
        assert!(text.contains("FieldState.RadioSensor"));
        assert!(text.contains("FieldState.Vision"));
    }

    #[test]
    fn invalid_config_kind_converts() {
        let err: FieldStateError = InvalidConfigKind::EmptyInterface.into();
        assert_eq!(
            err,
            FieldStateError::InvalidConfig {
                kind: InvalidConfigKind::EmptyInterface
            }
        );
    }

    #[test]
    fn codec_error_becomes_serialization_error() {
        let err: FieldStateError = CodecError::BufferTooSmall {
            required: 0,
            provided: 4,
        }.into();
        assert!(matches!(err, FieldStateError::Serialization { .. }));
    }
}
