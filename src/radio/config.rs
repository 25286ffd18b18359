//! Configuration types for the radio link.
//!
//! | Config Type | Purpose | Key Presets |
//! |-------------|---------|-------------|
//! | `RadioConfig` | Client-side connect and call behavior | `lan()`, `strict()` |
//! | `RadioServerConfig` | Inbound radio server | `on_port()`, `loopback()` |
//! | `CallFailurePolicy` | What a failed remote call does to the session | `StayConnected`, `Disconnect` |
//!
//! # Example
//!
//! ```
//! use fieldstate::{CallFailurePolicy, RadioConfig};
//! use web_time::Duration;
//!
//! let config = RadioConfig {
//!     handshake_timeout: Duration::from_millis(400),
//!     call_failure_policy: CallFailurePolicy::Disconnect,
//!     ..RadioConfig::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use web_time::Duration;

use crate::network::codec::fits_in_datagram;
use crate::network::messages::RadioMessage;
use crate::{FieldStateError, InvalidConfigKind};

/// Interface identifier spoken by [`RadioSensor`](crate::RadioSensor) and answered by
/// [`RadioServer`](crate::RadioServer) unless configured otherwise.
pub const DEFAULT_INTERFACE: &str = "FieldState.RadioSensor";

/// Port used when a caller connects with port `0`.
pub const DEFAULT_PORT: u16 = 2809;

/// What a transport fault during a remote call does to an established session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallFailurePolicy {
    /// Report the fault and keep the session. The next call will try the same link.
    #[default]
    StayConnected,
    /// Report the fault and drop the session; the caller must reconnect.
    Disconnect,
}

/// Client-side radio configuration.
///
/// # Forward Compatibility
///
/// New fields may be added to this struct in future versions. Construct instances with
/// `..RadioConfig::default()`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "RadioConfig has no effect unless passed to RadioSensor::new()"]
pub struct RadioConfig {
    /// Upper bound on the whole connect handshake, resolution excluded.
    ///
    /// Default: 1s
    pub handshake_timeout: Duration,

    /// Interval after which an unanswered handshake request is sent again.
    ///
    /// Default: 200ms
    pub handshake_retry_interval: Duration,

    /// Port substituted when `connect` is called with port `0`.
    ///
    /// Default: 2809
    pub default_port: u16,

    /// Interface identifier the remote object must report.
    ///
    /// Default: [`DEFAULT_INTERFACE`]
    pub interface: String,

    /// Session behavior after a failed remote call.
    ///
    /// Default: [`CallFailurePolicy::StayConnected`]
    pub call_failure_policy: CallFailurePolicy,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(1),
            handshake_retry_interval: Duration::from_millis(200),
            default_port: DEFAULT_PORT,
            interface: DEFAULT_INTERFACE.to_owned(),
            call_failure_policy: CallFailurePolicy::StayConnected,
        }
    }
}

impl RadioConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for a radio station on the same switched network.
    ///
    /// Fails fast so a control loop that reconnects on its own does not stall.
    pub fn lan() -> Self {
        Self {
            handshake_timeout: Duration::from_millis(250),
            handshake_retry_interval: Duration::from_millis(50),
            ..Self::default()
        }
    }

    /// Preset that drops the session on the first failed call.
    pub fn strict() -> Self {
        Self {
            call_failure_policy: CallFailurePolicy::Disconnect,
            ..Self::default()
        }
    }

    /// Checks the configuration for values that can never work.
    pub fn validate(&self) -> Result<(), FieldStateError> {
        if self.handshake_timeout.is_zero() {
            return Err(InvalidConfigKind::ZeroHandshakeTimeout.into());
        }
        if self.handshake_retry_interval.is_zero() {
            return Err(InvalidConfigKind::ZeroRetryInterval.into());
        }
        if self.interface.is_empty() {
            return Err(InvalidConfigKind::EmptyInterface.into());
        }
        if !fits_in_datagram(&RadioMessage::handshake_request(0, &self.interface)) {
            return Err(InvalidConfigKind::InterfaceTooLong {
                len: self.interface.len(),
            }
            .into());
        }
        if self.default_port == 0 {
            return Err(InvalidConfigKind::ZeroDefaultPort.into());
        }
        Ok(())
    }
}

/// Configuration for the inbound [`RadioServer`](crate::RadioServer).
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "RadioServerConfig has no effect unless passed to RadioServer::bind()"]
pub struct RadioServerConfig {
    /// Local address to bind.
    ///
    /// Default: `0.0.0.0`
    pub bind_address: IpAddr,

    /// Local UDP port. `0` lets the operating system choose.
    ///
    /// Default: 2809
    pub bind_port: u16,

    /// Interface identifier advertised in handshake replies. An empty identifier makes
    /// the server answer with a nil handle.
    ///
    /// Default: [`DEFAULT_INTERFACE`]
    pub interface: String,

    /// Maximum datagrams handled by one `poll()` call.
    ///
    /// Default: 64
    pub max_datagrams_per_poll: usize,
}

impl Default for RadioServerConfig {
    fn default() -> Self {
        Self {
            bind_address: Ipv4Addr::UNSPECIFIED.into(),
            bind_port: DEFAULT_PORT,
            interface: DEFAULT_INTERFACE.to_owned(),
            max_datagrams_per_poll: 64,
        }
    }
}

impl RadioServerConfig {
    /// Default configuration bound to `port`.
    pub fn on_port(port: u16) -> Self {
        Self {
            bind_port: port,
            ..Self::default()
        }
    }

    /// Loopback-only server on an ephemeral port, for simulators and tests.
    pub fn loopback() -> Self {
        Self {
            bind_address: Ipv4Addr::LOCALHOST.into(),
            bind_port: 0,
            ..Self::default()
        }
    }

    /// Checks the configuration for values that can never work.
    pub fn validate(&self) -> Result<(), FieldStateError> {
        if self.max_datagrams_per_poll == 0 {
            return Err(InvalidConfigKind::ZeroDatagramBudget.into());
        }
        if !fits_in_datagram(&RadioMessage::handshake_reply(0, &self.interface)) {
            return Err(InvalidConfigKind::InterfaceTooLong {
                len: self.interface.len(),
            }
            .into());
        }
        Ok(())
    }
}

/// A radio station address as given by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name or IP literal.
    pub host: String,
    /// Port, `0` meaning the configured default.
    pub port: u16,
}

impl Endpoint {
    /// Creates an endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The port to dial: `port`, or `default_port` when `port` is `0`.
    #[must_use]
    pub const fn resolved_port(&self, default_port: u16) -> u16 {
        if self.port == 0 {
            default_port
        } else {
            self.port
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(RadioConfig::default().validate().is_ok());
        assert!(RadioConfig::lan().validate().is_ok());
        assert!(RadioServerConfig::default().validate().is_ok());
    }

    #[test]
    fn presets_differ_where_documented() {
        assert!(RadioConfig::lan().handshake_timeout < RadioConfig::default().handshake_timeout);
        assert_eq!(
            RadioConfig::strict().call_failure_policy,
            CallFailurePolicy::Disconnect
        );
        assert_eq!(
            RadioConfig::default().call_failure_policy,
            CallFailurePolicy::StayConnected
        );
    }

    #[test]
    fn validate_rejects_impossible_values() {
        let zero_timeout = RadioConfig {
            handshake_timeout: Duration::ZERO,
            ..RadioConfig::default()
        };
        assert_eq!(
            zero_timeout.validate(),
            Err(FieldStateError::InvalidConfig {
                kind: InvalidConfigKind::ZeroHandshakeTimeout
            })
        );

        let no_interface = RadioConfig {
            interface: String::new(),
            ..RadioConfig::default()
        };
        assert!(no_interface.validate().is_err());

        let no_port = RadioConfig {
            default_port: 0,
            ..RadioConfig::default()
        };
        assert!(no_port.validate().is_err());

        let no_budget = RadioServerConfig {
            max_datagrams_per_poll: 0,
            ..RadioServerConfig::default()
        };
        assert!(no_budget.validate().is_err());
    }

    #[test]
    fn validate_rejects_interface_longer_than_a_datagram() {
        let oversized = RadioConfig {
            interface: "x".repeat(600),
            ..RadioConfig::default()
        };
        assert_eq!(
            oversized.validate(),
            Err(FieldStateError::InvalidConfig {
                kind: InvalidConfigKind::InterfaceTooLong { len: 600 }
            })
        );
        assert!(matches!(
            crate::RadioSensor::udp(oversized),
            Err(FieldStateError::InvalidConfig {
                kind: InvalidConfigKind::InterfaceTooLong { .. }
            })
        ));

        let oversized_server = RadioServerConfig {
            interface: "x".repeat(600),
            ..RadioServerConfig::loopback()
        };
        assert!(oversized_server.validate().is_err());

        // 18 bytes of handshake framing leave 494 for the identifier.
        let largest = RadioConfig {
            interface: "x".repeat(494),
            ..RadioConfig::default()
        };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn endpoint_port_zero_uses_default() {
        assert_eq!(Endpoint::new("robots", 0).resolved_port(DEFAULT_PORT), 2809);
        assert_eq!(Endpoint::new("robots", 9000).resolved_port(DEFAULT_PORT), 9000);
        assert_eq!(Endpoint::new("10.0.0.2", 5).to_string(), "10.0.0.2:5");
    }
}
