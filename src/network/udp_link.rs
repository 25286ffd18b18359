//! UDP implementation of the radio transport seam.
//!
//! [`UdpRadioTransport`] dials a radio station: it resolves the host, binds an ephemeral
//! socket connected to the station, and exchanges a handshake that proves a
//! [`RadioServer`](crate::RadioServer) answering for the expected interface is
//! listening. The resulting [`UdpRadioLink`] sends each command as one datagram.

use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicU32, Ordering};
use web_time::{Duration, Instant};

use crate::network::codec::{self, CodecError, MAX_DATAGRAM_SIZE};
use crate::network::messages::{MessageBody, RadioMessage, RADIO_MAGIC};
use crate::{
    ConnectionFailureKind, Endpoint, FieldStateError, FieldStateResult, RadioCommand, RadioConfig,
    RadioLink, RadioTransport,
};

static NEXT_NONCE: AtomicU32 = AtomicU32::new(1);

fn next_nonce() -> u32 {
    NEXT_NONCE.fetch_add(1, Ordering::Relaxed) ^ std::process::id().rotate_left(16)
}

/// Connects [`UdpRadioLink`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpRadioTransport;

impl UdpRadioTransport {
    /// Creates the transport.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RadioTransport for UdpRadioTransport {
    fn open(
        &self,
        endpoint: &Endpoint,
        config: &RadioConfig,
    ) -> FieldStateResult<Box<dyn RadioLink>> {
        let port = endpoint.resolved_port(config.default_port);
        let failure = |kind: ConnectionFailureKind| FieldStateError::ConnectionFailure {
            endpoint: format!("{}:{}", endpoint.host, port),
            kind,
        };

        let peer = resolve(&endpoint.host, port).map_err(failure)?;
        let socket = bind_for(peer).map_err(failure)?;
        socket.connect(peer).map_err(|e| {
            failure(ConnectionFailureKind::Transport {
                context: e.to_string(),
            })
        })?;

        let interface = handshake(&socket, config).map_err(failure)?;
        if interface.is_empty() {
            return Err(failure(ConnectionFailureKind::NilHandle));
        }
        if interface != config.interface {
            return Err(failure(ConnectionFailureKind::InterfaceMismatch {
                expected: config.interface.clone(),
                actual: interface,
            }));
        }

        socket.set_nonblocking(true).map_err(|e| {
            failure(ConnectionFailureKind::Transport {
                context: e.to_string(),
            })
        })?;

        tracing::debug!(%peer, interface = %interface, "radio link established");
        Ok(Box::new(UdpRadioLink {
            socket,
            peer,
            interface,
            send_buffer: [0; MAX_DATAGRAM_SIZE],
        }))
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, ConnectionFailureKind> {
    if host.trim().is_empty() {
        return Err(ConnectionFailureKind::Resolution {
            context: "empty host".to_owned(),
        });
    }
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| ConnectionFailureKind::Resolution {
            context: e.to_string(),
        })?;
    addrs.next().ok_or_else(|| ConnectionFailureKind::Resolution {
        context: format!("{host} resolved to no addresses"),
    })
}

fn bind_for(peer: SocketAddr) -> Result<UdpSocket, ConnectionFailureKind> {
    let local: IpAddr = if peer.is_ipv4() {
        Ipv4Addr::UNSPECIFIED.into()
    } else {
        Ipv6Addr::UNSPECIFIED.into()
    };
    UdpSocket::bind(SocketAddr::new(local, 0)).map_err(|e| ConnectionFailureKind::Bind {
        context: e.to_string(),
    })
}

/// Longest single receive wait; the loop re-checks its deadlines after each one.
const MAX_RECV_WAIT: Duration = Duration::from_millis(100);

/// Sends handshake requests until the matching reply arrives or the timeout elapses.
/// Returns the interface the station reported.
///
/// A timeout or retry interval too large for `Instant` means "never": no deadline, or no
/// resend after the first request.
fn handshake(socket: &UdpSocket, config: &RadioConfig) -> Result<String, ConnectionFailureKind> {
    let transport = |context: String| ConnectionFailureKind::Transport { context };

    let nonce = next_nonce();
    let request = codec::encode_message(&RadioMessage::handshake_request(nonce, &config.interface))
        .map_err(|e| transport(e.to_string()))?;

    let started = Instant::now();
    let deadline = started.checked_add(config.handshake_timeout);
    let mut next_send = Some(started);
    let mut recv_buffer = [0u8; MAX_DATAGRAM_SIZE];

    loop {
        let now = Instant::now();
        if deadline.is_some_and(|deadline| now >= deadline) {
            return Err(ConnectionFailureKind::Timeout {
                millis: config.handshake_timeout.as_millis(),
            });
        }
        if next_send.is_some_and(|at| now >= at) {
            match socket.send(&request) {
                Ok(_) => {},
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(transport(e.to_string())),
            }
            next_send = now.checked_add(config.handshake_retry_interval);
        }

        let wake = match (next_send, deadline) {
            (Some(send), Some(deadline)) => Some(send.min(deadline)),
            (send, deadline) => send.or(deadline),
        };
        let wait = wake
            .map_or(MAX_RECV_WAIT, |at| at.saturating_duration_since(Instant::now()))
            .clamp(Duration::from_millis(1), MAX_RECV_WAIT);
        socket
            .set_read_timeout(Some(wait))
            .map_err(|e| transport(e.to_string()))?;

        match socket.recv(&mut recv_buffer) {
            Ok(len) => {
                let Some(datagram) = recv_buffer.get(..len) else {
                    continue;
                };
                match codec::decode_message(datagram) {
                    Ok(RadioMessage {
                        header,
                        body: MessageBody::HandshakeReply {
                            nonce: reply_nonce,
                            interface,
                        },
                    }) if header.magic == RADIO_MAGIC
                        && reply_nonce == nonce =>
                    {
                        return Ok(interface);
                    },
                    Ok(_) => {
                        tracing::trace!("ignoring unrelated datagram during handshake");
                    },
                    Err(e) => {
                        tracing::debug!(error = %e, "ignoring undecodable handshake datagram");
                    },
                }
            },
            Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {},
            Err(ref e) if e.kind() == ErrorKind::Interrupted => {},
            // ICMP port unreachable on a connected socket: nothing listens there.
            Err(e) => return Err(transport(e.to_string())),
        }
    }
}

/// A connected UDP socket speaking to one radio station.
#[derive(Debug)]
pub struct UdpRadioLink {
    socket: UdpSocket,
    peer: SocketAddr,
    interface: String,
    send_buffer: [u8; MAX_DATAGRAM_SIZE],
}

impl UdpRadioLink {
    /// Address of the radio station.
    #[must_use]
    pub const fn peer(&self) -> SocketAddr {
        self.peer
    }

    fn remote_call_error(command: &RadioCommand, context: String) -> FieldStateError {
        FieldStateError::RemoteCall {
            operation: command.operation(),
            context,
        }
    }
}

impl RadioLink for UdpRadioLink {
    fn call(&mut self, command: &RadioCommand) -> FieldStateResult<()> {
        let message = RadioMessage::command(*command);
        let len = codec::encode_message_into(&message, &mut self.send_buffer).map_err(
            |e: CodecError| Self::remote_call_error(command, e.to_string()),
        )?;
        let datagram = self.send_buffer.get(..len).ok_or_else(|| {
            Self::remote_call_error(command, format!("encoded length {len} exceeds send buffer"))
        })?;

        match self.socket.send(datagram) {
            Ok(sent) if sent == len => Ok(()),
            Ok(sent) => Err(Self::remote_call_error(
                command,
                format!("short send: {sent} of {len} bytes"),
            )),
            Err(e) => Err(Self::remote_call_error(
                command,
                format!("{:?}: {}", e.kind(), e),
            )),
        }
    }

    fn interface(&self) -> &str {
        &self.interface
    }
}

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn empty_host_is_a_resolution_failure() {
        assert!(matches!(
            resolve("  ", 2809),
            Err(ConnectionFailureKind::Resolution { .. })
        ));
    }

    #[test]
    fn literal_addresses_resolve_without_lookup() {
        let addr = resolve("127.0.0.1", 4000).unwrap();
        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 4000)));
    }

    #[test]
    fn nonces_differ_between_attempts() {
        assert_ne!(next_nonce(), next_nonce());
    }

    #[test]
    fn oversized_handshake_fails_without_waiting() {
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let config = RadioConfig {
            interface: "x".repeat(600),
            handshake_timeout: Duration::from_secs(30),
            ..RadioConfig::default()
        };
        let endpoint = Endpoint::new("127.0.0.1", silent.local_addr().unwrap().port());

        let started = Instant::now();
        let result = UdpRadioTransport::new().open(&endpoint, &config);
        assert!(started.elapsed() < Duration::from_secs(5));
        match result {
            Err(FieldStateError::ConnectionFailure {
                kind: ConnectionFailureKind::Transport { context },
                ..
            }) => assert!(context.contains("datagram limit"), "{context}"),
            Err(other) => panic!("expected an encoding failure, got {other}"),
            Ok(_) => panic!("an oversized handshake must not yield a link"),
        }
    }

    #[test]
    fn silent_peer_times_out() {
        // A bound socket that never answers.
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let config = RadioConfig {
            handshake_timeout: Duration::from_millis(100),
            handshake_retry_interval: Duration::from_millis(30),
            ..RadioConfig::default()
        };
        let endpoint = Endpoint::new("127.0.0.1", silent.local_addr().unwrap().port());

        let started = Instant::now();
        let result = UdpRadioTransport::new().open(&endpoint, &config);
        assert!(started.elapsed() < Duration::from_secs(5));
        match result {
            Err(FieldStateError::ConnectionFailure {
                kind: ConnectionFailureKind::Timeout { millis },
                ..
            }) => assert_eq!(millis, 100),
            Err(other) => panic!("expected timeout, got {other}"),
            Ok(_) => panic!("a silent peer must not yield a link"),
        }
    }
}
