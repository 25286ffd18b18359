//! Inbound side of the radio link.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use web_time::Duration;

use crate::network::codec::{self, MAX_DATAGRAM_SIZE};
use crate::network::messages::{MessageBody, RadioMessage};
use crate::telemetry::{
    report_to_observer, DiagnosticKind, DiagnosticObserver, DiagnosticSeverity, SharedObserver,
};
use crate::{diagnostic, FieldStateError, FieldStateResult, RadioSensorApi, RadioServerConfig};

/// A non-blocking UDP endpoint that answers handshakes and dispatches received commands.
///
/// The server has no thread of its own: call [`poll`](Self::poll) from an existing loop
/// or hand it a thread with [`run_until`](Self::run_until). Commands are dispatched in
/// arrival order, straight into the handler, without buffering.
///
/// # Example
///
/// ```no_run
/// use fieldstate::{RadioSensorHandler, RadioServer, RadioServerConfig, TeamDirectory};
/// use std::sync::Arc;
///
/// let directory = Arc::new(TeamDirectory::new());
/// let mut server = RadioServer::bind(
///     RadioServerConfig::default(),
///     RadioSensorHandler::new(directory),
/// )?;
///
/// loop {
///     server.poll();
///     // ... rest of the control loop ...
/// }
/// # Ok::<(), fieldstate::FieldStateError>(())
/// ```
pub struct RadioServer<H> {
    socket: UdpSocket,
    handler: H,
    config: RadioServerConfig,
    recv_buffer: [u8; MAX_DATAGRAM_SIZE],
    observer: Option<SharedObserver>,
}

impl<H> std::fmt::Debug for RadioServer<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadioServer")
            .field("local_addr", &self.socket.local_addr().ok())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<H: RadioSensorApi> RadioServer<H> {
    /// Binds the server socket described by `config`.
    pub fn bind(config: RadioServerConfig, handler: H) -> FieldStateResult<Self> {
        config.validate()?;
        let addr = SocketAddr::new(config.bind_address, config.bind_port);
        let socket = UdpSocket::bind(addr).map_err(|e| FieldStateError::SocketError {
            context: format!("could not bind {addr}: {e}"),
        })?;
        socket
            .set_nonblocking(true)
            .map_err(|e| FieldStateError::SocketError {
                context: e.to_string(),
            })?;
        tracing::info!(%addr, interface = %config.interface, "radio server listening");
        Ok(Self {
            socket,
            handler,
            config,
            recv_buffer: [0; MAX_DATAGRAM_SIZE],
            observer: None,
        })
    }

    /// Routes the server's diagnostics to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DiagnosticObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The bound address.
    pub fn local_addr(&self) -> FieldStateResult<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| FieldStateError::SocketError {
                context: e.to_string(),
            })
    }

    /// The handler receiving commands.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Drains up to `max_datagrams_per_poll` pending datagrams. Returns the number of
    /// commands dispatched.
    pub fn poll(&mut self) -> usize {
        let mut dispatched = 0;
        for _ in 0..self.config.max_datagrams_per_poll {
            match self.socket.recv_from(&mut self.recv_buffer) {
                Ok((len, src)) => {
                    let Some(datagram) = self.recv_buffer.get(..len) else {
                        continue;
                    };
                    match codec::decode_message(datagram) {
                        Ok(message) => {
                            if self.handle_message(message, src) {
                                dispatched += 1;
                            }
                        },
                        Err(e) => self.report(
                            diagnostic!(
                                DiagnosticSeverity::Warning,
                                DiagnosticKind::Codec,
                                "discarding undecodable datagram from {}: {}",
                                src,
                                e
                            )
                            .with_context("len", len.to_string()),
                        ),
                    }
                },
                // no more datagrams
                Err(ref err) if err.kind() == ErrorKind::WouldBlock => break,
                // a previous reply bounced off a closed client port
                Err(ref err) if err.kind() == ErrorKind::ConnectionReset => continue,
                Err(ref err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.report(diagnostic!(
                        DiagnosticSeverity::Error,
                        DiagnosticKind::Transport,
                        "radio server receive failed: {:?}: {}",
                        err.kind(),
                        err
                    ));
                    break;
                },
            }
        }
        dispatched
    }

    /// Polls until `stop` is set, sleeping `idle` whenever no datagram was pending.
    pub fn run_until(&mut self, stop: &AtomicBool, idle: Duration) {
        while !stop.load(Ordering::Acquire) {
            if self.poll() == 0 {
                std::thread::sleep(idle);
            }
        }
    }

    fn handle_message(&self, message: RadioMessage, src: SocketAddr) -> bool {
        if !message.has_valid_magic() {
            self.report(diagnostic!(
                DiagnosticSeverity::Warning,
                DiagnosticKind::Codec,
                "discarding datagram from {} with magic {:#06x}",
                src,
                message.header.magic
            ));
            return false;
        }
        match message.body {
            MessageBody::HandshakeRequest { nonce, interface } => {
                tracing::debug!(%src, requested = %interface, "answering radio handshake");
                self.reply(&RadioMessage::handshake_reply(nonce, &self.config.interface), src);
                false
            },
            MessageBody::HandshakeReply { .. } => {
                tracing::trace!(%src, "ignoring stray handshake reply");
                false
            },
            MessageBody::Command(command) => {
                tracing::trace!(%src, operation = command.operation(), "radio command");
                self.handler.dispatch(&command);
                true
            },
        }
    }

    fn reply(&self, message: &RadioMessage, dst: SocketAddr) {
        let sent = codec::encode_message(message)
            .map_err(|e| e.to_string())
            .and_then(|bytes| self.socket.send_to(&bytes, dst).map_err(|e| e.to_string()));
        if let Err(context) = sent {
            self.report(diagnostic!(
                DiagnosticSeverity::Warning,
                DiagnosticKind::Transport,
                "could not answer handshake from {}: {}",
                dst,
                context
            ));
        }
    }

    fn report(&self, diagnostic: crate::telemetry::Diagnostic) {
        report_to_observer(self.observer.as_ref(), &diagnostic);
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
    use crate::telemetry::CollectingObserver;
    use crate::{PlayerId, RadioCommand, TeamNumber};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<RadioCommand>>);

    impl RadioSensorApi for Recorder {
        fn set_player_battery_charge(&self, team: TeamNumber, player: PlayerId, charge: u8) {
            self.0.lock().push(RadioCommand::BatteryCharge {
                team,
                player,
                charge,
            });
        }
        fn set_player_capacitor_charge(&self, _: TeamNumber, _: PlayerId, _: u8) {}
        fn set_player_dribble_status(&self, _: TeamNumber, _: PlayerId, _: bool) {}
        fn set_player_kick_status(&self, _: TeamNumber, _: PlayerId, _: bool) {}
    }

    fn loopback_config() -> RadioServerConfig {
        RadioServerConfig::loopback()
    }

    fn poll_until<H: RadioSensorApi>(server: &mut RadioServer<H>, expected: usize) -> usize {
        let mut total = 0;
        for _ in 0..100 {
            total += server.poll();
            if total >= expected {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        total
    }

    #[test]
    fn dispatches_commands_and_reports_garbage() {
        let observer = Arc::new(CollectingObserver::new());
        let mut server = RadioServer::bind(loopback_config(), Recorder::default())
            .unwrap()
            .with_observer(observer.clone());
        let addr = server.local_addr().unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();

        client.send_to(&[0xFF, 0x00, 0x13], addr).unwrap();
        let command = RadioCommand::BatteryCharge {
            team: 1,
            player: PlayerId::new(3),
            charge: 200,
        };
        let bytes = codec::encode_message(&RadioMessage::command(command)).unwrap();
        client.send_to(&bytes, addr).unwrap();

        assert_eq!(poll_until(&mut server, 1), 1);
        assert_eq!(*server.handler().0.lock(), vec![command]);
        assert!(observer.has_diagnostic(DiagnosticKind::Codec));
    }

    #[test]
    fn answers_handshake_with_configured_interface() {
        let mut server = RadioServer::bind(loopback_config(), Recorder::default()).unwrap();
        let addr = server.local_addr().unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .set_read_timeout(Some(std::time::Duration::from_millis(20)))
            .unwrap();

        let request =
            codec::encode_message(&RadioMessage::handshake_request(42, "anything")).unwrap();
        client.send_to(&request, addr).unwrap();

        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];
        let mut reply = None;
        for _ in 0..100 {
            server.poll();
            if let Ok(len) = client.recv(&mut buffer) {
                reply = Some(codec::decode_message(&buffer[..len]).unwrap());
                break;
            }
        }
        let reply = reply.expect("server must answer the handshake");
        assert_eq!(
            reply.body,
            MessageBody::HandshakeReply {
                nonce: 42,
                interface: crate::DEFAULT_INTERFACE.to_owned()
            }
        );
    }

    #[test]
    fn run_until_returns_once_stopped() {
        let mut server = RadioServer::bind(loopback_config(), Recorder::default()).unwrap();
        let stop = AtomicBool::new(true);
        server.run_until(&stop, Duration::from_millis(1));
        assert!(server.handler().0.lock().is_empty());
    }

    #[test]
    fn zero_budget_is_rejected() {
        let config = RadioServerConfig {
            max_datagrams_per_poll: 0,
            ..loopback_config()
        };
        assert!(matches!(
            RadioServer::bind(config, Recorder::default()),
            Err(FieldStateError::InvalidConfig { .. })
        ));
    }
}
