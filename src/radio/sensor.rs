//! Outbound radio actuation proxy.

use std::sync::Arc;

use crate::sync::{lock, Mutex};
use crate::telemetry::{
    report_to_observer, Diagnostic, DiagnosticKind, DiagnosticObserver, DiagnosticSeverity,
    SharedObserver,
};
use crate::{
    diagnostic, CallFailurePolicy, ConnectionFailureKind, Endpoint, FieldStateError,
    FieldStateResult, PlayerId, RadioCommand, RadioConfig, RadioLink, RadioSensorApi,
    RadioTransport, TeamNumber, UdpRadioTransport,
};

/// Connection state of a [`RadioSensor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No link. Calls are dropped.
    #[default]
    Disconnected,
    /// A handshake is in flight. Calls are dropped.
    Connecting,
    /// A link is established. Calls are delivered.
    Connected,
}

struct Session {
    state: SessionState,
    link: Option<Box<dyn RadioLink>>,
    server_address: String,
    server_port: u16,
    // Bumped by every connect and disconnect so a handshake that finishes late can tell
    // it was superseded.
    epoch: u64,
}

impl Session {
    fn reset(&mut self) -> Option<Box<dyn RadioLink>> {
        self.state = SessionState::Disconnected;
        self.server_address.clear();
        self.server_port = 0;
        self.link.take()
    }
}

/// Client side of the radio link.
///
/// While connected, each `set_player_*` call is sent to the radio station as one remote
/// call. While disconnected or connecting, calls are dropped and reported. Nothing is
/// queued and no call waits for a reconnection.
///
/// The link lives under a session mutex that is independent of every [`TeamState`]
/// lock, and the handshake itself runs without that mutex held: a slow `connect` never
/// blocks `is_connected` or concurrent (dropped) calls.
///
/// [`TeamState`]: crate::TeamState
///
/// # Example
///
/// ```
/// use fieldstate::{PlayerId, RadioConfig, RadioSensor, RadioSensorApi, SessionState};
///
/// let sensor = RadioSensor::udp(RadioConfig::lan())?;
/// assert_eq!(sensor.state(), SessionState::Disconnected);
///
/// // Not connected: the call is dropped and reported, never queued.
/// sensor.set_player_kick_status(1, PlayerId::new(3), true);
/// assert!(!sensor.is_connected());
/// # Ok::<(), fieldstate::FieldStateError>(())
/// ```
pub struct RadioSensor {
    transport: Box<dyn RadioTransport>,
    config: RadioConfig,
    session: Mutex<Session>,
    observer: Option<SharedObserver>,
}

impl std::fmt::Debug for RadioSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = lock(&self.session);
        f.debug_struct("RadioSensor")
            .field("state", &session.state)
            .field("server_address", &session.server_address)
            .field("server_port", &session.server_port)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RadioSensor {
    /// Creates a disconnected sensor that opens links through `transport`.
    pub fn new(
        transport: impl RadioTransport + 'static,
        config: RadioConfig,
    ) -> FieldStateResult<Self> {
        config.validate()?;
        Ok(Self {
            transport: Box::new(transport),
            config,
            session: Mutex::new(Session {
                state: SessionState::Disconnected,
                link: None,
                server_address: String::new(),
                server_port: 0,
                epoch: 0,
            }),
            observer: None,
        })
    }

    /// Creates a disconnected sensor using [`UdpRadioTransport`].
    pub fn udp(config: RadioConfig) -> FieldStateResult<Self> {
        Self::new(UdpRadioTransport::new(), config)
    }

    /// Routes this sensor's diagnostics to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DiagnosticObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Connects to the radio station at `address:port`. Port `0` uses
    /// [`RadioConfig::default_port`].
    ///
    /// Any existing session is dropped first. On failure the sensor is left
    /// [`Disconnected`](SessionState::Disconnected); the error names the handshake step
    /// that failed.
    pub fn connect(&self, address: &str, port: u16) -> FieldStateResult<()> {
        let endpoint = Endpoint::new(address, port);
        let result = self.connect_to(&endpoint);
        if let Err(err) = &result {
            self.report(
                diagnostic!(
                    DiagnosticSeverity::Error,
                    DiagnosticKind::ConnectionFailure,
                    "could not connect to the radio station: {}",
                    err
                )
                .with_context("endpoint", endpoint.to_string()),
            );
        }
        result
    }

    /// Like [`connect`](Self::connect), reporting only success.
    pub fn try_connect(&self, address: &str, port: u16) -> bool {
        self.connect(address, port).is_ok()
    }

    fn connect_to(&self, endpoint: &Endpoint) -> FieldStateResult<()> {
        let failure = |kind: ConnectionFailureKind| FieldStateError::ConnectionFailure {
            endpoint: endpoint.to_string(),
            kind,
        };

        let (epoch, previous) = {
            let mut session = lock(&self.session);
            if session.state == SessionState::Connecting {
                return Err(failure(ConnectionFailureKind::AlreadyConnecting));
            }
            let previous = session.reset();
            session.state = SessionState::Connecting;
            session.epoch = session.epoch.wrapping_add(1);
            (session.epoch, previous)
        };
        drop(previous);

        let opened = self
            .transport
            .open(endpoint, &self.config)
            .and_then(|link| {
                if link.interface() == self.config.interface {
                    Ok(link)
                } else {
                    Err(failure(ConnectionFailureKind::InterfaceMismatch {
                        expected: self.config.interface.clone(),
                        actual: link.interface().to_owned(),
                    }))
                }
            });

        let mut session = lock(&self.session);
        if session.epoch != epoch {
            // disconnect() or a later connect() took over while the handshake ran
            return Err(failure(ConnectionFailureKind::Cancelled));
        }
        match opened {
            Ok(link) => {
                session.link = Some(link);
                session.state = SessionState::Connected;
                session.server_address = endpoint.host.clone();
                session.server_port = endpoint.port;
                drop(session);
                tracing::info!(endpoint = %endpoint, "radio sensor connected");
                Ok(())
            },
            Err(err) => {
                session.state = SessionState::Disconnected;
                Err(err)
            },
        }
    }

    /// Drops the session. Always succeeds; a handshake in flight is abandoned.
    pub fn disconnect(&self) {
        let link = {
            let mut session = lock(&self.session);
            session.epoch = session.epoch.wrapping_add(1);
            session.reset()
        };
        if link.is_some() {
            tracing::info!("radio sensor disconnected");
        }
    }

    /// Whether calls are currently delivered.
    pub fn is_connected(&self) -> bool {
        lock(&self.session).state == SessionState::Connected
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        lock(&self.session).state
    }

    /// Host of the established session, empty when disconnected.
    pub fn server_address(&self) -> String {
        lock(&self.session).server_address.clone()
    }

    /// Port of the established session as passed to `connect`, `0` when disconnected.
    pub fn server_port(&self) -> u16 {
        lock(&self.session).server_port
    }

    /// Delivers `command` if connected; otherwise drops it. Failures are reported, and
    /// returned for callers that want them.
    pub fn call(&self, command: &RadioCommand) -> FieldStateResult<()> {
        let outcome = {
            let mut guard = lock(&self.session);
            let session = &mut *guard;
            let delivered = match (session.state, session.link.as_mut()) {
                (SessionState::Connected, Some(link)) => Some(link.call(command)),
                _ => None,
            };
            match delivered {
                None => (
                    Err(FieldStateError::NotConnected {
                        operation: command.operation(),
                    }),
                    None,
                ),
                Some(Err(err))
                    if self.config.call_failure_policy == CallFailurePolicy::Disconnect =>
                {
                    session.epoch = session.epoch.wrapping_add(1);
                    (Err(err), session.reset())
                },
                Some(result) => (result, None),
            }
        };
        let (result, demoted_link) = outcome;
        let demoted = demoted_link.is_some();
        drop(demoted_link);

        match &result {
            Ok(()) => {},
            Err(err @ FieldStateError::NotConnected { .. }) => self.report(
                self.command_diagnostic(
                    command,
                    diagnostic!(
                        DiagnosticSeverity::Warning,
                        DiagnosticKind::NotConnected,
                        "dropping call: {}",
                        err
                    ),
                ),
            ),
            Err(err) => self.report(
                self.command_diagnostic(
                    command,
                    diagnostic!(
                        DiagnosticSeverity::Error,
                        DiagnosticKind::RemoteCall,
                        "remote call failed: {}",
                        err
                    ),
                )
                .with_context("demoted", demoted.to_string()),
            ),
        }
        result
    }

    fn command_diagnostic(&self, command: &RadioCommand, diagnostic: Diagnostic) -> Diagnostic {
        diagnostic
            .with_team(command.team())
            .with_player(command.player())
            .with_context("operation", command.operation())
    }

    fn report(&self, diagnostic: Diagnostic) {
        report_to_observer(self.observer.as_ref(), &diagnostic);
    }
}

impl RadioSensorApi for RadioSensor {
    fn set_player_battery_charge(&self, team: TeamNumber, player: PlayerId, charge: u8) {
        let _ = self.call(&RadioCommand::BatteryCharge {
            team,
            player,
            charge,
        });
    }

    fn set_player_capacitor_charge(&self, team: TeamNumber, player: PlayerId, charge: u8) {
        let _ = self.call(&RadioCommand::CapacitorCharge {
            team,
            player,
            charge,
        });
    }

    fn set_player_dribble_status(&self, team: TeamNumber, player: PlayerId, enabled: bool) {
        let _ = self.call(&RadioCommand::DribbleStatus {
            team,
            player,
            enabled,
        });
    }

    fn set_player_kick_status(&self, team: TeamNumber, player: PlayerId, enabled: bool) {
        let _ = self.call(&RadioCommand::KickStatus {
            team,
            player,
            enabled,
        });
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
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;

    struct Refusing;

    impl RadioTransport for Refusing {
        fn open(
            &self,
            endpoint: &Endpoint,
            _: &RadioConfig,
        ) -> FieldStateResult<Box<dyn RadioLink>> {
            Err(FieldStateError::ConnectionFailure {
                endpoint: endpoint.to_string(),
                kind: ConnectionFailureKind::NilHandle,
            })
        }
    }

    struct Flaky {
        fail: Arc<AtomicBool>,
        interface: String,
    }

    impl RadioLink for Flaky {
        fn call(&mut self, command: &RadioCommand) -> FieldStateResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                Err(FieldStateError::RemoteCall {
                    operation: command.operation(),
                    context: "link down".to_owned(),
                })
            } else {
                Ok(())
            }
        }

        fn interface(&self) -> &str {
            &self.interface
        }
    }

    struct FlakyTransport {
        fail: Arc<AtomicBool>,
        interface: &'static str,
    }

    impl RadioTransport for FlakyTransport {
        fn open(&self, _: &Endpoint, _: &RadioConfig) -> FieldStateResult<Box<dyn RadioLink>> {
            Ok(Box::new(Flaky {
                fail: self.fail.clone(),
                interface: self.interface.to_owned(),
            }))
        }
    }

    fn flaky(config: RadioConfig) -> (RadioSensor, Arc<AtomicBool>, Arc<CollectingObserver>) {
        let fail = Arc::new(AtomicBool::new(false));
        let observer = Arc::new(CollectingObserver::new());
        let sensor = RadioSensor::new(
            FlakyTransport {
                fail: fail.clone(),
                interface: crate::DEFAULT_INTERFACE,
            },
            config,
        )
        .unwrap()
        .with_observer(observer.clone());
        (sensor, fail, observer)
    }

    #[test]
    fn failed_connect_leaves_session_disconnected() {
        let observer = Arc::new(CollectingObserver::new());
        let sensor = RadioSensor::new(Refusing, RadioConfig::default())
            .unwrap()
            .with_observer(observer.clone());

        let err = sensor.connect("station", 0).unwrap_err();
        assert!(matches!(
            err,
            FieldStateError::ConnectionFailure {
                kind: ConnectionFailureKind::NilHandle,
                ..
            }
        ));
        assert_eq!(sensor.state(), SessionState::Disconnected);
        assert!(!sensor.try_connect("station", 0));
        assert_eq!(sensor.server_address(), "");
        assert_eq!(
            observer
                .diagnostics_of_kind(DiagnosticKind::ConnectionFailure)
                .len(),
            2
        );
    }

    #[test]
    fn connect_records_bookkeeping_and_disconnect_clears_it() {
        let (sensor, _, _) = flaky(RadioConfig::default());
        sensor.connect("station.local", 4000).unwrap();
        assert!(sensor.is_connected());
        assert_eq!(sensor.server_address(), "station.local");
        assert_eq!(sensor.server_port(), 4000);

        sensor.disconnect();
        sensor.disconnect();
        assert_eq!(sensor.state(), SessionState::Disconnected);
        assert_eq!(sensor.server_address(), "");
        assert_eq!(sensor.server_port(), 0);
    }

    #[test]
    fn wrong_interface_is_rejected() {
        let sensor = RadioSensor::new(
            FlakyTransport {
                fail: Arc::new(AtomicBool::new(false)),
                interface: "FieldState.Vision",
            },
            RadioConfig::default(),
        )
        .unwrap();
        let err = sensor.connect("station", 1).unwrap_err();
        assert!(matches!(
            err,
            FieldStateError::ConnectionFailure {
                kind: ConnectionFailureKind::InterfaceMismatch { .. },
                ..
            }
        ));
        assert!(!sensor.is_connected());
    }

    #[test]
    fn calls_while_disconnected_are_dropped_and_reported() {
        let (sensor, _, observer) = flaky(RadioConfig::default());
        sensor.set_player_kick_status(1, PlayerId::new(2), true);

        let reports = observer.diagnostics_of_kind(DiagnosticKind::NotConnected);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].team, Some(1));
        assert_eq!(
            reports[0].context.get("operation").unwrap(),
            "set_player_kick_status"
        );
        assert_eq!(sensor.state(), SessionState::Disconnected);
    }

    #[test]
    fn call_failure_keeps_session_by_default() {
        let (sensor, fail, observer) = flaky(RadioConfig::default());
        sensor.connect("station", 1).unwrap();
        fail.store(true, Ordering::SeqCst);

        sensor.set_player_battery_charge(1, PlayerId::new(3), 10);
        assert!(observer.has_diagnostic(DiagnosticKind::RemoteCall));
        assert!(sensor.is_connected());

        fail.store(false, Ordering::SeqCst);
        assert!(sensor
            .call(&RadioCommand::BatteryCharge {
                team: 1,
                player: PlayerId::new(3),
                charge: 10
            })
            .is_ok());
    }

    #[test]
    fn call_failure_demotes_under_strict_policy() {
        let (sensor, fail, observer) = flaky(RadioConfig::strict());
        sensor.connect("station", 1).unwrap();
        fail.store(true, Ordering::SeqCst);

        sensor.set_player_capacitor_charge(1, PlayerId::new(3), 10);
        assert!(!sensor.is_connected());
        assert_eq!(sensor.server_address(), "");
        let report = &observer.diagnostics_of_kind(DiagnosticKind::RemoteCall)[0];
        assert_eq!(report.context.get("demoted").unwrap(), "true");
    }

    struct Gated {
        entered: mpsc::Sender<()>,
        release: parking_lot::Mutex<mpsc::Receiver<()>>,
    }

    impl RadioTransport for Gated {
        fn open(&self, _: &Endpoint, _: &RadioConfig) -> FieldStateResult<Box<dyn RadioLink>> {
            self.entered.send(()).unwrap();
            self.release.lock().recv().unwrap();
            Ok(Box::new(Flaky {
                fail: Arc::new(AtomicBool::new(false)),
                interface: crate::DEFAULT_INTERFACE.to_owned(),
            }))
        }
    }

    #[test]
    fn disconnect_during_handshake_cancels_it() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let sensor = Arc::new(
            RadioSensor::new(
                Gated {
                    entered: entered_tx,
                    release: parking_lot::Mutex::new(release_rx),
                },
                RadioConfig::default(),
            )
            .unwrap(),
        );

        let connecting = Arc::clone(&sensor);
        let handle = std::thread::spawn(move || connecting.connect("station", 1));
        entered_rx.recv().unwrap();

        assert_eq!(sensor.state(), SessionState::Connecting);
        // a second attempt while the first is in flight
        assert!(matches!(
            sensor.connect("station", 1),
            Err(FieldStateError::ConnectionFailure {
                kind: ConnectionFailureKind::AlreadyConnecting,
                ..
            })
        ));
        sensor.disconnect();
        release_tx.send(()).unwrap();

        let result = handle.join().unwrap();
        assert!(matches!(
            result,
            Err(FieldStateError::ConnectionFailure {
                kind: ConnectionFailureKind::Cancelled,
                ..
            })
        ));
        assert!(!sensor.is_connected());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = RadioConfig {
            interface: String::new(),
            ..RadioConfig::default()
        };
        assert!(RadioSensor::new(Refusing, config).is_err());
    }
}
