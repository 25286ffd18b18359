//! Radio actuation proxy tests against in-memory transports.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

#[path = "common/mod.rs"]
mod common;

use common::blue_team;
use common::stubs::{LoopbackTransport, StubTransport};
use fieldstate::telemetry::{CollectingObserver, DiagnosticKind, DiagnosticSeverity};
use fieldstate::{
    CallFailurePolicy, ConnectionFailureKind, FieldStateError, PlayerId, RadioCommand,
    RadioConfig, RadioSensor, RadioSensorApi, RadioSensorHandler, SessionState,
};
use std::sync::Arc;

#[test]
fn connected_sensor_forwards_calls_in_order() {
    common::init_tracing();
    let transport = StubTransport::new();
    let sensor = RadioSensor::new(transport.clone(), RadioConfig::default()).unwrap();

    sensor.connect("radio.local", 0).unwrap();
    assert!(sensor.is_connected());
    assert_eq!(sensor.server_address(), "radio.local");
    assert_eq!(sensor.server_port(), 0);

    let player = PlayerId::new(4);
    sensor.set_player_kick_status(1, player, true);
    sensor.set_player_battery_charge(1, player, 77);

    assert_eq!(
        transport.calls(),
        vec![
            RadioCommand::KickStatus {
                team: 1,
                player,
                enabled: true
            },
            RadioCommand::BatteryCharge {
                team: 1,
                player,
                charge: 77
            },
        ]
    );
}

#[test]
fn calls_while_disconnected_are_dropped_not_queued() {
    let observer = Arc::new(CollectingObserver::new());
    let transport = StubTransport::new();
    let sensor = RadioSensor::new(transport.clone(), RadioConfig::default())
        .unwrap()
        .with_observer(observer.clone());

    sensor.set_player_dribble_status(1, PlayerId::new(1), true);
    sensor.connect("radio.local", 2809).unwrap();

    assert!(transport.calls().is_empty());
    let dropped = observer.diagnostics_of_kind(DiagnosticKind::NotConnected);
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].severity, DiagnosticSeverity::Warning);
}

#[test]
fn refused_connection_leaves_sensor_disconnected() {
    let observer = Arc::new(CollectingObserver::new());
    let transport = StubTransport::new();
    transport.set_refuse_connections(true);
    let sensor = RadioSensor::new(transport.clone(), RadioConfig::default())
        .unwrap()
        .with_observer(observer.clone());

    assert!(!sensor.try_connect("radio.local", 2809));
    assert_eq!(sensor.state(), SessionState::Disconnected);
    assert_eq!(sensor.server_address(), "");
    assert!(observer.has_diagnostic(DiagnosticKind::ConnectionFailure));

    transport.set_refuse_connections(false);
    assert!(sensor.try_connect("radio.local", 2809));
    assert_eq!(transport.open_count(), 2);
}

#[test]
fn wrong_interface_and_nil_handle_are_distinguished() {
    let mismatched =
        RadioSensor::new(StubTransport::reporting("Other.Object"), RadioConfig::default())
            .unwrap();
    match mismatched.connect("radio.local", 1) {
        Err(FieldStateError::ConnectionFailure {
            kind: ConnectionFailureKind::InterfaceMismatch { actual, .. },
            ..
        }) => assert_eq!(actual, "Other.Object"),
        other => panic!("expected interface mismatch, got {other:?}"),
    }

    let nil = RadioSensor::new(StubTransport::reporting(""), RadioConfig::default()).unwrap();
    assert!(matches!(
        nil.connect("radio.local", 1),
        Err(FieldStateError::ConnectionFailure {
            kind: ConnectionFailureKind::NilHandle,
            ..
        })
    ));
    assert!(!nil.is_connected());
}

#[test]
fn reconnect_replaces_the_previous_session() {
    let transport = StubTransport::new();
    let sensor = RadioSensor::new(transport.clone(), RadioConfig::default()).unwrap();
    sensor.connect("first", 1000).unwrap();
    sensor.connect("second", 2000).unwrap();

    assert!(sensor.is_connected());
    assert_eq!(sensor.server_address(), "second");
    assert_eq!(sensor.server_port(), 2000);

    sensor.disconnect();
    sensor.disconnect();
    assert_eq!(sensor.state(), SessionState::Disconnected);
    assert_eq!(sensor.server_port(), 0);
}

#[test]
fn failed_call_policy_decides_whether_the_session_survives() {
    for (policy, stays) in [
        (CallFailurePolicy::StayConnected, true),
        (CallFailurePolicy::Disconnect, false),
    ] {
        let observer = Arc::new(CollectingObserver::new());
        let transport = StubTransport::new();
        let config = RadioConfig {
            call_failure_policy: policy,
            ..RadioConfig::default()
        };
        let sensor = RadioSensor::new(transport.clone(), config)
            .unwrap()
            .with_observer(observer.clone());
        sensor.connect("radio.local", 0).unwrap();

        transport.set_fail_calls(true);
        sensor.set_player_capacitor_charge(1, PlayerId::new(2), 10);
        assert_eq!(sensor.is_connected(), stays, "policy {policy:?}");
        assert!(observer.has_diagnostic(DiagnosticKind::RemoteCall));

        transport.set_fail_calls(false);
        sensor.set_player_capacitor_charge(1, PlayerId::new(2), 11);
        assert_eq!(transport.calls().len(), usize::from(stays));
    }
}

#[test]
fn sensor_and_handler_compose_without_sockets() {
    let (directory, blue) = blue_team(&[3]);
    let handler = Arc::new(RadioSensorHandler::new(directory));
    let sensor = RadioSensor::new(
        LoopbackTransport {
            target: Arc::clone(&handler),
        },
        RadioConfig::default(),
    )
    .unwrap();
    sensor.connect("localhost", 0).unwrap();

    sensor.set_player_battery_charge(1, PlayerId::new(3), 200);
    sensor.set_player_dribble_status(1, PlayerId::new(3), true);

    assert_eq!(blue.battery_charge(PlayerId::new(3)), 200);
    assert!(blue.dribble_enabled(PlayerId::new(3)));
}

#[test]
fn sensor_is_shareable_between_threads() {
    let transport = StubTransport::new();
    let sensor = Arc::new(RadioSensor::new(transport.clone(), RadioConfig::default()).unwrap());
    sensor.connect("radio.local", 0).unwrap();

    let handles: Vec<_> = (0..4_u8)
        .map(|n| {
            let sensor = Arc::clone(&sensor);
            std::thread::spawn(move || {
                for charge in 0..50 {
                    sensor.set_player_battery_charge(1, PlayerId::new(n), charge);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(transport.calls().len(), 200);
}
