//! In-memory radio transports.
//!
//! [`StubTransport`] records every call and can be told to refuse connections or fail
//! calls. [`LoopbackTransport`] hands each call straight to a local
//! [`RadioSensorApi`], which lets the outbound and inbound halves be tested together
//! without sockets.

#![allow(dead_code)]
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

use fieldstate::{
    ConnectionFailureKind, Endpoint, FieldStateError, FieldStateResult, RadioCommand,
    RadioConfig, RadioLink, RadioSensorApi, RadioTransport,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared state between a [`StubTransport`] and the links it opened.
#[derive(Default)]
pub struct StubState {
    pub calls: Mutex<Vec<RadioCommand>>,
    pub opened: Mutex<Vec<Endpoint>>,
    pub refuse_connections: AtomicBool,
    pub fail_calls: AtomicBool,
    pub open_count: AtomicUsize,
}

/// Records calls; failure modes are toggled through [`StubState`].
#[derive(Clone, Default)]
pub struct StubTransport {
    pub state: Arc<StubState>,
    /// Interface reported by opened links. `None` means the default interface.
    pub interface: Option<String>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reporting(interface: &str) -> Self {
        Self {
            state: Arc::default(),
            interface: Some(interface.to_owned()),
        }
    }

    pub fn calls(&self) -> Vec<RadioCommand> {
        self.state.calls.lock().clone()
    }

    pub fn set_refuse_connections(&self, refuse: bool) {
        self.state.refuse_connections.store(refuse, Ordering::SeqCst);
    }

    pub fn set_fail_calls(&self, fail: bool) {
        self.state.fail_calls.store(fail, Ordering::SeqCst);
    }

    pub fn open_count(&self) -> usize {
        self.state.open_count.load(Ordering::SeqCst)
    }
}

impl RadioTransport for StubTransport {
    fn open(
        &self,
        endpoint: &Endpoint,
        config: &RadioConfig,
    ) -> FieldStateResult<Box<dyn RadioLink>> {
        self.state.open_count.fetch_add(1, Ordering::SeqCst);
        self.state.opened.lock().push(endpoint.clone());
        if self.state.refuse_connections.load(Ordering::SeqCst) {
            return Err(FieldStateError::ConnectionFailure {
                endpoint: endpoint.to_string(),
                kind: ConnectionFailureKind::Transport {
                    context: "connection refused".to_owned(),
                },
            });
        }
        let interface = self
            .interface
            .clone()
            .unwrap_or_else(|| config.interface.clone());
        if interface.is_empty() {
            return Err(FieldStateError::ConnectionFailure {
                endpoint: endpoint.to_string(),
                kind: ConnectionFailureKind::NilHandle,
            });
        }
        if interface != config.interface {
            return Err(FieldStateError::ConnectionFailure {
                endpoint: endpoint.to_string(),
                kind: ConnectionFailureKind::InterfaceMismatch {
                    expected: config.interface.clone(),
                    actual: interface,
                },
            });
        }
        Ok(Box::new(StubLink {
            state: Arc::clone(&self.state),
            interface,
        }))
    }
}

pub struct StubLink {
    state: Arc<StubState>,
    interface: String,
}

impl RadioLink for StubLink {
    fn call(&mut self, command: &RadioCommand) -> FieldStateResult<()> {
        if self.state.fail_calls.load(Ordering::SeqCst) {
            return Err(FieldStateError::RemoteCall {
                operation: command.operation(),
                context: "link dropped".to_owned(),
            });
        }
        self.state.calls.lock().push(*command);
        Ok(())
    }

    fn interface(&self) -> &str {
        &self.interface
    }
}

/// Delivers every call to `target` synchronously.
pub struct LoopbackTransport<A> {
    pub target: Arc<A>,
}

impl<A: RadioSensorApi + 'static> RadioTransport for LoopbackTransport<A> {
    fn open(
        &self,
        _endpoint: &Endpoint,
        config: &RadioConfig,
    ) -> FieldStateResult<Box<dyn RadioLink>> {
        Ok(Box::new(LoopbackLink {
            target: Arc::clone(&self.target),
            interface: config.interface.clone(),
        }))
    }
}

struct LoopbackLink<A> {
    target: Arc<A>,
    interface: String,
}

impl<A: RadioSensorApi> RadioLink for LoopbackLink<A> {
    fn call(&mut self, command: &RadioCommand) -> FieldStateResult<()> {
        self.target.dispatch(command);
        Ok(())
    }

    fn interface(&self) -> &str {
        &self.interface
    }
}
