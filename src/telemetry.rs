//! Structured diagnostics pipeline.
//!
//! Every dropped write, failed connect and swallowed remote-call fault in this crate is
//! reported as a [`Diagnostic`] rather than returned to the caller. Diagnostics are
//! structured data that can be:
//!
//! - Logged via tracing (default behavior)
//! - Collected programmatically for testing
//! - Sent to custom observers (metrics, alerting, etc.)
//!
//! Diagnostics are purely observational: nothing in the crate consults an observer to
//! make a control decision.
//!
//! # Example
//!
//! ```
//! use fieldstate::telemetry::{CollectingObserver, DiagnosticKind};
//! use fieldstate::{PlayerId, TeamState};
//! use std::sync::Arc;
//!
//! let observer = Arc::new(CollectingObserver::new());
//! let team = TeamState::new(1, "Blue").with_observer(observer.clone());
//!
//! // Player 9 was never added, so the write is dropped and reported.
//! team.set_player_battery_charge(PlayerId::new(9), 200);
//! assert!(observer.has_diagnostic(DiagnosticKind::InvalidPlayer));
//! ```

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{PlayerId, TeamNumber};

/// Severity of a diagnostic.
///
/// Severities are ordered from least to most severe, allowing filtering
/// and comparison operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    /// Expected under normal churn; the operation degraded gracefully.
    ///
    /// Example: a read for a player that was removed a moment ago.
    Warning,
    /// The operation was lost.
    ///
    /// Example: a remote call that failed at the transport level.
    Error,
}

impl DiagnosticSeverity {
    /// Returns a string representation suitable for logging/metrics labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories of diagnostics.
///
/// # Forward Compatibility
///
/// This enum is marked `#[non_exhaustive]` because new categories
/// may be added in future versions. Always include a wildcard arm when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum DiagnosticKind {
    /// An attribute was read or written for a player that is not registered.
    InvalidPlayer,
    /// An inbound command named a team the world map does not know.
    UnknownTeam,
    /// A connect handshake failed.
    ConnectionFailure,
    /// A remote call on an established session failed and was swallowed.
    RemoteCall,
    /// A remote call was attempted without an established session.
    NotConnected,
    /// A datagram could not be encoded or decoded.
    Codec,
    /// A socket-level fault outside of a remote call.
    Transport,
    /// A configuration value was rejected or adjusted.
    Configuration,
}

impl DiagnosticKind {
    /// Returns a string representation suitable for logging/metrics labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPlayer => "invalid_player",
            Self::UnknownTeam => "unknown_team",
            Self::ConnectionFailure => "connection_failure",
            Self::RemoteCall => "remote_call",
            Self::NotConnected => "not_connected",
            Self::Codec => "codec",
            Self::Transport => "transport",
            Self::Configuration => "configuration",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded diagnostic.
///
/// # Example
///
/// ```
/// use fieldstate::telemetry::{Diagnostic, DiagnosticKind, DiagnosticSeverity};
/// use fieldstate::PlayerId;
///
/// let diagnostic = Diagnostic::new(
///     DiagnosticSeverity::Warning,
///     DiagnosticKind::InvalidPlayer,
///     "no such player",
///     "team.rs:42",
/// )
/// .with_team(1)
/// .with_player(PlayerId::new(3))
/// .with_context("operation", "battery_charge");
///
/// assert_eq!(diagnostic.team, Some(1));
/// assert!(diagnostic.to_string().contains("invalid_player"));
/// ```
#[derive(Debug, Clone, serde::Serialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: DiagnosticSeverity,
    /// The category of this diagnostic.
    pub kind: DiagnosticKind,
    /// Human-readable description of what happened.
    pub message: String,
    /// Source location where the diagnostic was raised (file:line).
    pub location: &'static str,
    /// The team involved, if any.
    pub team: Option<TeamNumber>,
    /// The player involved, if any.
    pub player: Option<PlayerId>,
    /// Additional structured context as key-value pairs.
    pub context: BTreeMap<String, String>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    #[must_use]
    pub fn new(
        severity: DiagnosticSeverity,
        kind: DiagnosticKind,
        message: impl Into<String>,
        location: &'static str,
    ) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            location,
            team: None,
            player: None,
            context: BTreeMap::new(),
        }
    }

    /// Sets the team this diagnostic concerns.
    #[must_use]
    pub fn with_team(mut self, team: TeamNumber) -> Self {
        self.team = Some(team);
        self
    }

    /// Sets the player this diagnostic concerns.
    #[must_use]
    pub fn with_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    /// Adds a context key-value pair.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Serializes this diagnostic to a JSON string.
    ///
    /// Returns `None` if serialization fails (which should not happen for
    /// well-formed diagnostics).
    #[cfg(feature = "json")]
    #[must_use]
    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }

    /// Like [`to_json`](Self::to_json), but with indentation for readability.
    #[cfg(feature = "json")]
    #[must_use]
    pub fn to_json_pretty(&self) -> Option<String> {
        serde_json::to_string_pretty(self).ok()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}/{}] {} (at {}",
            self.severity, self.kind, self.message, self.location
        )?;
        if let Some(team) = self.team {
            write!(f, ", team={team}")?;
        }
        if let Some(player) = self.player {
            write!(f, ", player={player}")?;
        }
        if !self.context.is_empty() {
            write!(f, ", context={:?}", self.context)?;
        }
        write!(f, ")")
    }
}

/// Trait for observing diagnostics.
///
/// Observers are shared between the control loop, game logic and inbound radio
/// threads, so they must be `Send + Sync`. `on_diagnostic` is called after every
/// attribute lock has been released, but it still runs on the thread that raised the
/// diagnostic and should be quick.
pub trait DiagnosticObserver: Send + Sync {
    /// Called when a diagnostic is raised.
    fn on_diagnostic(&self, diagnostic: &Diagnostic);
}

/// Built-in observer that logs diagnostics via the `tracing` crate.
///
/// - `Warning` severity → `tracing::warn!`
/// - `Error` severity → `tracing::error!`
///
/// All fields are emitted as structured tracing fields (`severity`, `kind`, `location`,
/// `team`, `player`, `context`), compatible with `tracing-subscriber`'s JSON layer.
#[derive(Debug, Default, Clone)]
pub struct TracingObserver;

impl TracingObserver {
    /// Creates a new tracing observer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn format_optional<T: std::fmt::Display>(value: Option<T>) -> String {
        value.map_or_else(|| "null".to_owned(), |v| v.to_string())
    }
}

impl DiagnosticObserver for TracingObserver {
    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        let severity = diagnostic.severity.as_str();
        let kind = diagnostic.kind.as_str();
        let location = diagnostic.location;
        let team = Self::format_optional(diagnostic.team);
        let player = Self::format_optional(diagnostic.player);

        let context = if diagnostic.context.is_empty() {
            "{}".to_owned()
        } else {
            let pairs: Vec<String> = diagnostic
                .context
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            format!("{{{}}}", pairs.join(", "))
        };

        match diagnostic.severity {
            DiagnosticSeverity::Warning => {
                tracing::warn!(
                    severity,
                    kind,
                    location,
                    team = %team,
                    player = %player,
                    context = %context,
                    "{}",
                    diagnostic.message
                );
            },
            DiagnosticSeverity::Error => {
                tracing::error!(
                    severity,
                    kind,
                    location,
                    team = %team,
                    player = %player,
                    context = %context,
                    "{}",
                    diagnostic.message
                );
            },
        }
    }
}

/// Built-in observer that collects diagnostics for testing.
///
/// # Example
///
/// ```
/// use fieldstate::telemetry::{
///     CollectingObserver, Diagnostic, DiagnosticKind, DiagnosticObserver, DiagnosticSeverity,
/// };
///
/// let observer = CollectingObserver::new();
/// observer.on_diagnostic(&Diagnostic::new(
///     DiagnosticSeverity::Error,
///     DiagnosticKind::RemoteCall,
///     "send failed",
///     "sensor.rs:1",
/// ));
///
/// assert_eq!(observer.len(), 1);
/// assert!(observer.has_diagnostic(DiagnosticKind::RemoteCall));
/// ```
#[derive(Debug, Default)]
pub struct CollectingObserver {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingObserver {
    /// Creates a new collecting observer with an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of all collected diagnostics.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Returns the number of collected diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.lock().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.lock().is_empty()
    }

    /// Checks if any diagnostic of the specified kind has been collected.
    #[must_use]
    pub fn has_diagnostic(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.lock().iter().any(|d| d.kind == kind)
    }

    /// Returns all diagnostics matching the specified kind.
    #[must_use]
    pub fn diagnostics_of_kind(&self, kind: DiagnosticKind) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .iter()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect()
    }

    /// Clears all collected diagnostics.
    pub fn clear(&self) {
        self.diagnostics.lock().clear();
    }
}

impl DiagnosticObserver for CollectingObserver {
    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        self.diagnostics.lock().push(diagnostic.clone());
    }
}

/// A composite observer that forwards diagnostics to multiple observers.
///
/// Useful when you want to both log diagnostics and collect them for testing,
/// or when you have multiple monitoring systems.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn DiagnosticObserver>>,
}

impl CompositeObserver {
    /// Creates a new composite observer with no child observers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Adds an observer to the composite.
    pub fn add(&mut self, observer: Arc<dyn DiagnosticObserver>) {
        self.observers.push(observer);
    }
}

impl DiagnosticObserver for CompositeObserver {
    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        for observer in &self.observers {
            observer.on_diagnostic(diagnostic);
        }
    }
}

impl std::fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("num_observers", &self.observers.len())
            .finish()
    }
}

/// Shared handle type stored by components that accept an observer.
pub type SharedObserver = Arc<dyn DiagnosticObserver>;

/// Reports a diagnostic to an optional observer, falling back to [`TracingObserver`] if `None`.
pub fn report_to_observer(observer: Option<&SharedObserver>, diagnostic: &Diagnostic) {
    match observer {
        Some(obs) => obs.on_diagnostic(diagnostic),
        None => TracingObserver.on_diagnostic(diagnostic),
    }
}

/// Builds a [`Diagnostic`] stamped with the current file and line.
///
/// ```
/// use fieldstate::diagnostic;
/// use fieldstate::telemetry::{DiagnosticKind, DiagnosticSeverity};
///
/// let d = diagnostic!(DiagnosticSeverity::Warning, DiagnosticKind::Codec, "bad magic {:#06x}", 0xbeef_u16);
/// assert_eq!(d.message, "bad magic 0xbeef");
/// ```
#[macro_export]
macro_rules! diagnostic {
    ($severity:expr, $kind:expr, $msg:literal) => {
        $crate::telemetry::Diagnostic::new(
            $severity,
            $kind,
            $msg,
            concat!(file!(), ":", line!()),
        )
    };

    ($severity:expr, $kind:expr, $fmt:literal, $($arg:tt)+) => {
        $crate::telemetry::Diagnostic::new(
            $severity,
            $kind,
            format!($fmt, $($arg)+),
            concat!(file!(), ":", line!()),
        )
    };
}

/// Reports a diagnostic through the default [`TracingObserver`].
///
/// # Syntax
///
/// ```text
/// report_diagnostic!(severity, kind, "message");
/// report_diagnostic!(severity, kind, "message with {}", format_args);
/// ```
#[macro_export]
macro_rules! report_diagnostic {
    ($severity:expr, $kind:expr, $($msg:tt)+) => {{
        use $crate::telemetry::DiagnosticObserver as _;
        let diagnostic = $crate::diagnostic!($severity, $kind, $($msg)+);
        $crate::telemetry::TracingObserver.on_diagnostic(&diagnostic);
    }};
}

/// Reports a diagnostic through an `Option<SharedObserver>`, falling back to
/// [`TracingObserver`] when it is `None`.
///
/// ```
/// use fieldstate::report_diagnostic_to;
/// use fieldstate::telemetry::{CollectingObserver, DiagnosticKind, DiagnosticSeverity, SharedObserver};
/// use std::sync::Arc;
///
/// let collector = Arc::new(CollectingObserver::new());
/// let observer: Option<SharedObserver> = Some(collector.clone());
/// report_diagnostic_to!(&observer, DiagnosticSeverity::Warning, DiagnosticKind::NotConnected,
///     "dropped {}", "set_player_kick_status");
/// assert_eq!(collector.len(), 1);
/// ```
#[macro_export]
macro_rules! report_diagnostic_to {
    ($observer:expr, $severity:expr, $kind:expr, $($msg:tt)+) => {{
        let diagnostic = $crate::diagnostic!($severity, $kind, $($msg)+);
        $crate::telemetry::report_to_observer($observer.as_ref(), &diagnostic);
    }};
}

/// Asserts that no diagnostics have been collected.
///
/// # Panics
///
/// Panics if the observer contains any diagnostics, printing them for debugging.
#[macro_export]
macro_rules! assert_no_diagnostics {
    ($observer:expr) => {{
        let diagnostics = $observer.diagnostics();
        assert!(
            diagnostics.is_empty(),
            "Expected no diagnostics, but found {}:\n{:#?}",
            diagnostics.len(),
            diagnostics
        );
    }};
}

/// Asserts that a diagnostic of the specified kind was collected.
///
/// # Panics
///
/// Panics if no diagnostic of the specified kind was found.
#[macro_export]
macro_rules! assert_diagnostic {
    ($observer:expr, $kind:expr) => {{
        assert!(
            $observer.has_diagnostic($kind),
            "Expected diagnostic of kind {:?}, but found: {:#?}",
            $kind,
            $observer.diagnostics()
        );
    }};
}
