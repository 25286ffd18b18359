//! Shared test utilities for integration tests.

#![allow(dead_code)]

use fieldstate::{PlayerId, RadioSensorApi, RadioServer, TeamDirectory, TeamState};
use std::sync::{Arc, Once};
use std::thread;
use std::time::Duration;

// ============================================================================
// Common Test Constants
// ============================================================================

/// Maximum number of server polls before a test gives up waiting for a datagram.
pub const MAX_POLL_ITERATIONS: usize = 500;

/// Time to sleep between poll iterations.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2);

// ============================================================================
// Setup Helpers
// ============================================================================

static TRACING: Once = Once::new();

/// Installs a test-writer subscriber once per binary so diagnostics show up in
/// `cargo test -- --nocapture` output.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Team 1 "Blue" with the given players, registered in a fresh directory.
pub fn blue_team(players: &[u8]) -> (Arc<TeamDirectory>, Arc<TeamState>) {
    let directory = Arc::new(TeamDirectory::new());
    let team = Arc::new(TeamState::new(1, "Blue"));
    for &id in players {
        team.add_player(PlayerId::new(id));
    }
    directory.insert(team.clone());
    (directory, team)
}

// ============================================================================
// Polling Helpers
// ============================================================================

/// Polls `server` until `done` holds or [`MAX_POLL_ITERATIONS`] is exhausted.
///
/// Returns whether `done` eventually held.
pub fn poll_server_until<H, F>(server: &mut RadioServer<H>, mut done: F) -> bool
where
    H: RadioSensorApi,
    F: FnMut() -> bool,
{
    for _ in 0..MAX_POLL_ITERATIONS {
        server.poll();
        if done() {
            return true;
        }
        thread::sleep(POLL_INTERVAL);
    }
    false
}
