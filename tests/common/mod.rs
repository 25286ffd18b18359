//! Common test infrastructure shared across integration tests.
//!
//! This module provides:
//! - `stubs`: In-memory [`RadioTransport`](fieldstate::RadioTransport) implementations
//! - `test_utils`: Shared constants, polling helpers and tracing setup
//!
//! # Usage
//!
//! From any integration test file:
//! ```ignore
//! #[path = "common/mod.rs"]
//! mod common;
//! use common::stubs::{LoopbackTransport, StubTransport};
//! use common::{blue_team, poll_server_until};
//! ```

pub mod stubs;
pub mod test_utils;

// Re-export commonly used items for convenience.
// Not every integration binary uses every helper.
#[allow(unused_imports)]
pub use test_utils::{
    blue_team, init_tracing, poll_server_until, MAX_POLL_ITERATIONS, POLL_INTERVAL,
};
