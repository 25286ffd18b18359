//! Synchronization primitives abstraction for loom testing compatibility.
//!
//! This module provides a unified interface to synchronization primitives that works
//! with both production code (using `parking_lot` for performance) and loom tests
//! (using `loom::sync` for model checking).
//!
//! # Usage
//!
//! Import from this module instead of directly from `parking_lot` or `std::sync`,
//! and acquire guards through [`read`], [`write`] and [`lock`] so call sites do not
//! care whether the underlying lock can be poisoned:
//!
//! ```ignore
//! use crate::sync::{read, write, RwLock};
//!
//! let table = RwLock::new(0_u8);
//! *write(&table) = 7;
//! assert_eq!(*read(&table), 7);
//! ```
//!
//! # Loom Testing
//!
//! Run loom tests from the isolated `loom-tests/` crate:
//! ```bash
//! cd loom-tests
//! RUSTFLAGS="--cfg loom" cargo test --release
//! ```
//!
//! # Poisoning
//!
//! `parking_lot` locks cannot be poisoned. loom mirrors `std` and can; a poisoned lock
//! only means another modelled thread panicked, so the guard is recovered with
//! [`PoisonError::into_inner`](std::sync::PoisonError::into_inner) rather than
//! propagating a second panic.

// ============================================================================
// LOOM CONFIGURATION
// ============================================================================

/// When running under loom (`RUSTFLAGS="--cfg loom"`), use loom's types
#[cfg(loom)]
pub(crate) mod inner {
    pub use loom::sync::Arc;
    pub use loom::sync::{Mutex, MutexGuard};
    pub use loom::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
    #[allow(unused_imports)] // Used for API consistency
    pub use loom::thread;

    use std::sync::PoisonError;

    #[inline]
    pub fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
        lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
        lock.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Yield to the loom scheduler. This is important for testing spin-loops
    /// and other constructs that assume fair scheduling.
    #[inline]
    #[allow(dead_code)] // May not be used in all loom tests
    pub fn yield_now() {
        loom::thread::yield_now();
    }
}

/// In production, use parking_lot for performance
#[cfg(not(loom))]
pub(crate) mod inner {
    pub use parking_lot::{Mutex, MutexGuard};
    pub use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
    #[allow(unused_imports)] // Used for loom compatibility abstraction
    pub use std::sync::Arc;
    #[allow(unused_imports)] // Used for loom compatibility abstraction
    pub use std::thread;

    #[inline]
    pub fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
        lock.read()
    }

    #[inline]
    pub fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
        lock.write()
    }

    #[inline]
    pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock()
    }

    /// Plain thread yield in production - only meaningful under loom
    #[inline]
    #[allow(dead_code)] // Used via loom compatibility abstraction in tests
    pub fn yield_now() {
        std::thread::yield_now();
    }
}

// Re-export at module level for convenience
pub(crate) use inner::*;

// ============================================================================
// TESTS
// ============================================================================

#[cfg(all(test, loom))]
mod loom_tests {
    use super::*;

    #[test]
    fn test_rwlock_reader_sees_whole_write() {
        loom::model(|| {
            let pair = Arc::new(RwLock::new((0_u32, 0_u32)));
            let writer_pair = pair.clone();

            let writer = thread::spawn(move || {
                let mut guard = write(&writer_pair);
                guard.0 = 7;
                guard.1 = 7;
            });

            let (a, b) = *read(&pair);
            assert_eq!(a, b, "reader observed a half-applied write");

            writer.join().unwrap();
        });
    }
}
