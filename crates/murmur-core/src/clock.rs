//! Lamport logical clock.
//!
//! One clock per participant, shared by the send and receive loops. Every
//! operation is a single read-modify-write under a mutex, so concurrent
//! `increment` and `update` calls never lose a tick.

use std::sync::{Mutex, PoisonError};

/// Monotonic Lamport counter.
///
/// Starts at 0. Each local send calls [`LogicalClock::increment`]; each
/// accepted inbound message calls [`LogicalClock::update`] with the sender's
/// timestamp. Both return the new value, which is always strictly greater
/// than the previous one (until saturation at `u64::MAX`).
#[derive(Debug, Default)]
pub struct LogicalClock {
    value: Mutex<u64>,
}

impl LogicalClock {
    /// Create a clock at 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance for a local event and return the new value.
    pub fn increment(&self) -> u64 {
        let mut value = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        *value = value.saturating_add(1);
        *value
    }

    /// Merge a received timestamp: the new value is `max(current, received) +
    /// 1`.
    pub fn update(&self, received: u64) -> u64 {
        let mut value = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        *value = (*value).max(received).saturating_add(1);
        *value
    }

    /// Current value without advancing
    pub fn current(&self) -> u64 {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
