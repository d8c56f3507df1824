//! Single-slot, clock-driven debouncing.
//!
//! The debouncer holds at most one pending value. Scheduling a new value
//! replaces the pending one and restarts the delay. The owner drives it from
//! its event loop by calling [`Debouncer::take_due`]; nothing fires on its
//! own, so dropping the debouncer discards whatever is pending.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replaces any pending value with `value`, due `delay` after `now`.
    ///
    /// Returns true if a previously pending value was cancelled.
    pub fn schedule(&mut self, value: T, now: Instant) -> bool {
        self.pending.replace((now + self.delay, value)).is_some()
    }

    /// Takes the pending value if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    /// Discards the pending value. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }
}
