//! Clock abstraction, single-shot deadlines, and fixed-interval timers.
//!
//! All simulation timing is expressed in milliseconds on an injected
//! [`Clock`], so tests can drive hours of game time without sleeping.
//!
//! ```
//! use schoolday_logic::timer::{Clock, Deadline, ManualClock};
//!
//! let clock = ManualClock::new(0);
//! let mut curfew = Deadline::idle();
//! curfew.arm(clock.now_ms(), 20_000);
//!
//! clock.advance(20_001);
//! assert!(curfew.poll(clock.now_ms()));   // fires once
//! assert!(!curfew.poll(clock.now_ms()));  // and never again
//! assert!(curfew.has_fired());
//! ```

use std::cell::Cell;
use std::time::Instant;

/// Source of monotonic milliseconds.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock for tests and headless runs.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// A cancellable single-shot deadline.
///
/// States: idle → armed → fired. [`Deadline::poll`] returns `true` exactly
/// once per arming; re-arming resets the fired flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deadline {
    due_at: Option<u64>,
    fired: bool,
}

impl Deadline {
    pub const fn idle() -> Self {
        Self {
            due_at: None,
            fired: false,
        }
    }

    /// Arm to fire strictly after `now + duration_ms`.
    pub fn arm(&mut self, now: u64, duration_ms: u64) {
        self.due_at = Some(now.saturating_add(duration_ms));
        self.fired = false;
    }

    pub fn cancel(&mut self) {
        self.due_at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.due_at.is_some()
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn due_at(&self) -> Option<u64> {
        self.due_at
    }

    /// Whether the deadline has passed, without consuming it.
    pub fn is_expired(&self, now: u64) -> bool {
        matches!(self.due_at, Some(due) if now > due)
    }

    /// Fire if expired. Disarms on firing, so repeated polls are no-ops.
    pub fn poll(&mut self, now: u64) -> bool {
        if self.is_expired(now) {
            self.due_at = None;
            self.fired = true;
            true
        } else {
            false
        }
    }
}

/// Periodic check decoupled from the frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    period_ms: u64,
    next_due: u64,
}

impl IntervalTimer {
    pub fn new(now: u64, period_ms: u64) -> Self {
        let period_ms = period_ms.max(1);
        Self {
            period_ms,
            next_due: now.saturating_add(period_ms),
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Returns `true` at most once per call when a period boundary has
    /// passed; missed periods collapse into a single run.
    pub fn ready(&mut self, now: u64) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now.saturating_add(self.period_ms);
        true
    }

    /// Restart the period from `now`.
    pub fn reset(&mut self, now: u64) {
        self.next_due = now.saturating_add(self.period_ms);
    }
}
