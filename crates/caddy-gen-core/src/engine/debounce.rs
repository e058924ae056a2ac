//! Single-slot debounce state machine
//!
//! Every trigger pushes the deadline to `now + window`. The owner polls
//! [`Debouncer::deadline`] to know when to wake up and calls
//! [`Debouncer::fire`] once it has; a burst of triggers therefore yields a
//! single firing. The state holds at most one pending run.

use std::time::Duration;
use tokio::time::Instant;

/// Debouncer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// Nothing scheduled
    Idle,
    /// A run is due at `deadline` unless re-triggered first
    Pending { deadline: Instant },
}

/// Collapses bursts of triggers into one run
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    state: DebounceState,
}

impl Debouncer {
    /// Create an idle debouncer with the given quiet window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: DebounceState::Idle,
        }
    }

    /// Quiet window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Current state
    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// (Re)arm: the run becomes due `window` after `now`
    pub fn trigger(&mut self, now: Instant) {
        self.state = DebounceState::Pending {
            deadline: now + self.window,
        };
    }

    /// When the pending run is due, if any
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Idle => None,
            DebounceState::Pending { deadline } => Some(deadline),
        }
    }

    /// Whether a run is pending
    pub fn is_pending(&self) -> bool {
        matches!(self.state, DebounceState::Pending { .. })
    }

    /// Consume the pending run if it is due
    ///
    /// Returns `true` exactly once per quiet window and goes back to idle.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.state {
            DebounceState::Pending { deadline } if now >= deadline => {
                self.state = DebounceState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending run
    pub fn cancel(&mut self) {
        self.state = DebounceState::Idle;
    }
}
