//! Door state machine with timed auto-close.
//!
//! The machine tracks the physical door position, the close deadline, the
//! operation counters and a bounded transition history. It is purely
//! synchronous: callers supply the current [`Instant`] to every
//! time-dependent operation, which keeps the close schedule deterministic
//! and directly testable.
//!
//! # States
//!
//! - **Closed**: lock engaged, the resting state
//! - **Open**: lock released, counting down to automatic re-lock
//!
//! # Transitions
//!
//! | From   | To     | Trigger                                   |
//! |--------|--------|-------------------------------------------|
//! | Closed | Open   | unlock command (entry, exit or manual)    |
//! | Open   | Open   | unlock command, restarts the close timer  |
//! | Open   | Closed | lock command, or the close deadline passes|
//! | Closed | Closed | lock command (recorded, no position change)|
//!
//! An unlock while already open is deliberately not an error: two people
//! badging in quick succession should each get the full open window.
//!
//! # Examples
//!
//! ```
//! use std::time::{Duration, Instant};
//!
//! use doorlink_actuator::DoorMachine;
//! use doorlink_core::DoorReason;
//!
//! let mut machine = DoorMachine::new(Duration::from_millis(5000));
//! let t0 = Instant::now();
//!
//! machine.unlock(DoorReason::Entry, t0);
//! assert!(machine.is_open());
//!
//! // One millisecond before the deadline the door stays open.
//! assert!(machine.tick(t0 + Duration::from_millis(4999)).is_none());
//!
//! // At the deadline it closes on its own.
//! assert!(machine.tick(t0 + Duration::from_millis(5000)).is_some());
//! assert!(machine.is_closed());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use doorlink_core::constants::{MAX_TRANSITION_HISTORY, OPEN_DURATION_MS};
use doorlink_core::{DeviceIdentity, DeviceKind, DoorOperation, DoorReason, DoorStatistics};
use doorlink_protocol::DoorReport;
use serde::{Deserialize, Serialize};

/// Physical door position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    /// Lock engaged.
    Closed,
    /// Lock released, waiting for the close deadline.
    Open,
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DoorState::Closed => write!(f, "closed"),
            DoorState::Open => write!(f, "open"),
        }
    }
}

/// A recorded door transition.
///
/// `at` is wall-clock time for audit purposes only; the close schedule
/// runs on monotonic instants held by the machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorTransition {
    pub from: DoorState,
    pub to: DoorState,
    pub operation: DoorOperation,
    pub at: DateTime<Utc>,
}

/// Door state machine.
///
/// Owns the current position, the close deadline, the operation counters
/// and the bounded transition history. Commands mutate the machine and
/// return the transition they produced; [`DoorMachine::tick`] drives the
/// automatic re-lock.
#[derive(Debug, Clone)]
pub struct DoorMachine {
    state: DoorState,
    opened_at: Option<Instant>,
    open_duration: Duration,
    last_operation: Option<DoorOperation>,
    stats: DoorStatistics,
    history: VecDeque<DoorTransition>,
}

impl DoorMachine {
    /// Create a closed machine that re-locks `open_duration` after the
    /// most recent unlock.
    #[must_use]
    pub fn new(open_duration: Duration) -> Self {
        Self {
            state: DoorState::Closed,
            opened_at: None,
            open_duration,
            last_operation: None,
            stats: DoorStatistics::default(),
            history: VecDeque::with_capacity(MAX_TRANSITION_HISTORY),
        }
    }

    /// Current door position.
    #[must_use]
    pub fn state(&self) -> DoorState {
        self.state
    }

    /// Returns `true` while the lock is released.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == DoorState::Open
    }

    /// Returns `true` while the lock is engaged.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == DoorState::Closed
    }

    /// Most recent operation, `None` on a fresh machine.
    #[must_use]
    pub fn last_operation(&self) -> Option<DoorOperation> {
        self.last_operation
    }

    /// Snapshot of the operation counters.
    #[must_use]
    pub fn statistics(&self) -> DoorStatistics {
        self.stats
    }

    /// Recorded transitions, oldest first, capped at
    /// [`MAX_TRANSITION_HISTORY`] entries.
    #[must_use]
    pub fn history(&self) -> &VecDeque<DoorTransition> {
        &self.history
    }

    /// Configured open window.
    #[must_use]
    pub fn open_duration(&self) -> Duration {
        self.open_duration
    }

    /// Apply an unlock command.
    ///
    /// Opens the door and (re)starts the close timer from `now`. Issued
    /// while already open, the door stays open and the full window starts
    /// over; the latest reason becomes `last_operation`. Every accepted
    /// unlock increments the counter for its reason.
    pub fn unlock(&mut self, reason: DoorReason, now: Instant) -> DoorTransition {
        self.stats.record_unlock(reason);
        self.opened_at = Some(now);
        self.transition_to(DoorState::Open, DoorOperation::from_unlock(reason))
    }

    /// Apply an explicit lock command.
    ///
    /// Closes the door immediately and cancels any pending auto-close.
    /// The command is recorded even when the door is already closed, so a
    /// guard forcing the state produces an audit entry either way.
    pub fn lock(&mut self) -> DoorTransition {
        self.stats.record_manual_lock();
        self.opened_at = None;
        self.transition_to(DoorState::Closed, DoorOperation::Lock)
    }

    /// Evaluate the close deadline.
    ///
    /// Returns the auto-close transition when the door is open and at
    /// least `open_duration` has elapsed since the most recent unlock,
    /// `None` otherwise. Auto-close changes no counters.
    pub fn tick(&mut self, now: Instant) -> Option<DoorTransition> {
        let opened_at = self.opened_at?;
        if now.duration_since(opened_at) < self.open_duration {
            return None;
        }
        self.opened_at = None;
        Some(self.transition_to(DoorState::Closed, DoorOperation::AutoClose))
    }

    /// Time remaining until automatic re-lock.
    ///
    /// `None` while closed. Reports zero (rather than `None`) in the
    /// window where the deadline has passed but `tick` has not run yet.
    #[must_use]
    pub fn time_until_close(&self, now: Instant) -> Option<Duration> {
        let opened_at = self.opened_at?;
        Some(self.open_duration.saturating_sub(now.duration_since(opened_at)))
    }

    /// Build the status body reported on the wire.
    #[must_use]
    pub fn report(&self, identity: &DeviceIdentity, now: Instant) -> DoorReport {
        DoorReport {
            device_type: DeviceKind::DoorController,
            mac_address: identity.clone(),
            door_open: self.is_open(),
            door_closed: self.is_closed(),
            last_operation: self.last_operation,
            time_until_close_ms: self
                .time_until_close(now)
                .map(|remaining| remaining.as_millis() as u64),
            statistics: self.stats,
        }
    }

    fn transition_to(&mut self, to: DoorState, operation: DoorOperation) -> DoorTransition {
        let transition = DoorTransition {
            from: self.state,
            to,
            operation,
            at: Utc::now(),
        };

        self.state = to;
        self.last_operation = Some(operation);

        if self.history.len() == MAX_TRANSITION_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(transition.clone());

        transition
    }
}

impl Default for DoorMachine {
    /// A closed machine with the standard open window.
    fn default() -> Self {
        Self::new(Duration::from_millis(OPEN_DURATION_MS))
    }
}
