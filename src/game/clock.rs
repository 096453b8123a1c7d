//! Fixed-period turn clock driven by the host's event loop

use std::time::{Duration, Instant};

/// Clock period.
pub const TICK: Duration = Duration::from_secs(1);

/// A cancellable periodic deadline.
///
/// The owner polls [`TurnClock::fire`]; each call that returns `true`
/// represents exactly one tick. Once stopped the clock never fires again
/// until restarted.
#[derive(Debug, Clone, Default)]
pub struct TurnClock {
    next_due: Option<Instant>,
}

impl TurnClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking, first tick one period from `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + TICK);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Consume one due tick, if any.
    ///
    /// A loop that fell behind catches up one tick per call, never firing
    /// two ticks at once.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(due + TICK);
                true
            }
            _ => false,
        }
    }

    /// Time until the next tick, for sizing poll timeouts.
    pub fn until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}
