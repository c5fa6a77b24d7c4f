//! Countdown timers.
use std::time::Instant;

use crate::constants::*;

/// Countdown timer decaying at [`DELAY_FREQUENCY`].
///
/// There is no background thread counting down. The timer remembers the
/// value and the instant it was armed, and works out the remaining value
/// whenever it is read. The interpreter may be paused between steps for
/// any amount of time without the timer drifting.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    value: u8,
    armed_at: Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self {
            value: 0,
            armed_at: Instant::now(),
        }
    }
}

impl Timer {
    pub fn new() -> Self {
        Default::default()
    }

    /// Start counting down from the given value.
    pub fn arm(&mut self, value: u8) {
        self.arm_at(value, Instant::now())
    }

    pub fn arm_at(&mut self, value: u8, now: Instant) {
        self.value = value;
        self.armed_at = now;
    }

    /// Current value of the timer.
    pub fn read(&self) -> u8 {
        self.read_at(Instant::now())
    }

    /// Value of the timer at the given instant.
    ///
    /// Instants before arming read as the armed value.
    pub fn read_at(&self, now: Instant) -> u8 {
        let elapsed = now.saturating_duration_since(self.armed_at).as_nanos();
        let ticks = elapsed / CLOCK_CYCLE_TIME as u128;
        if ticks >= self.value as u128 {
            0
        } else {
            self.value - ticks as u8
        }
    }

    /// Whether the timer is still counting down.
    pub fn is_active(&self) -> bool {
        self.read() > 0
    }
}
