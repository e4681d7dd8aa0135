//! Simulation time model.
//!
//! Time is a monotonically increasing `Tick` counter owned exclusively by the
//! scheduler's `SimClock`.  Ticks are 1-based in practice: the clock starts at
//! `Tick::ZERO` ("nothing has happened yet") and the first call to
//! [`SimClock::advance`] moves it to `Tick(1)`, the first processed tick.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// The tick `n` steps after `self`, or `None` past `u64::MAX`.
    #[inline]
    pub fn checked_add(self, n: u64) -> Option<Tick> {
        self.0.checked_add(n).map(Tick)
    }

    /// Ticks from `self` until `later`, or 0 if `later` is not in the future.
    #[inline]
    pub fn until(self, later: Tick) -> u64 {
        later.0.saturating_sub(self.0)
    }

    /// `true` if `self` is a multiple of `interval` (never for interval 0).
    #[inline]
    pub fn is_multiple_of(self, interval: u64) -> bool {
        interval > 0 && self.0 % interval == 0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The scheduler's tick counter plus the configured run length.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// The last tick that was (or is being) processed.  `Tick::ZERO` before
    /// the first advance.
    pub current_tick: Tick,
    /// Number of ticks in the run.  The run is finished once
    /// `current_tick == Tick(total_ticks)`.
    pub total_ticks: u64,
}

impl SimClock {
    pub fn new(total_ticks: u64) -> Self {
        Self {
            current_tick: Tick::ZERO,
            total_ticks,
        }
    }

    /// Advance the clock by one tick and return the new current tick.
    #[inline]
    pub fn advance(&mut self) -> Tick {
        self.current_tick = Tick(self.current_tick.0 + 1);
        self.current_tick
    }

    /// `true` once every configured tick has been processed.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.current_tick.0 >= self.total_ticks
    }

    /// Ticks still to be processed.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.total_ticks.saturating_sub(self.current_tick.0)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.current_tick, self.total_ticks)
    }
}
