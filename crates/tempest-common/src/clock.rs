//! Discrete simulation time.

use serde::{Deserialize, Serialize};

/// A simulation tick index.
pub type Tick = u64;

/// Integer tick counter advanced once per simulation step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    now: Tick,
}

impl SimClock {
    /// Creates a clock at tick 0.
    #[must_use]
    pub const fn new() -> Self {
        Self { now: 0 }
    }

    /// Creates a clock at a given tick (replays, tests).
    #[must_use]
    pub const fn starting_at(now: Tick) -> Self {
        Self { now }
    }

    /// Returns the current tick.
    #[must_use]
    pub const fn now(&self) -> Tick {
        self.now
    }

    /// Advances one tick and returns the new tick.
    pub fn advance(&mut self) -> Tick {
        self.now += 1;
        self.now
    }

    /// Ticks elapsed since `earlier` (0 if `earlier` is in the future).
    #[must_use]
    pub const fn elapsed_since(&self, earlier: Tick) -> Tick {
        self.now.saturating_sub(earlier)
    }
}
