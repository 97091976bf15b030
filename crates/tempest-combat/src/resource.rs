//! Depletable resource pools (stamina, breath).
//!
//! This module provides:
//! - All-or-nothing consumption
//! - Regeneration that resumes after a delay since the last use
//! - Smoothed regen near the cap so the pool settles without overshoot

use serde::{Deserialize, Serialize};
use std::fmt;

/// Regen never slows below this fraction of the base rate.
const MIN_SMOOTHING_FACTOR: f32 = 0.1;

/// Deficits below this snap the pool to full.
const SNAP_EPSILON: f32 = 1e-4;

/// Which pool a move draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Physical stamina, spent by weapon swings.
    #[default]
    Stamina,
    /// Breath, spent by breathing-style forms.
    Breath,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stamina => f.write_str("stamina"),
            Self::Breath => f.write_str("breath"),
        }
    }
}

/// Tunables for a resource pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum amount.
    pub max: f32,
    /// Amount regenerated per tick.
    pub regen_rate: f32,
    /// Ticks after the last consumption before regen resumes.
    pub regen_delay: u32,
    /// Deficit below which regen slows down.
    pub smoothing_threshold: f32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::stamina()
    }
}

impl PoolConfig {
    /// Default stamina tuning: fast regen, short delay.
    #[must_use]
    pub const fn stamina() -> Self {
        Self {
            max: 100.0,
            regen_rate: 1.0,
            regen_delay: 20,
            smoothing_threshold: 5.0,
        }
    }

    /// Default breath tuning: slow regen, long delay.
    #[must_use]
    pub const fn breath() -> Self {
        Self {
            max: 100.0,
            regen_rate: 0.5,
            regen_delay: 40,
            smoothing_threshold: 5.0,
        }
    }

    /// Clamp values to sensible ranges.
    pub fn validate(&mut self) {
        if !self.max.is_finite() || self.max < 0.0 {
            self.max = 0.0;
        }
        if !self.regen_rate.is_finite() || self.regen_rate < 0.0 {
            self.regen_rate = 0.0;
        }
        if !self.smoothing_threshold.is_finite() || self.smoothing_threshold < 0.0 {
            self.smoothing_threshold = 0.0;
        }
    }
}

/// A depletable stat gating actions.
///
/// Invariant: `0 <= current <= max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
    kind: ResourceKind,
    current: f32,
    max: f32,
    regen_rate: f32,
    regen_delay: u32,
    ticks_since_use: u32,
    smoothing_threshold: f32,
}

impl ResourcePool {
    /// Create a full pool.
    #[must_use]
    pub fn new(kind: ResourceKind, config: PoolConfig) -> Self {
        let mut config = config;
        config.validate();
        Self {
            kind,
            current: config.max,
            max: config.max,
            regen_rate: config.regen_rate,
            regen_delay: config.regen_delay,
            // a fresh pool is not waiting on a previous consumption
            ticks_since_use: config.regen_delay,
            smoothing_threshold: config.smoothing_threshold,
        }
    }

    /// Set the current amount (clamped to `[0, max]`).
    #[must_use]
    pub fn with_current(mut self, current: f32) -> Self {
        self.set_current(current);
        self
    }

    /// Which pool this is.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Current amount.
    #[must_use]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Maximum amount.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Ticks since the last successful consumption.
    #[must_use]
    pub fn ticks_since_use(&self) -> u32 {
        self.ticks_since_use
    }

    /// Fill level (0.0-1.0), for HUD bars.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    /// Check if the pool is full.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Check if `amount` could be consumed right now.
    #[must_use]
    pub fn can_afford(&self, amount: f32) -> bool {
        amount.is_finite() && amount >= 0.0 && self.current >= amount
    }

    /// Consume `amount` (returns true if successful).
    ///
    /// Either the whole amount is taken or nothing changes.
    pub fn consume(&mut self, amount: f32) -> bool {
        if !self.can_afford(amount) {
            return false;
        }
        self.current -= amount;
        self.ticks_since_use = 0;
        true
    }

    /// Advance one tick of regeneration.
    pub fn tick(&mut self) {
        self.ticks_since_use = self.ticks_since_use.saturating_add(1);
        if self.ticks_since_use < self.regen_delay || self.current >= self.max {
            return;
        }

        let deficit = self.max - self.current;
        let mut step = self.regen_rate;
        if self.smoothing_threshold > 0.0 && deficit < self.smoothing_threshold {
            step *= (deficit / self.smoothing_threshold).max(MIN_SMOOTHING_FACTOR);
        }
        self.current = (self.current + step).min(self.max);
        if self.max - self.current <= SNAP_EPSILON {
            self.current = self.max;
        }
    }

    /// Add `amount` immediately, ignoring the regen delay.
    pub fn restore(&mut self, amount: f32) {
        if amount.is_finite() && amount > 0.0 {
            self.current = (self.current + amount).min(self.max);
        }
    }

    /// Refill completely (respawn and similar events).
    pub fn restore_full(&mut self) {
        self.current = self.max;
        self.ticks_since_use = self.regen_delay;
    }

    /// Set the current amount (clamped to `[0, max]`).
    pub fn set_current(&mut self, current: f32) {
        self.current = if current.is_finite() {
            current.clamp(0.0, self.max)
        } else {
            0.0
        };
    }
}
