//! Category-scoped cooldowns.
//!
//! Each [`CooldownCategory`] remembers the last move started in it. Another
//! move of the same category may start once that move's cooldown has elapsed,
//! measured from its start tick.

use std::collections::BTreeMap;

use tempest_common::{CooldownCategory, MoveId, Tick};

#[derive(Debug, Clone, PartialEq, Eq)]
struct CooldownEntry {
    move_id: MoveId,
    started_at: Tick,
    cooldown: u32,
}

impl CooldownEntry {
    fn ready_at(&self) -> Tick {
        self.started_at.saturating_add(u64::from(self.cooldown))
    }
}

/// Last start per cooldown category.
#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    entries: BTreeMap<CooldownCategory, CooldownEntry>,
}

impl CooldownTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks until `category` is ready (0 when ready).
    #[must_use]
    pub fn remaining(&self, category: CooldownCategory, now: Tick) -> Tick {
        self.entries
            .get(&category)
            .map_or(0, |entry| entry.ready_at().saturating_sub(now))
    }

    /// Check if `category` is ready.
    #[must_use]
    pub fn is_ready(&self, category: CooldownCategory, now: Tick) -> bool {
        self.remaining(category, now) == 0
    }

    /// Record that `move_id` started in `category`, cooling down for `cooldown` ticks.
    pub fn record_start(&mut self, category: CooldownCategory, move_id: MoveId, cooldown: u32, now: Tick) {
        self.entries.insert(
            category,
            CooldownEntry {
                move_id,
                started_at: now,
                cooldown,
            },
        );
    }

    /// Move last started in `category`.
    #[must_use]
    pub fn last_move(&self, category: CooldownCategory) -> Option<&MoveId> {
        self.entries.get(&category).map(|e| &e.move_id)
    }

    /// Tick `category` was last started on.
    #[must_use]
    pub fn last_start(&self, category: CooldownCategory) -> Option<Tick> {
        self.entries.get(&category).map(|e| e.started_at)
    }

    /// Forget every cooldown.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_from_start_tick() {
        let mut cooldowns = CooldownTracker::new();
        cooldowns.record_start(CooldownCategory::TECHNIQUE, MoveId::new("a"), 10, 5);

        assert_eq!(cooldowns.remaining(CooldownCategory::TECHNIQUE, 5), 10);
        assert_eq!(cooldowns.remaining(CooldownCategory::TECHNIQUE, 14), 1);
        assert!(cooldowns.is_ready(CooldownCategory::TECHNIQUE, 15));
        assert_eq!(cooldowns.last_start(CooldownCategory::TECHNIQUE), Some(5));
    }

    #[test]
    fn test_categories_are_independent() {
        let mut cooldowns = CooldownTracker::new();
        cooldowns.record_start(CooldownCategory::TECHNIQUE, MoveId::new("a"), 10, 0);

        assert!(!cooldowns.is_ready(CooldownCategory::TECHNIQUE, 1));
        assert!(cooldowns.is_ready(CooldownCategory::BASIC, 1));
        assert!(cooldowns.is_ready(CooldownCategory::DASH, 1));
    }

    #[test]
    fn test_latest_start_wins() {
        let mut cooldowns = CooldownTracker::new();
        cooldowns.record_start(CooldownCategory::BASIC, MoveId::new("long"), 50, 0);
        cooldowns.record_start(CooldownCategory::BASIC, MoveId::new("short"), 2, 1);

        assert_eq!(cooldowns.remaining(CooldownCategory::BASIC, 1), 2);
        assert_eq!(
            cooldowns.last_move(CooldownCategory::BASIC).map(MoveId::as_str),
            Some("short")
        );

        cooldowns.clear();
        assert!(cooldowns.is_ready(CooldownCategory::BASIC, 1));
    }
}
