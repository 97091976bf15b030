//! Per-attack bookkeeping of which targets were struck and how often.

use ahash::AHashMap;
use tempest_common::AgentId;

/// Target -> hit count for one attack instance.
///
/// Invariant: no count exceeds `max_hits_per_target`.
#[derive(Debug, Clone, Default)]
pub struct HitRegistry {
    counts: AHashMap<AgentId, u32>,
    max_hits_per_target: u32,
    total_hits: u32,
}

impl HitRegistry {
    /// Create a registry allowing `max_hits_per_target` hits on each target.
    #[must_use]
    pub fn new(max_hits_per_target: u32) -> Self {
        Self {
            counts: AHashMap::new(),
            max_hits_per_target: max_hits_per_target.max(1),
            total_hits: 0,
        }
    }

    /// Per-target hit ceiling.
    #[must_use]
    pub fn max_hits_per_target(&self) -> u32 {
        self.max_hits_per_target
    }

    /// Check if `target` can still be hit.
    #[must_use]
    pub fn can_hit(&self, target: AgentId) -> bool {
        self.hits_on(target) < self.max_hits_per_target
    }

    /// Record a hit. Returns false (and records nothing) if the target is capped.
    pub fn record(&mut self, target: AgentId) -> bool {
        let count = self.counts.entry(target).or_insert(0);
        if *count >= self.max_hits_per_target {
            return false;
        }
        *count += 1;
        self.total_hits += 1;
        true
    }

    /// Hits landed on `target` so far.
    #[must_use]
    pub fn hits_on(&self, target: AgentId) -> u32 {
        self.counts.get(&target).copied().unwrap_or(0)
    }

    /// Hits landed on all targets.
    #[must_use]
    pub fn total_hits(&self) -> u32 {
        self.total_hits
    }

    /// Number of distinct targets struck.
    #[must_use]
    pub fn distinct_targets(&self) -> usize {
        self.counts.len()
    }

    /// Forget all hits.
    pub fn clear(&mut self) {
        self.counts.clear();
        self.total_hits = 0;
    }
}
