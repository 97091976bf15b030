//! Follow-up chaining between consecutive attacks.
//!
//! When a move with a follow-up completes, the follow-up is offered for the
//! move's follow-up window. The next start request inside the window is
//! replaced by the follow-up and deepens the combo; anything later breaks it.

use std::sync::Arc;

use tempest_common::Tick;
use tracing::trace;

use crate::definition::AttackDefinition;

/// Outcome of resolving a start request against the combo state.
#[derive(Debug, Clone)]
pub struct ComboResolution {
    /// Definition that will actually start.
    pub definition: Arc<AttackDefinition>,
    /// Whether the requested move was replaced by a pending follow-up.
    pub substituted: bool,
    /// Combo depth once this start is committed.
    pub combo_depth: u32,
}

#[derive(Debug, Clone)]
struct PendingFollowUp {
    definition: Arc<AttackDefinition>,
    completed_at: Tick,
    window: u32,
}

impl PendingFollowUp {
    fn is_open(&self, now: Tick) -> bool {
        now <= self.completed_at.saturating_add(u64::from(self.window))
    }
}

/// Per-agent combo state.
#[derive(Debug, Clone, Default)]
pub struct ComboController {
    pending: Option<PendingFollowUp>,
    last_completion_tick: Option<Tick>,
    combo_depth: u32,
    best_depth: u32,
}

impl ComboController {
    /// Create an empty controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `requested` without changing any state.
    #[must_use]
    pub fn preview(&self, requested: &Arc<AttackDefinition>, now: Tick) -> ComboResolution {
        match &self.pending {
            Some(pending) if pending.is_open(now) => ComboResolution {
                definition: Arc::clone(&pending.definition),
                substituted: true,
                combo_depth: self.combo_depth + 1,
            },
            _ => ComboResolution {
                definition: Arc::clone(requested),
                substituted: false,
                combo_depth: 0,
            },
        }
    }

    /// Apply a resolution once its start has succeeded.
    pub fn commit(&mut self, resolution: &ComboResolution) {
        self.pending = None;
        self.combo_depth = resolution.combo_depth;
        self.best_depth = self.best_depth.max(self.combo_depth);
    }

    /// Note that `definition` completed on `now`, opening its follow-up window.
    ///
    /// A move with no follow-up ends the chain, so the combo depth drops to 0.
    pub fn record_completion(&mut self, definition: &AttackDefinition, now: Tick) {
        self.last_completion_tick = Some(now);
        self.pending = definition.follow_up().map(|next| PendingFollowUp {
            definition: Arc::clone(next),
            completed_at: now,
            window: definition.follow_up_window(),
        });
        match &self.pending {
            Some(pending) => trace!(
                follow_up = %pending.definition.id(),
                window = pending.window,
                "Follow-up window opened"
            ),
            None if self.combo_depth > 0 => {
                trace!(depth = self.combo_depth, "Combo finished");
                self.combo_depth = 0;
            },
            None => {},
        }
    }

    /// Drop a follow-up whose window has passed and break the combo.
    pub fn expire(&mut self, now: Tick) {
        if self.pending.as_ref().is_some_and(|p| !p.is_open(now)) {
            trace!(depth = self.combo_depth, "Follow-up window closed");
            self.pending = None;
            self.combo_depth = 0;
        }
    }

    /// Forget the pending follow-up and the current depth.
    pub fn reset(&mut self) {
        self.pending = None;
        self.combo_depth = 0;
    }

    /// Current chain depth (0 for a fresh attack).
    #[must_use]
    pub fn combo_depth(&self) -> u32 {
        self.combo_depth
    }

    /// Deepest chain reached so far.
    #[must_use]
    pub fn best_depth(&self) -> u32 {
        self.best_depth
    }

    /// Tick of the last completed attack.
    #[must_use]
    pub fn last_completion_tick(&self) -> Option<Tick> {
        self.last_completion_tick
    }

    /// The follow-up currently offered, if any.
    #[must_use]
    pub fn pending_follow_up(&self) -> Option<&Arc<AttackDefinition>> {
        self.pending.as_ref().map(|p| &p.definition)
    }
}
