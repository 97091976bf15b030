//! Fire-and-forget presentation cues (VFX, sound, animation).
//!
//! The core never waits on presentation. Cues are handed to an
//! [`EffectPresentation`] sink; the bundled [`EffectBus`] queues them on a
//! bounded channel and drops cues when nobody drains it.

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tempest_common::{AgentId, MoveId, Tick};

/// A presentation cue emitted by the attack lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectCue {
    /// An attack entered `Startup`.
    AttackStarted {
        /// Attacking agent
        agent: AgentId,
        /// Move started
        move_id: MoveId,
        /// Position of the combo chain (0 for a fresh attack)
        combo_depth: u32,
        /// Tick of the start
        tick: Tick,
    },
    /// A hitbox appeared.
    HitboxSpawned {
        /// Owning agent
        agent: AgentId,
        /// Move that spawned it
        move_id: MoveId,
        /// Spawn index within the attack
        index: u32,
        /// Hitbox center
        position: Vec3,
        /// Tick of the spawn
        tick: Tick,
    },
    /// A hit was applied.
    HitConfirmed {
        /// Attacking agent
        attacker: AgentId,
        /// Struck agent
        target: AgentId,
        /// Move that landed
        move_id: MoveId,
        /// Impact position
        position: Vec3,
        /// Tick of the hit
        tick: Tick,
    },
    /// An attack finished its recovery.
    AttackEnded {
        /// Attacking agent
        agent: AgentId,
        /// Move that ended
        move_id: MoveId,
        /// Tick of the end
        tick: Tick,
    },
    /// An attack was cancelled.
    AttackCancelled {
        /// Attacking agent
        agent: AgentId,
        /// Move that was cancelled
        move_id: MoveId,
        /// Tick of the cancellation
        tick: Tick,
    },
}

impl EffectCue {
    /// Agent that caused the cue.
    #[must_use]
    pub fn agent(&self) -> AgentId {
        match self {
            Self::AttackStarted { agent, .. }
            | Self::HitboxSpawned { agent, .. }
            | Self::AttackEnded { agent, .. }
            | Self::AttackCancelled { agent, .. } => *agent,
            Self::HitConfirmed { attacker, .. } => *attacker,
        }
    }

    /// Tick the cue was emitted on.
    #[must_use]
    pub fn tick(&self) -> Tick {
        match self {
            Self::AttackStarted { tick, .. }
            | Self::HitboxSpawned { tick, .. }
            | Self::HitConfirmed { tick, .. }
            | Self::AttackEnded { tick, .. }
            | Self::AttackCancelled { tick, .. } => *tick,
        }
    }
}

/// Sink for presentation cues.
pub trait EffectPresentation {
    /// Present a cue. Must not block.
    fn present(&self, cue: EffectCue);
}

/// Discards every cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEffects;

impl EffectPresentation for NoEffects {
    fn present(&self, _cue: EffectCue) {}
}

impl EffectPresentation for Sender<EffectCue> {
    fn present(&self, cue: EffectCue) {
        let _ = self.try_send(cue);
    }
}

/// Bounded queue of cues for a presentation layer to drain.
#[derive(Debug)]
pub struct EffectBus {
    sender: Sender<EffectCue>,
    receiver: Receiver<EffectCue>,
    capacity: usize,
}

impl Default for EffectBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EffectBus {
    /// Create a bus holding at most `capacity` undrained cues.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Drain all pending cues.
    pub fn drain(&self) -> Vec<EffectCue> {
        self.receiver.try_iter().collect()
    }

    /// Number of pending cues.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// A sender handle that can be installed as a sink elsewhere.
    #[must_use]
    pub fn sender(&self) -> Sender<EffectCue> {
        self.sender.clone()
    }
}

impl EffectPresentation for EffectBus {
    fn present(&self, cue: EffectCue) {
        // full bus drops the cue
        let _ = self.sender.try_send(cue);
    }
}
