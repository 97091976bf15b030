//! Error types for the combat core.

use tempest_common::{AgentId, CooldownCategory, MoveId, Tick};
use thiserror::Error;

use crate::instance::AttackPhase;
use crate::resource::ResourceKind;

/// An attack definition failed validation.
///
/// Fatal to that definition only; the rest of a catalog stays usable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A numeric field was negative, NaN or infinite.
    #[error("move {move_id}: `{field}` must be finite and non-negative, got {value}")]
    InvalidValue {
        /// Move being built
        move_id: MoveId,
        /// Offending field
        field: &'static str,
        /// Value supplied
        value: f32,
    },
    /// Hitbox extents must be strictly positive.
    #[error("move {move_id}: hitbox extents must be positive")]
    InvalidHitboxShape {
        /// Move being built
        move_id: MoveId,
    },
    /// Every move must be able to land at least one hit per target.
    #[error("move {move_id}: max_hits_per_target must be at least 1")]
    ZeroMaxHits {
        /// Move being built
        move_id: MoveId,
    },
    /// Blitz moves need a positive spawn interval.
    #[error("move {move_id}: blitz spawn interval must be at least 1 tick")]
    ZeroSpawnInterval {
        /// Move being built
        move_id: MoveId,
    },
    /// Blitz moves must spawn at least one hitbox.
    #[error("move {move_id}: blitz must spawn at least one hitbox")]
    ZeroMaxHitboxes {
        /// Move being built
        move_id: MoveId,
    },
    /// Timed hitboxes must live at least one tick.
    #[error("move {move_id}: hitbox lifetime must be at least 1 tick")]
    ZeroHitboxLifetime {
        /// Move being built
        move_id: MoveId,
    },
    /// Facing filters take an angle in (0, 180] degrees.
    #[error("move {move_id}: facing angle must be in (0, 180] degrees, got {degrees}")]
    InvalidFacingAngle {
        /// Move being built
        move_id: MoveId,
        /// Angle supplied
        degrees: f32,
    },
    /// The move costs more than the pool can ever hold.
    #[error("move {move_id}: costs {cost} {kind} but the pool holds at most {capacity}")]
    CostExceedsCapacity {
        /// Move being registered
        move_id: MoveId,
        /// Pool the move draws from
        kind: ResourceKind,
        /// Cost of the move
        cost: f32,
        /// Pool capacity
        capacity: f32,
    },
    /// A catalog already holds a move with this ID.
    #[error("duplicate move id: {0}")]
    DuplicateMove(MoveId),
}

/// Raw [`AttackInstance::start`](crate::instance::AttackInstance::start) failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstanceStartError {
    /// The instance already left `Idle`.
    #[error("attack already started (phase {phase:?})")]
    AlreadyStarted {
        /// Phase the instance is in
        phase: AttackPhase,
    },
    /// The pool could not pay the cost; nothing was consumed.
    #[error("insufficient {kind}: need {required}, have {available}")]
    InsufficientResource {
        /// Pool the move draws from
        kind: ResourceKind,
        /// Cost of the move
        required: f32,
        /// Amount in the pool
        available: f32,
    },
}

/// Why a start request was refused. All variants are recoverable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StartError {
    /// No agent with this ID is registered.
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),
    /// No move with this ID is in the catalog.
    #[error("unknown move: {0}")]
    UnknownMove(MoveId),
    /// The agent is already performing an attack.
    #[error("already attacking with {active}")]
    AlreadyActive {
        /// Move currently being performed
        active: MoveId,
    },
    /// The move's cooldown category is still cooling down.
    #[error("{category} on cooldown: {remaining} ticks remaining")]
    OnCooldown {
        /// Category that is cooling down
        category: CooldownCategory,
        /// Ticks until the category is ready
        remaining: Tick,
    },
    /// Not enough stamina or breath.
    #[error("insufficient {kind}: need {required}, have {available}")]
    InsufficientResource {
        /// Pool the move draws from
        kind: ResourceKind,
        /// Cost of the move
        required: f32,
        /// Amount in the pool
        available: f32,
    },
}

impl StartError {
    /// Whether retrying later might succeed without outside intervention.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::AlreadyActive { .. } | Self::OnCooldown { .. } | Self::InsufficientResource { .. }
        )
    }
}

/// A target vanished between the spatial query and damage application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("target unavailable: {0}")]
pub struct TargetUnavailable(pub AgentId);
