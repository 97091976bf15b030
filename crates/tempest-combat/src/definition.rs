//! Immutable attack configuration.
//!
//! An [`AttackDefinition`] is built once through [`AttackDefinitionBuilder`],
//! validated, wrapped in an `Arc` and shared read-only by every instance of the
//! move. Variant behavior (single strike, persistent, blitz, expanding,
//! piercing, chained) is data on the definition rather than separate types.

use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tempest_common::{CooldownCategory, MoveId};

use crate::error::ConfigError;
use crate::hitbox::{HitShape, HitboxSpec};
use crate::resource::{ResourceKind, ResourcePool};
use crate::world::{flatten, Pose, SpatialQuery};

// ============================================================================
// Timing
// ============================================================================

/// Phase durations of an attack, in ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackTiming {
    /// Windup before the strike.
    pub startup: u32,
    /// Active strike window.
    pub active: u32,
    /// Recovery after the strike.
    pub recovery: u32,
}

impl AttackTiming {
    /// Create new attack timing.
    #[must_use]
    pub const fn new(startup: u32, active: u32, recovery: u32) -> Self {
        Self {
            startup,
            active,
            recovery,
        }
    }

    /// Get total attack duration, saturating at `u32::MAX`.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.startup
            .saturating_add(self.active)
            .saturating_add(self.recovery)
    }

    /// Quick jab timing.
    #[must_use]
    pub const fn fast() -> Self {
        Self::new(2, 3, 4)
    }

    /// Regular swing timing.
    #[must_use]
    pub const fn medium() -> Self {
        Self::new(4, 5, 8)
    }

    /// Heavy strike timing.
    #[must_use]
    pub const fn heavy() -> Self {
        Self::new(10, 6, 14)
    }
}

// ============================================================================
// Variant strategies
// ============================================================================

/// How a move spawns hitboxes during its active window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrikeMode {
    /// One immediate hit-check when the active window opens.
    #[default]
    Single,
    /// One hitbox that persists through the active window.
    Persistent,
    /// A new hitbox every `spawn_interval` ticks, up to `max_hitboxes` in total.
    Blitz {
        /// Ticks between spawns.
        spawn_interval: u32,
        /// Total hitboxes the move spawns.
        max_hitboxes: u32,
    },
}

impl StrikeMode {
    /// Total hitboxes this mode will spawn.
    #[must_use]
    pub fn max_hitboxes(&self) -> u32 {
        match self {
            Self::Single | Self::Persistent => 1,
            Self::Blitz { max_hitboxes, .. } => *max_hitboxes,
        }
    }
}

/// Direction rule for knockback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KnockbackMode {
    /// Away from the hitbox center.
    #[default]
    Radial,
    /// Along the attacker's facing.
    Facing,
    /// Toward the attacker.
    Pull,
    /// A fixed world direction.
    Fixed {
        /// Direction (normalized on use).
        direction: Vec3,
    },
    /// No knockback.
    None,
}

impl KnockbackMode {
    /// Knockback vector of magnitude `force` for a target at `target`.
    #[must_use]
    pub fn vector(&self, force: f32, attacker: &Pose, origin: Vec3, target: Vec3) -> Vec3 {
        let direction = match self {
            Self::Radial => flatten(target - origin).unwrap_or(attacker.facing),
            Self::Facing => attacker.facing,
            Self::Pull => flatten(attacker.position - target).unwrap_or(-attacker.facing),
            Self::Fixed { direction } => direction.normalize_or_zero(),
            Self::None => Vec3::ZERO,
        };
        direction * force
    }
}

/// Extra acceptance test applied to each overlapping candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetFilter {
    /// Accept every overlapping candidate.
    #[default]
    Any,
    /// Only targets within `max_angle` degrees of the attacker's facing.
    Facing {
        /// Half-angle of the accepted cone, in degrees.
        max_angle: f32,
    },
    /// Only targets the attacker can see.
    LineOfSight,
    /// Both of the above.
    FacingWithSight {
        /// Half-angle of the accepted cone, in degrees.
        max_angle: f32,
    },
}

impl TargetFilter {
    /// Check whether a candidate at `target` passes the filter.
    #[must_use]
    pub fn accepts<S: SpatialQuery + ?Sized>(&self, world: &S, attacker: &Pose, target: Vec3) -> bool {
        let eye = attacker.position + Vec3::Y;
        match self {
            Self::Any => true,
            Self::Facing { max_angle } => attacker.angle_to(target) <= *max_angle,
            Self::LineOfSight => world.has_line_of_sight(eye, target),
            Self::FacingWithSight { max_angle } => {
                attacker.angle_to(target) <= *max_angle && world.has_line_of_sight(eye, target)
            },
        }
    }

    fn max_angle(&self) -> Option<f32> {
        match self {
            Self::Facing { max_angle } | Self::FacingWithSight { max_angle } => Some(*max_angle),
            Self::Any | Self::LineOfSight => None,
        }
    }
}

// ============================================================================
// Definition
// ============================================================================

/// Immutable configuration of one move.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackDefinition {
    id: MoveId,
    timing: AttackTiming,
    cooldown: u32,
    cooldown_category: CooldownCategory,
    damage: f32,
    range: f32,
    knockback: f32,
    knockback_mode: KnockbackMode,
    final_knockback: Option<KnockbackMode>,
    hit_stun: u32,
    resource: ResourceKind,
    resource_cost: f32,
    hitbox: HitboxSpec,
    strike: StrikeMode,
    max_hits_per_target: u32,
    target_filter: TargetFilter,
    follow_up: Option<Arc<AttackDefinition>>,
    follow_up_window: u32,
}

impl AttackDefinition {
    /// Start building a definition.
    #[must_use]
    pub fn builder(id: impl Into<MoveId>) -> AttackDefinitionBuilder {
        AttackDefinitionBuilder::new(id)
    }

    /// Move identifier.
    #[must_use]
    pub fn id(&self) -> &MoveId {
        &self.id
    }

    /// Phase durations.
    #[must_use]
    pub fn timing(&self) -> AttackTiming {
        self.timing
    }

    /// Cooldown after starting, in ticks.
    #[must_use]
    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Category sharing the cooldown.
    #[must_use]
    pub fn cooldown_category(&self) -> CooldownCategory {
        self.cooldown_category
    }

    /// Damage per hit.
    #[must_use]
    pub fn damage(&self) -> f32 {
        self.damage
    }

    /// Reach: default distance of hitboxes ahead of the attacker.
    #[must_use]
    pub fn range(&self) -> f32 {
        self.range
    }

    /// Knockback force.
    #[must_use]
    pub fn knockback(&self) -> f32 {
        self.knockback
    }

    /// Knockback direction rule.
    #[must_use]
    pub fn knockback_mode(&self) -> KnockbackMode {
        self.knockback_mode
    }

    /// Knockback rule of the last hitbox of a multi-hitbox move.
    #[must_use]
    pub fn final_knockback(&self) -> Option<KnockbackMode> {
        self.final_knockback
    }

    /// Hit stun in ticks.
    #[must_use]
    pub fn hit_stun(&self) -> u32 {
        self.hit_stun
    }

    /// Pool the move draws from.
    #[must_use]
    pub fn resource(&self) -> ResourceKind {
        self.resource
    }

    /// Cost paid on start.
    #[must_use]
    pub fn resource_cost(&self) -> f32 {
        self.resource_cost
    }

    /// Hitbox geometry.
    #[must_use]
    pub fn hitbox(&self) -> &HitboxSpec {
        &self.hitbox
    }

    /// Hitbox spawning mode.
    #[must_use]
    pub fn strike(&self) -> StrikeMode {
        self.strike
    }

    /// Per-target hit ceiling across the whole attack.
    #[must_use]
    pub fn max_hits_per_target(&self) -> u32 {
        self.max_hits_per_target
    }

    /// Candidate acceptance test.
    #[must_use]
    pub fn target_filter(&self) -> TargetFilter {
        self.target_filter
    }

    /// Move offered next if started within the follow-up window.
    #[must_use]
    pub fn follow_up(&self) -> Option<&Arc<AttackDefinition>> {
        self.follow_up.as_ref()
    }

    /// Ticks after completion during which the follow-up is offered.
    #[must_use]
    pub fn follow_up_window(&self) -> u32 {
        self.follow_up_window
    }

    /// Number of moves in the chain starting here (1 without a follow-up).
    #[must_use]
    pub fn chain_length(&self) -> usize {
        std::iter::successors(Some(self), |d| d.follow_up.as_deref()).count()
    }

    /// Check if `pool` could ever pay for this move.
    #[must_use]
    pub fn is_usable_with(&self, pool: &ResourcePool) -> bool {
        pool.kind() == self.resource && self.resource_cost <= pool.max()
    }

    /// Forward offset hitboxes spawn at.
    pub(crate) fn hitbox_forward_offset(&self) -> f32 {
        self.hitbox.forward_offset.unwrap_or(self.range)
    }

    /// Knockback rule for the hitbox with spawn index `index`.
    pub(crate) fn knockback_for(&self, index: u32) -> KnockbackMode {
        match self.final_knockback {
            Some(mode) if index + 1 >= self.strike.max_hitboxes() => mode,
            _ => self.knockback_mode,
        }
    }
}

/// Builder for [`AttackDefinition`].
#[derive(Debug, Clone)]
pub struct AttackDefinitionBuilder {
    def: AttackDefinition,
}

impl AttackDefinitionBuilder {
    /// Create a builder with defaults: medium timing, single strike, free.
    #[must_use]
    pub fn new(id: impl Into<MoveId>) -> Self {
        Self {
            def: AttackDefinition {
                id: id.into(),
                timing: AttackTiming::medium(),
                cooldown: 0,
                cooldown_category: CooldownCategory::BASIC,
                damage: 5.0,
                range: 1.5,
                knockback: 0.4,
                knockback_mode: KnockbackMode::Radial,
                final_knockback: None,
                hit_stun: 10,
                resource: ResourceKind::Stamina,
                resource_cost: 0.0,
                hitbox: HitboxSpec::default(),
                strike: StrikeMode::Single,
                max_hits_per_target: 1,
                target_filter: TargetFilter::Any,
                follow_up: None,
                follow_up_window: 0,
            },
        }
    }

    /// Set phase durations.
    #[must_use]
    pub fn timing(mut self, startup: u32, active: u32, recovery: u32) -> Self {
        self.def.timing = AttackTiming::new(startup, active, recovery);
        self
    }

    /// Set phase durations from a preset.
    #[must_use]
    pub fn with_timing(mut self, timing: AttackTiming) -> Self {
        self.def.timing = timing;
        self
    }

    /// Set cooldown and its category.
    #[must_use]
    pub fn cooldown(mut self, ticks: u32, category: CooldownCategory) -> Self {
        self.def.cooldown = ticks;
        self.def.cooldown_category = category;
        self
    }

    /// Set damage per hit.
    #[must_use]
    pub fn damage(mut self, damage: f32) -> Self {
        self.def.damage = damage;
        self
    }

    /// Set reach.
    #[must_use]
    pub fn range(mut self, range: f32) -> Self {
        self.def.range = range;
        self
    }

    /// Set knockback force and direction rule.
    #[must_use]
    pub fn knockback(mut self, force: f32, mode: KnockbackMode) -> Self {
        self.def.knockback = force;
        self.def.knockback_mode = mode;
        self
    }

    /// Set knockback force, keeping the direction rule.
    #[must_use]
    pub fn knockback_force(mut self, force: f32) -> Self {
        self.def.knockback = force;
        self
    }

    /// Use a different knockback rule on the last hitbox.
    #[must_use]
    pub fn final_knockback(mut self, mode: KnockbackMode) -> Self {
        self.def.final_knockback = Some(mode);
        self
    }

    /// Set hit stun.
    #[must_use]
    pub fn hit_stun(mut self, ticks: u32) -> Self {
        self.def.hit_stun = ticks;
        self
    }

    /// Set resource pool and cost.
    #[must_use]
    pub fn cost(mut self, kind: ResourceKind, amount: f32) -> Self {
        self.def.resource = kind;
        self.def.resource_cost = amount;
        self
    }

    /// Set hitbox geometry.
    #[must_use]
    pub fn hitbox(mut self, spec: HitboxSpec) -> Self {
        self.def.hitbox = spec;
        self
    }

    /// Replace only the hitbox shape.
    #[must_use]
    pub fn shape(mut self, shape: HitShape) -> Self {
        self.def.hitbox.shape = shape;
        self
    }

    /// Set strike mode.
    #[must_use]
    pub fn strike(mut self, mode: StrikeMode) -> Self {
        self.def.strike = mode;
        self
    }

    /// Shorthand for a blitz strike.
    #[must_use]
    pub fn blitz(self, spawn_interval: u32, max_hitboxes: u32) -> Self {
        self.strike(StrikeMode::Blitz {
            spawn_interval,
            max_hitboxes,
        })
    }

    /// Set per-target hit ceiling.
    #[must_use]
    pub fn max_hits_per_target(mut self, hits: u32) -> Self {
        self.def.max_hits_per_target = hits;
        self
    }

    /// Set candidate filter.
    #[must_use]
    pub fn target_filter(mut self, filter: TargetFilter) -> Self {
        self.def.target_filter = filter;
        self
    }

    /// Chain a follow-up offered for `window` ticks after completion.
    #[must_use]
    pub fn follow_up(mut self, next: Arc<AttackDefinition>, window: u32) -> Self {
        self.def.follow_up = Some(next);
        self.def.follow_up_window = window;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<AttackDefinition, ConfigError> {
        let def = self.def;
        let move_id = || def.id.clone();

        for (field, value) in [
            ("damage", def.damage),
            ("range", def.range),
            ("knockback", def.knockback),
            ("resource_cost", def.resource_cost),
            ("hitbox.vertical_offset", def.hitbox.vertical_offset.abs()),
            ("hitbox.growth_rate", def.hitbox.growth_rate),
            (
                "hitbox.forward_offset",
                def.hitbox.forward_offset.map_or(0.0, f32::abs),
            ),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    move_id: move_id(),
                    field,
                    value,
                });
            }
        }

        if !def.hitbox.shape.is_valid() {
            return Err(ConfigError::InvalidHitboxShape { move_id: move_id() });
        }
        if def.hitbox.lifetime == Some(0) {
            return Err(ConfigError::ZeroHitboxLifetime { move_id: move_id() });
        }
        if def.max_hits_per_target == 0 {
            return Err(ConfigError::ZeroMaxHits { move_id: move_id() });
        }
        if let StrikeMode::Blitz {
            spawn_interval,
            max_hitboxes,
        } = def.strike
        {
            if spawn_interval == 0 {
                return Err(ConfigError::ZeroSpawnInterval { move_id: move_id() });
            }
            if max_hitboxes == 0 {
                return Err(ConfigError::ZeroMaxHitboxes { move_id: move_id() });
            }
        }
        if let Some(degrees) = def.target_filter.max_angle() {
            if !(degrees > 0.0 && degrees <= 180.0) {
                return Err(ConfigError::InvalidFacingAngle {
                    move_id: move_id(),
                    degrees,
                });
            }
        }

        Ok(def)
    }

    /// Validate, build and wrap for sharing.
    pub fn build_shared(self) -> Result<Arc<AttackDefinition>, ConfigError> {
        self.build().map(Arc::new)
    }
}
