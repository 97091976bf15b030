//! Move archetypes.
//!
//! Every built-in or data-driven move starts from one of these archetypes,
//! which presets timing, strike mode, hitbox geometry and knockback. Callers
//! layer damage, cost and cooldown on top of the returned builder.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tempest_combat::{
    AttackDefinition, AttackDefinitionBuilder, HitShape, HitboxSpec, KnockbackMode, StrikeMode,
    TargetFilter,
};
use tempest_common::MoveId;

/// Shape of a move before tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Technique {
    /// One immediate strike in front of the attacker.
    SingleSlash {
        /// Hit volume of the slash.
        shape: HitShape,
    },
    /// Two sweeping hitboxes; the first pulls the target in, the second throws it out.
    DoubleSlash {
        /// Ticks between the two slashes.
        interval: u32,
    },
    /// A chain of hitboxes left behind along a dash.
    BlitzDash {
        /// Ticks between hitboxes.
        interval: u32,
        /// Number of hitboxes.
        count: u32,
    },
    /// A sphere around the attacker that grows while active.
    ExpandingWhirl {
        /// Starting radius.
        radius: f32,
        /// Radius growth per tick.
        growth: f32,
    },
    /// A long thrust that keeps hitting whatever stays inside it.
    PiercingThrust {
        /// Reach of the thrust.
        length: f32,
        /// Ticks between hits on the same target.
        rehit_interval: u32,
        /// Hits allowed per target.
        max_hits: u32,
    },
}

impl Technique {
    /// Archetype name, for logs and listings.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleSlash { .. } => "single_slash",
            Self::DoubleSlash { .. } => "double_slash",
            Self::BlitzDash { .. } => "blitz_dash",
            Self::ExpandingWhirl { .. } => "expanding_whirl",
            Self::PiercingThrust { .. } => "piercing_thrust",
        }
    }

    /// A builder preset for this archetype.
    #[must_use]
    pub fn builder(&self, id: impl Into<MoveId>) -> AttackDefinitionBuilder {
        let builder = AttackDefinition::builder(id);
        match *self {
            Self::SingleSlash { shape } => builder
                .timing(4, 5, 8)
                .shape(shape)
                .knockback(0.4, KnockbackMode::Radial)
                .target_filter(TargetFilter::Facing { max_angle: 75.0 }),
            Self::DoubleSlash { interval } => builder
                .timing(3, interval.saturating_add(2), 8)
                .blitz(interval, 2)
                .hitbox(HitboxSpec::new(HitShape::wide(1.0)).with_lifetime(interval.max(1)))
                .max_hits_per_target(2)
                .knockback(0.6, KnockbackMode::Pull)
                .final_knockback(KnockbackMode::Radial),
            Self::BlitzDash { interval, count } => builder
                .timing(2, interval.saturating_mul(count), 6)
                .blitz(interval, count)
                .hitbox(
                    HitboxSpec::new(HitShape::long(1.0))
                        .detached()
                        .with_lifetime(interval.saturating_mul(2).max(1)),
                )
                .max_hits_per_target(2)
                .knockback(0.3, KnockbackMode::Facing),
            Self::ExpandingWhirl { radius, growth } => builder
                .timing(5, 12, 10)
                .strike(StrikeMode::Persistent)
                .hitbox(
                    HitboxSpec::new(HitShape::sphere(radius))
                        .with_forward_offset(0.0)
                        .with_vertical_offset(0.5)
                        .with_growth(growth),
                )
                .knockback(0.8, KnockbackMode::Radial),
            Self::PiercingThrust {
                length,
                rehit_interval,
                max_hits,
            } => builder
                .timing(6, 10, 8)
                .strike(StrikeMode::Persistent)
                .hitbox(
                    HitboxSpec::new(HitShape::Box {
                        half_extents: Vec3::new(0.4, 0.4, length * 0.5),
                    })
                    .with_forward_offset(length * 0.5)
                    .with_rehit_interval(rehit_interval),
                )
                .range(length)
                .max_hits_per_target(max_hits)
                .knockback(0.5, KnockbackMode::Facing)
                .target_filter(TargetFilter::LineOfSight),
        }
    }
}
