//! Timed hit volumes.
//!
//! This module provides:
//! - Hit shapes (sphere, oriented box and its cube/wide/tall/long presets)
//! - Hit volumes (a shape placed in the world, used for spatial queries)
//! - Hitbox specs (geometry and lifetime configuration on a move)
//! - Hitboxes (the live, aging volume owned by one attack instance)

use ahash::AHashMap;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tempest_common::{AgentId, Tick};

use crate::definition::KnockbackMode;
use crate::world::Pose;

// ============================================================================
// Shapes and volumes
// ============================================================================

/// Shape of a hit volume.
///
/// Box extents are in the attacker's frame: x = right, y = up, z = forward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HitShape {
    /// Sphere around the center.
    Sphere {
        /// Radius in world units.
        radius: f32,
    },
    /// Box oriented along the attacker's facing.
    Box {
        /// Half extents (right, up, forward).
        half_extents: Vec3,
    },
}

impl Default for HitShape {
    fn default() -> Self {
        Self::cube(1.5)
    }
}

impl HitShape {
    /// Create a sphere.
    #[must_use]
    pub const fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Create a box from full extents.
    #[must_use]
    pub fn cuboid(width: f32, height: f32, length: f32) -> Self {
        Self::Box {
            half_extents: Vec3::new(width, height, length) * 0.5,
        }
    }

    /// Equal-sided box.
    #[must_use]
    pub fn cube(size: f32) -> Self {
        Self::cuboid(size, size, size)
    }

    /// Broad horizontal sweep.
    #[must_use]
    pub fn wide(size: f32) -> Self {
        Self::cuboid(size * 3.0, size, size)
    }

    /// Vertical slash.
    #[must_use]
    pub fn tall(size: f32) -> Self {
        Self::cuboid(size, size * 3.0, size)
    }

    /// Forward thrust.
    #[must_use]
    pub fn long(size: f32) -> Self {
        Self::cuboid(size, size, size * 3.0)
    }

    /// Radius of a sphere enclosing the shape.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Self::Sphere { radius } => *radius,
            Self::Box { half_extents } => half_extents.length(),
        }
    }

    /// Check that every extent is finite and positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Sphere { radius } => radius.is_finite() && *radius > 0.0,
            Self::Box { half_extents } => {
                half_extents.is_finite() && half_extents.min_element() > 0.0
            },
        }
    }

    /// The shape with every extent grown by `amount`.
    #[must_use]
    pub fn grown(&self, amount: f32) -> Self {
        match self {
            Self::Sphere { radius } => Self::Sphere {
                radius: radius + amount,
            },
            Self::Box { half_extents } => Self::Box {
                half_extents: *half_extents + Vec3::splat(amount),
            },
        }
    }
}

/// A shape placed in the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitVolume {
    /// World-space center.
    pub center: Vec3,
    /// Unit horizontal forward axis for box shapes.
    pub forward: Vec3,
    /// Shape of the volume.
    pub shape: HitShape,
}

impl HitVolume {
    /// Create a volume.
    #[must_use]
    pub fn new(center: Vec3, forward: Vec3, shape: HitShape) -> Self {
        Self {
            center,
            forward,
            shape,
        }
    }

    /// Express a world point in the volume's local frame (right, up, forward).
    #[must_use]
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        let d = point - self.center;
        let right = Vec3::Y.cross(self.forward).normalize_or_zero();
        Vec3::new(d.dot(right), d.y, d.dot(self.forward))
    }

    /// Check whether a sphere (a target body) touches the volume.
    #[must_use]
    pub fn intersects_sphere(&self, point: Vec3, radius: f32) -> bool {
        match self.shape {
            HitShape::Sphere { radius: r } => point.distance(self.center) <= r + radius,
            HitShape::Box { half_extents } => {
                let local = self.to_local(point);
                let closest = local.clamp(-half_extents, half_extents);
                local.distance(closest) <= radius
            },
        }
    }
}

// ============================================================================
// Hitbox configuration
// ============================================================================

/// Geometry and lifetime of the hitboxes a move spawns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitboxSpec {
    /// Shape at spawn.
    pub shape: HitShape,
    /// Distance ahead of the attacker; `None` uses the move's range.
    pub forward_offset: Option<f32>,
    /// Height above the attacker's position.
    pub vertical_offset: f32,
    /// Ticks the hitbox lives; `None` lasts until the active window closes.
    pub lifetime: Option<u32>,
    /// Extent growth per tick of age (expanding moves).
    pub growth_rate: f32,
    /// Re-center on the attacker every tick instead of staying where spawned.
    pub follow_owner: bool,
    /// Ticks before the same hitbox may strike the same target again.
    pub rehit_interval: Option<u32>,
}

impl Default for HitboxSpec {
    fn default() -> Self {
        Self {
            shape: HitShape::default(),
            forward_offset: None,
            vertical_offset: 1.0,
            lifetime: None,
            growth_rate: 0.0,
            follow_owner: true,
            rehit_interval: None,
        }
    }
}

impl HitboxSpec {
    /// Create a spec with the given shape.
    #[must_use]
    pub fn new(shape: HitShape) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    /// Set the forward offset.
    #[must_use]
    pub fn with_forward_offset(mut self, offset: f32) -> Self {
        self.forward_offset = Some(offset);
        self
    }

    /// Set the vertical offset.
    #[must_use]
    pub fn with_vertical_offset(mut self, offset: f32) -> Self {
        self.vertical_offset = offset;
        self
    }

    /// Set a fixed lifetime.
    #[must_use]
    pub fn with_lifetime(mut self, ticks: u32) -> Self {
        self.lifetime = Some(ticks);
        self
    }

    /// Set the growth rate.
    #[must_use]
    pub fn with_growth(mut self, rate: f32) -> Self {
        self.growth_rate = rate;
        self
    }

    /// Leave the hitbox where it spawned.
    #[must_use]
    pub fn detached(mut self) -> Self {
        self.follow_owner = false;
        self
    }

    /// Allow re-hits on the same target after `ticks`.
    #[must_use]
    pub fn with_rehit_interval(mut self, ticks: u32) -> Self {
        self.rehit_interval = Some(ticks);
        self
    }
}

// ============================================================================
// Live hitbox
// ============================================================================

/// Placement values resolved from the [`HitboxSpec`] and the move at spawn time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HitboxPlacement {
    pub index: u32,
    pub forward_offset: f32,
    pub lifetime: Option<u32>,
    pub knockback: KnockbackMode,
}

/// A live hit volume owned by one attack instance.
#[derive(Debug, Clone)]
pub struct Hitbox {
    index: u32,
    volume: HitVolume,
    base_shape: HitShape,
    spawn_tick: Tick,
    age: u32,
    lifetime: Option<u32>,
    growth_rate: f32,
    follow_owner: bool,
    forward_offset: f32,
    vertical_offset: f32,
    rehit_interval: Option<u32>,
    knockback: KnockbackMode,
    expired: bool,
    /// Target -> tick of the last strike by this hitbox.
    struck: AHashMap<AgentId, Tick>,
}

impl Hitbox {
    pub(crate) fn spawn(
        spec: &HitboxSpec,
        placement: HitboxPlacement,
        owner: &Pose,
        now: Tick,
    ) -> Self {
        let center = owner.anchor(placement.forward_offset, spec.vertical_offset);
        Self {
            index: placement.index,
            volume: HitVolume::new(center, owner.facing, spec.shape),
            base_shape: spec.shape,
            spawn_tick: now,
            age: 0,
            lifetime: placement.lifetime,
            growth_rate: spec.growth_rate,
            follow_owner: spec.follow_owner,
            forward_offset: placement.forward_offset,
            vertical_offset: spec.vertical_offset,
            rehit_interval: spec.rehit_interval,
            knockback: placement.knockback,
            expired: false,
            struck: AHashMap::new(),
        }
    }

    /// Spawn order within the owning attack (0-based).
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Current world volume.
    #[must_use]
    pub fn volume(&self) -> &HitVolume {
        &self.volume
    }

    /// Tick the hitbox spawned on.
    #[must_use]
    pub fn spawn_tick(&self) -> Tick {
        self.spawn_tick
    }

    /// Ticks since spawn.
    #[must_use]
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Configured lifetime, if any.
    #[must_use]
    pub fn lifetime(&self) -> Option<u32> {
        self.lifetime
    }

    /// Knockback rule this hitbox applies.
    #[must_use]
    pub fn knockback(&self) -> KnockbackMode {
        self.knockback
    }

    /// Check if the hitbox has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Number of distinct targets this hitbox struck.
    #[must_use]
    pub fn struck_count(&self) -> usize {
        self.struck.len()
    }

    /// Check if this hitbox already struck `target`.
    #[must_use]
    pub fn has_struck(&self, target: AgentId) -> bool {
        self.struck.contains_key(&target)
    }

    /// Age one tick: grow, follow the owner, expire when the lifetime runs out.
    pub(crate) fn advance(&mut self, owner: Option<&Pose>) {
        if self.expired {
            return;
        }
        self.age = self.age.saturating_add(1);
        if self.lifetime.is_some_and(|life| self.age >= life) {
            self.expired = true;
            return;
        }
        if self.growth_rate > 0.0 {
            self.volume.shape = self.base_shape.grown(self.growth_rate * self.age as f32);
        }
        if self.follow_owner {
            if let Some(pose) = owner {
                self.volume.center = pose.anchor(self.forward_offset, self.vertical_offset);
                self.volume.forward = pose.facing;
            }
        }
    }

    /// Check if this hitbox may strike `target` on tick `now`.
    #[must_use]
    pub fn can_strike(&self, target: AgentId, now: Tick) -> bool {
        if self.expired {
            return false;
        }
        match (self.struck.get(&target), self.rehit_interval) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(&last), Some(interval)) => now.saturating_sub(last) >= u64::from(interval),
        }
    }

    pub(crate) fn record_strike(&mut self, target: AgentId, now: Tick) {
        self.struck.insert(target, now);
    }

    /// Mark the hitbox expired.
    pub(crate) fn expire(&mut self) {
        self.expired = true;
    }
}
