//! Interfaces to the host world.
//!
//! The core never owns targets. It asks the host where agents are, which of
//! them overlap a volume, and hands finished hits back for damage application.
//! [`MockWorld`] implements both sides for tests and tooling.

use std::collections::BTreeMap;

use ahash::AHashSet;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tempest_common::{AgentId, MoveId, Tick};

use crate::error::TargetUnavailable;
use crate::hitbox::HitVolume;

/// Position and horizontal facing of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// World position (feet).
    pub position: Vec3,
    /// Unit facing direction on the horizontal plane.
    pub facing: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            facing: Vec3::Z,
        }
    }
}

impl Pose {
    /// Create a pose. `facing` is flattened and normalized (+Z if degenerate).
    #[must_use]
    pub fn new(position: Vec3, facing: Vec3) -> Self {
        Self {
            position,
            facing: flatten(facing).unwrap_or(Vec3::Z),
        }
    }

    /// Unit vector to the right of the facing.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        Vec3::Y.cross(self.facing).normalize_or_zero()
    }

    /// Point `forward` units ahead and `up` units above the position.
    #[must_use]
    pub fn anchor(&self, forward: f32, up: f32) -> Vec3 {
        self.position + self.facing * forward + Vec3::Y * up
    }

    /// Horizontal direction from this pose toward `point`, if not degenerate.
    #[must_use]
    pub fn direction_to(&self, point: Vec3) -> Option<Vec3> {
        flatten(point - self.position)
    }

    /// Angle in degrees between the facing and the direction to `point`.
    #[must_use]
    pub fn angle_to(&self, point: Vec3) -> f32 {
        self.direction_to(point).map_or(0.0, |dir| {
            self.facing.dot(dir).clamp(-1.0, 1.0).acos().to_degrees()
        })
    }
}

/// Project onto the horizontal plane and normalize.
pub(crate) fn flatten(v: Vec3) -> Option<Vec3> {
    let flat = Vec3::new(v.x, 0.0, v.z);
    let len = flat.length();
    if len <= 1e-6 || !len.is_finite() {
        None
    } else {
        Some(flat / len)
    }
}

/// A resolved hit, handed to the host for damage application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitEvent {
    /// Attacking agent.
    pub attacker: AgentId,
    /// Struck agent.
    pub target: AgentId,
    /// Move that landed the hit.
    pub move_id: MoveId,
    /// Damage to apply.
    pub damage: f32,
    /// Knockback vector (direction * force).
    pub knockback: Vec3,
    /// Hit stun to apply, in ticks.
    pub hit_stun: u32,
    /// Center of the hitbox that struck.
    pub position: Vec3,
    /// Spawn index of the hitbox within its attack.
    pub hitbox_index: u32,
    /// Tick the hit landed on.
    pub tick: Tick,
}

/// Spatial queries provided by the host world.
pub trait SpatialQuery {
    /// Current pose of an agent, or `None` if it no longer exists.
    fn pose(&self, agent: AgentId) -> Option<Pose>;

    /// Living, hit-eligible agents overlapping `volume`, excluding `exclude`.
    ///
    /// The order of the returned list is the order hits are resolved in.
    fn query_overlapping(&self, volume: &HitVolume, exclude: AgentId) -> Vec<AgentId>;

    /// Whether nothing solid blocks the segment `from -> to`.
    fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        let _ = (from, to);
        true
    }
}

/// Damage and status application provided by the host.
pub trait CombatApplication {
    /// Apply a hit. Fails if the target vanished since the query.
    fn apply_hit(&mut self, hit: &HitEvent) -> Result<(), TargetUnavailable>;
}

/// Everything an attack needs from the host for one tick.
pub trait CombatWorld: SpatialQuery + CombatApplication {}

impl<T: SpatialQuery + CombatApplication + ?Sized> CombatWorld for T {}

/// A body in the [`MockWorld`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockBody {
    /// Pose of the body.
    pub pose: Pose,
    /// Collision radius.
    pub radius: f32,
}

/// Mock world for testing.
///
/// Bodies are spheres; queries return overlapping bodies in ascending ID order.
#[derive(Debug, Default)]
pub struct MockWorld {
    bodies: BTreeMap<AgentId, MockBody>,
    /// Bodies still returned by queries but rejected on application.
    vanished: AHashSet<AgentId>,
    /// Bodies hidden from line-of-sight checks.
    occluded: AHashSet<AgentId>,
    /// Every hit applied so far, in order.
    pub hits: Vec<HitEvent>,
}

impl MockWorld {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a body.
    pub fn place(&mut self, agent: AgentId, position: Vec3, facing: Vec3, radius: f32) {
        self.bodies.insert(
            agent,
            MockBody {
                pose: Pose::new(position, facing),
                radius,
            },
        );
    }

    /// Move an existing body.
    pub fn move_to(&mut self, agent: AgentId, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.pose.position = position;
        }
    }

    /// Remove a body entirely.
    pub fn remove(&mut self, agent: AgentId) {
        self.bodies.remove(&agent);
    }

    /// Keep the body in queries but fail hit application (stale index).
    pub fn vanish(&mut self, agent: AgentId) {
        self.vanished.insert(agent);
    }

    /// Hide the body from line-of-sight checks.
    pub fn occlude(&mut self, agent: AgentId) {
        self.occluded.insert(agent);
    }

    /// Hits applied to `target`.
    #[must_use]
    pub fn hits_on(&self, target: AgentId) -> usize {
        self.hits.iter().filter(|h| h.target == target).count()
    }
}

impl SpatialQuery for MockWorld {
    fn pose(&self, agent: AgentId) -> Option<Pose> {
        self.bodies.get(&agent).map(|b| b.pose)
    }

    fn query_overlapping(&self, volume: &HitVolume, exclude: AgentId) -> Vec<AgentId> {
        self.bodies
            .iter()
            .filter(|(id, _)| **id != exclude)
            .filter(|(_, body)| volume.intersects_sphere(body.pose.position, body.radius))
            .map(|(id, _)| *id)
            .collect()
    }

    fn has_line_of_sight(&self, _from: Vec3, to: Vec3) -> bool {
        !self
            .bodies
            .iter()
            .any(|(id, body)| self.occluded.contains(id) && body.pose.position == to)
    }
}

impl CombatApplication for MockWorld {
    fn apply_hit(&mut self, hit: &HitEvent) -> Result<(), TargetUnavailable> {
        if self.vanished.contains(&hit.target) || !self.bodies.contains_key(&hit.target) {
            return Err(TargetUnavailable(hit.target));
        }
        self.hits.push(hit.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_normalizes_facing() {
        let pose = Pose::new(Vec3::ZERO, Vec3::new(3.0, 5.0, 0.0));
        assert!((pose.facing - Vec3::X).length() < 1e-6);

        let degenerate = Pose::new(Vec3::ZERO, Vec3::Y);
        assert_eq!(degenerate.facing, Vec3::Z);
    }

    #[test]
    fn test_pose_anchor_and_angle() {
        let pose = Pose::new(Vec3::ZERO, Vec3::Z);
        assert_eq!(pose.anchor(2.0, 1.0), Vec3::new(0.0, 1.0, 2.0));
        assert!(pose.angle_to(Vec3::new(0.0, 0.0, 5.0)) < 1e-3);
        assert!((pose.angle_to(Vec3::new(5.0, 0.0, 0.0)) - 90.0).abs() < 1e-3);
        assert!((pose.angle_to(Vec3::new(0.0, 0.0, -5.0)) - 180.0).abs() < 1e-3);
    }

    #[test]
    fn test_pose_right_is_perpendicular() {
        let pose = Pose::new(Vec3::ZERO, Vec3::Z);
        assert!(pose.right().dot(pose.facing).abs() < 1e-6);
        assert!((pose.right().length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mock_world_rejects_vanished_targets() {
        let mut world = MockWorld::new();
        let target = AgentId::from_raw(2);
        world.place(target, Vec3::ZERO, Vec3::Z, 0.5);
        world.vanish(target);

        let hit = HitEvent {
            attacker: AgentId::from_raw(1),
            target,
            move_id: MoveId::new("test"),
            damage: 1.0,
            knockback: Vec3::ZERO,
            hit_stun: 0,
            position: Vec3::ZERO,
            hitbox_index: 0,
            tick: 0,
        };
        assert_eq!(world.apply_hit(&hit), Err(TargetUnavailable(target)));
        assert!(world.hits.is_empty());
    }
}
