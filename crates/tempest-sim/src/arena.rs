//! Arena world.
//!
//! Owns every body in the arena and answers the combat core's spatial
//! queries. Hits handed back by the core are applied here: damage, hit stun
//! and knockback displacement. Bodies at zero health are dead; they vanish
//! from queries and report [`TargetUnavailable`] to late hits.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::Serialize;
use tempest_combat::{CombatApplication, HitEvent, HitVolume, Pose, SpatialQuery, TargetUnavailable};
use tempest_common::AgentId;
use tracing::{info, trace};

use crate::config::{ArenaAgentConfig, Obstacle, SimConfig};

/// One body in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaBody {
    /// Position and facing.
    pub pose: Pose,
    /// Body radius.
    pub radius: f32,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Remaining hit stun in ticks.
    pub stun: u32,
}

impl ArenaBody {
    /// Create a body from its arena config.
    #[must_use]
    pub fn from_config(config: &ArenaAgentConfig) -> Self {
        Self {
            pose: Pose::new(config.position, config.facing),
            radius: config.radius,
            health: config.health,
            max_health: config.health,
            stun: 0,
        }
    }

    /// Check if the body has health left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Check if the body is in hit stun.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.stun > 0
    }
}

/// Running combat totals for one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CombatLedger {
    /// Damage this agent dealt.
    pub damage_dealt: f32,
    /// Damage this agent took.
    pub damage_taken: f32,
    /// Hits this agent landed.
    pub hits_landed: u32,
    /// Hits this agent took.
    pub hits_taken: u32,
    /// Agents this agent defeated.
    pub kills: u32,
    /// Times this agent was defeated.
    pub deaths: u32,
}

/// The arena: bodies, obstacles and combat bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct ArenaWorld {
    bodies: BTreeMap<AgentId, ArenaBody>,
    obstacles: Vec<Obstacle>,
    ledgers: BTreeMap<AgentId, CombatLedger>,
    knockback_scale: f32,
}

impl ArenaWorld {
    /// Create an empty arena.
    #[must_use]
    pub fn new(knockback_scale: f32) -> Self {
        Self {
            knockback_scale,
            ..Self::default()
        }
    }

    /// Build the arena described by `config`.
    #[must_use]
    pub fn from_config(config: &SimConfig) -> Self {
        let mut world = Self::new(config.knockback_scale);
        world.obstacles.clone_from(&config.obstacles);
        for agent in &config.agents {
            world.spawn(agent.agent_id(), ArenaBody::from_config(agent));
        }
        world
    }

    /// Add or replace a body.
    pub fn spawn(&mut self, agent: AgentId, body: ArenaBody) {
        self.bodies.insert(agent, body);
        self.ledgers.entry(agent).or_default();
    }

    /// Add a line-of-sight blocker.
    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// Look up a body, dead or alive.
    #[must_use]
    pub fn body(&self, agent: AgentId) -> Option<&ArenaBody> {
        self.bodies.get(&agent)
    }

    /// Totals for an agent.
    #[must_use]
    pub fn ledger(&self, agent: AgentId) -> CombatLedger {
        self.ledgers.get(&agent).copied().unwrap_or_default()
    }

    /// Every body in ID order.
    pub fn bodies(&self) -> impl Iterator<Item = (AgentId, &ArenaBody)> {
        self.bodies.iter().map(|(id, body)| (*id, body))
    }

    /// Check if an agent exists and is alive.
    #[must_use]
    pub fn is_alive(&self, agent: AgentId) -> bool {
        self.bodies.get(&agent).is_some_and(ArenaBody::is_alive)
    }

    /// Check if an agent is in hit stun.
    #[must_use]
    pub fn is_stunned(&self, agent: AgentId) -> bool {
        self.bodies.get(&agent).is_some_and(ArenaBody::is_stunned)
    }

    /// Number of living bodies.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.bodies.values().filter(|b| b.is_alive()).count()
    }

    /// Count down hit stun on every body.
    pub fn tick(&mut self) {
        for body in self.bodies.values_mut() {
            body.stun = body.stun.saturating_sub(1);
        }
    }
}

/// Whether the segment `from -> to` passes through the vertical pillar.
fn segment_hits_pillar(from: Vec3, to: Vec3, pillar: &Obstacle) -> bool {
    let a = Vec3::new(from.x, 0.0, from.z);
    let b = Vec3::new(to.x, 0.0, to.z);
    let c = Vec3::new(pillar.center.x, 0.0, pillar.center.z);
    let ab = b - a;
    let len_sq = ab.length_squared();
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((c - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    };
    (a + ab * t).distance(c) < pillar.radius
}

impl SpatialQuery for ArenaWorld {
    fn pose(&self, agent: AgentId) -> Option<Pose> {
        self.bodies
            .get(&agent)
            .filter(|b| b.is_alive())
            .map(|b| b.pose)
    }

    fn query_overlapping(&self, volume: &HitVolume, exclude: AgentId) -> Vec<AgentId> {
        self.bodies
            .iter()
            .filter(|(id, body)| **id != exclude && body.is_alive())
            .filter(|(_, body)| volume.intersects_sphere(body.pose.position, body.radius))
            .map(|(id, _)| *id)
            .collect()
    }

    fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        !self.obstacles.iter().any(|o| segment_hits_pillar(from, to, o))
    }
}

impl CombatApplication for ArenaWorld {
    fn apply_hit(&mut self, hit: &HitEvent) -> Result<(), TargetUnavailable> {
        let body = self
            .bodies
            .get_mut(&hit.target)
            .filter(|b| b.is_alive())
            .ok_or(TargetUnavailable(hit.target))?;

        let dealt = hit.damage.min(body.health);
        body.health = (body.health - hit.damage).max(0.0);
        body.stun = body.stun.max(hit.hit_stun);
        let shove = Vec3::new(hit.knockback.x, 0.0, hit.knockback.z) * self.knockback_scale;
        body.pose.position += shove;
        let died = !body.is_alive();

        trace!(
            attacker = %hit.attacker,
            target = %hit.target,
            move_id = %hit.move_id,
            damage = dealt,
            tick = hit.tick,
            "Hit applied"
        );

        let target = self.ledgers.entry(hit.target).or_default();
        target.damage_taken += dealt;
        target.hits_taken += 1;
        if died {
            target.deaths += 1;
        }
        let attacker = self.ledgers.entry(hit.attacker).or_default();
        attacker.damage_dealt += dealt;
        attacker.hits_landed += 1;
        if died {
            attacker.kills += 1;
            info!(attacker = %hit.attacker, target = %hit.target, tick = hit.tick, "Agent defeated");
        }
        Ok(())
    }
}
