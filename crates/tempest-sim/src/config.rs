//! Arena configuration.
//!
//! Describes who stands in the arena, what they press and when, and the pool
//! tuning every agent shares. Loaded from TOML; missing fields fall back to
//! defaults.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tempest_combat::CombatConfig;
use tempest_common::{AgentId, AgentIdAllocator, MoveId, TempestError, TempestResult, Tick};
use tracing::{debug, info, warn};

/// Longest run the harness accepts.
pub const MAX_TICKS: u64 = 1_000_000;

/// A move press at a fixed tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedPress {
    /// Tick the press happens on.
    pub tick: Tick,
    /// Move requested.
    #[serde(rename = "move")]
    pub move_id: MoveId,
}

/// One agent placed in the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaAgentConfig {
    /// Raw agent ID. 0 gets the next free ID on validation.
    pub id: u64,
    /// Spawn position.
    pub position: Vec3,
    /// Spawn facing.
    pub facing: Vec3,
    /// Starting and maximum health.
    pub health: f32,
    /// Body radius used for overlap tests.
    pub radius: f32,
    /// Presses in tick order.
    pub presses: Vec<ScriptedPress>,
}

impl Default for ArenaAgentConfig {
    fn default() -> Self {
        Self {
            id: 1,
            position: Vec3::ZERO,
            facing: Vec3::Z,
            health: 100.0,
            radius: 0.5,
            presses: Vec::new(),
        }
    }
}

impl ArenaAgentConfig {
    /// Agent ID.
    #[must_use]
    pub fn agent_id(&self) -> AgentId {
        AgentId::from_raw(self.id)
    }
}

/// A pillar blocking line of sight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Center of the pillar base.
    pub center: Vec3,
    /// Pillar radius.
    pub radius: f32,
}

/// Full arena configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Ticks to simulate.
    pub ticks: u64,
    /// Multiplier from knockback vectors to displacement.
    pub knockback_scale: f32,
    /// Whether a landed hit cancels the target's running attack.
    pub hits_interrupt: bool,
    /// Line-of-sight blockers.
    pub obstacles: Vec<Obstacle>,
    /// Pool tuning shared by every agent.
    pub combat: CombatConfig,
    /// Agents in the arena.
    pub agents: Vec<ArenaAgentConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks: 300,
            knockback_scale: 1.0,
            hits_interrupt: true,
            obstacles: Vec::new(),
            combat: CombatConfig::default(),
            agents: vec![
                ArenaAgentConfig {
                    id: 1,
                    position: Vec3::new(0.0, 0.0, 0.0),
                    facing: Vec3::Z,
                    presses: vec![
                        press(0, "basic.slash"),
                        press(30, "water.striking_tide"),
                        press(50, "water.striking_tide"),
                        press(120, "thunder.thunderclap"),
                    ],
                    ..ArenaAgentConfig::default()
                },
                ArenaAgentConfig {
                    id: 2,
                    position: Vec3::new(0.0, 0.0, 2.0),
                    facing: Vec3::NEG_Z,
                    presses: vec![
                        press(10, "basic.heavy"),
                        press(80, "flame.rising_sun"),
                        press(100, "flame.rising_sun"),
                    ],
                    ..ArenaAgentConfig::default()
                },
            ],
        }
    }
}

fn press(tick: Tick, move_id: &str) -> ScriptedPress {
    ScriptedPress {
        tick,
        move_id: MoveId::from(move_id),
    }
}

impl SimConfig {
    /// Parse a config from TOML and validate it.
    pub fn from_toml_str(content: &str) -> TempestResult<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.validate();
        config.check()?;
        Ok(config)
    }

    /// Reject configs that cannot be run even after [`SimConfig::validate`].
    pub fn check(&self) -> TempestResult<()> {
        if self.agents.is_empty() {
            return Err(TempestError::InvalidConfig("arena has no agents".to_string()));
        }
        if let Some(agent) = self.agents.iter().find(|a| a.facing.length_squared() <= f32::EPSILON) {
            return Err(TempestError::InvalidConfig(format!(
                "agent {} has no facing direction",
                agent.id
            )));
        }
        Ok(())
    }

    /// Load a config, falling back to defaults if the file is missing or invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Arena config not found at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded arena config from {}", path.display());
                    config
                },
                Err(e) => {
                    warn!("Rejected arena config: {e}");
                    Self::default()
                },
            },
            Err(e) => {
                warn!("Failed to read arena config: {e}");
                Self::default()
            },
        }
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> TempestResult<String> {
        toml::to_string_pretty(self).map_err(|e| TempestError::Serialization(e.to_string()))
    }

    /// Clamp values to sensible ranges, assign missing agent IDs and drop duplicates.
    pub fn validate(&mut self) {
        self.ticks = self.ticks.clamp(1, MAX_TICKS);
        if !self.knockback_scale.is_finite() {
            self.knockback_scale = 1.0;
        }
        self.knockback_scale = self.knockback_scale.clamp(0.0, 10.0);
        self.combat.validate();

        self.obstacles
            .retain(|o| o.center.is_finite() && o.radius.is_finite() && o.radius > 0.0);

        let mut seen = BTreeSet::new();
        self.agents.retain(|agent| {
            if agent.id != 0 && !seen.insert(agent.id) {
                warn!(id = agent.id, "Dropping duplicate arena agent");
                return false;
            }
            true
        });

        let mut allocator = AgentIdAllocator::new();
        for id in &seen {
            allocator.reserve(AgentId::from_raw(*id));
        }
        for agent in &mut self.agents {
            if agent.id == 0 {
                agent.id = allocator.next_id().raw();
                debug!(id = agent.id, "Assigned arena agent ID");
            }
            if !agent.position.is_finite() {
                agent.position = Vec3::ZERO;
            }
            if !agent.facing.is_finite() {
                agent.facing = Vec3::Z;
            }
            if !agent.health.is_finite() {
                agent.health = 100.0;
            }
            agent.health = agent.health.clamp(1.0, 1_000_000.0);
            if !agent.radius.is_finite() {
                agent.radius = 0.5;
            }
            agent.radius = agent.radius.clamp(0.1, 5.0);
            agent.presses.sort_by_key(|p| p.tick);
        }
    }

    /// Every `(tick, agent, move)` press across all agents, in tick then agent order.
    #[must_use]
    pub fn schedule(&self) -> Vec<(Tick, AgentId, MoveId)> {
        let mut presses: Vec<_> = self
            .agents
            .iter()
            .flat_map(|agent| {
                agent
                    .presses
                    .iter()
                    .map(move |p| (p.tick, agent.agent_id(), p.move_id.clone()))
            })
            .collect();
        presses.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        presses
    }
}
