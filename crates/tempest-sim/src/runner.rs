//! Drives scripted presses through the scheduler against the arena.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tempest_combat::{AttackScheduler, EffectBus, EffectCue, MoveCatalog, SchedulerTickReport, StartError, Started};
use tempest_common::{AgentId, MoveId, Tick};
use tracing::{debug, info, trace, warn};

use crate::arena::ArenaWorld;
use crate::config::SimConfig;
use crate::summary::{AgentSummary, SimSummary};

/// A running arena simulation.
#[derive(Debug)]
pub struct Simulation {
    scheduler: AttackScheduler,
    world: ArenaWorld,
    bus: EffectBus,
    presses: VecDeque<(Tick, AgentId, MoveId)>,
    refused: BTreeMap<AgentId, u32>,
    hits_interrupt: bool,
    cues: usize,
}

impl Simulation {
    /// Set up the arena and register every configured agent.
    #[must_use]
    pub fn new(config: &SimConfig, catalog: Arc<MoveCatalog>) -> Self {
        let bus = EffectBus::default();
        let mut scheduler = AttackScheduler::new(catalog, config.combat).with_effects(bus.sender());
        for agent in &config.agents {
            scheduler.add_agent(agent.agent_id());
        }

        Self {
            scheduler,
            world: ArenaWorld::from_config(config),
            bus,
            presses: config.schedule().into(),
            refused: BTreeMap::new(),
            hits_interrupt: config.hits_interrupt,
            cues: 0,
        }
    }

    /// Current tick.
    #[must_use]
    pub fn now(&self) -> Tick {
        self.scheduler.now()
    }

    /// The arena.
    #[must_use]
    pub fn world(&self) -> &ArenaWorld {
        &self.world
    }

    /// The scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &AttackScheduler {
        &self.scheduler
    }

    /// Press a move for `agent` on the current tick.
    pub fn press(&mut self, agent: AgentId, move_id: &MoveId) -> Result<Started, StartError> {
        let result = self.scheduler.try_start(agent, move_id);
        match &result {
            Ok(started) if started.substituted => {
                debug!(%agent, requested = %move_id, move_id = %started.move_id, "Follow-up substituted");
            },
            Ok(_) => {},
            Err(err @ (StartError::UnknownMove(_) | StartError::UnknownAgent(_))) => {
                warn!(%agent, %move_id, "Press rejected: {err}");
                *self.refused.entry(agent).or_default() += 1;
            },
            Err(err) => {
                debug!(%agent, %move_id, "Press refused: {err}");
                *self.refused.entry(agent).or_default() += 1;
            },
        }
        result
    }

    /// Apply due presses, then advance one tick.
    pub fn step(&mut self) -> SchedulerTickReport {
        let now = self.now();
        while self.presses.front().is_some_and(|(tick, _, _)| *tick <= now) {
            let Some((_, agent, move_id)) = self.presses.pop_front() else {
                break;
            };
            if !self.world.is_alive(agent) {
                trace!(%agent, %move_id, "Press skipped, agent is down");
                continue;
            }
            if self.world.is_stunned(agent) {
                debug!(%agent, %move_id, "Press refused, agent is stunned");
                *self.refused.entry(agent).or_default() += 1;
                continue;
            }
            let _ = self.press(agent, &move_id);
        }

        self.world.tick();
        let report = self.scheduler.tick(&mut self.world);

        if self.hits_interrupt {
            let struck: Vec<AgentId> = report
                .agents
                .iter()
                .filter_map(|(_, agent)| agent.instance.as_ref())
                .flat_map(|instance| instance.hits.iter().map(|hit| hit.target))
                .collect();
            for target in struck {
                if self.scheduler.cancel(target) {
                    debug!(agent = %target, tick = report.tick, "Attack interrupted by hit");
                }
            }
        }

        for cue in self.bus.drain() {
            if let EffectCue::HitConfirmed { attacker, target, .. } = &cue {
                trace!(%attacker, %target, tick = cue.tick(), "Hit confirmed");
            }
            self.cues += 1;
        }
        report
    }

    /// Run `ticks` steps and report.
    pub fn run(&mut self, ticks: u64) -> SimSummary {
        info!(ticks, agents = self.world.bodies().count(), "Arena run starting");
        for _ in 0..ticks {
            self.step();
            if self.world.alive_count() <= 1 && self.presses.is_empty() && !self.any_active() {
                debug!(tick = self.now(), "Arena settled");
                break;
            }
        }
        let summary = self.summary();
        info!(
            ticks = summary.ticks,
            hits = summary.total_hits(),
            survivors = summary.survivors(),
            "Arena run finished"
        );
        summary
    }

    fn any_active(&self) -> bool {
        self.world.bodies().any(|(id, _)| self.scheduler.is_active(id))
    }

    /// Snapshot of the results so far.
    #[must_use]
    pub fn summary(&self) -> SimSummary {
        let agents = self
            .world
            .bodies()
            .map(|(id, body)| {
                let ledger = self.world.ledger(id);
                let stats = self.scheduler.agent(id).map(|a| *a.stats()).unwrap_or_default();
                AgentSummary {
                    id: id.raw(),
                    health: body.health,
                    alive: body.is_alive(),
                    damage_dealt: ledger.damage_dealt,
                    damage_taken: ledger.damage_taken,
                    hits_landed: ledger.hits_landed,
                    hits_taken: ledger.hits_taken,
                    kills: ledger.kills,
                    deaths: ledger.deaths,
                    attacks_started: stats.attacks_started,
                    attacks_completed: stats.attacks_completed,
                    attacks_cancelled: stats.attacks_cancelled,
                    presses_refused: self.refused.get(&id).copied().unwrap_or(0),
                    best_combo: stats.best_combo,
                }
            })
            .collect();

        SimSummary {
            ticks: self.now(),
            cues: self.cues,
            agents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArenaAgentConfig, Obstacle, ScriptedPress};
    use glam::Vec3;
    use tempest_combat::CombatConfig;
    use tempest_moves::standard_catalog;

    fn catalog() -> Arc<MoveCatalog> {
        Arc::new(standard_catalog(&CombatConfig::default()).expect("content is valid"))
    }

    fn press(tick: Tick, move_id: &str) -> ScriptedPress {
        ScriptedPress {
            tick,
            move_id: MoveId::new(move_id),
        }
    }

    fn duel(a: Vec<ScriptedPress>, b: Vec<ScriptedPress>, b_health: f32) -> SimConfig {
        SimConfig {
            ticks: 60,
            agents: vec![
                ArenaAgentConfig {
                    id: 1,
                    position: Vec3::ZERO,
                    facing: Vec3::Z,
                    presses: a,
                    ..ArenaAgentConfig::default()
                },
                ArenaAgentConfig {
                    id: 2,
                    position: Vec3::new(0.0, 0.0, 1.5),
                    facing: Vec3::NEG_Z,
                    health: b_health,
                    presses: b,
                    ..ArenaAgentConfig::default()
                },
            ],
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_hit_interrupts_and_stuns() {
        let config = duel(
            vec![press(0, "basic.slash")],
            vec![press(0, "basic.heavy"), press(6, "basic.slash")],
            100.0,
        );
        let mut sim = Simulation::new(&config, catalog());
        let summary = sim.run(config.ticks);

        let a = summary.agent(1).expect("present");
        let b = summary.agent(2).expect("present");
        assert_eq!(a.hits_landed, 1);
        assert!((b.damage_taken - 8.0).abs() < f32::EPSILON);
        assert_eq!(b.attacks_cancelled, 1);
        // the tick-6 press lands inside the stun
        assert_eq!(b.presses_refused, 1);
        assert!(summary.cues > 0);
    }

    #[test]
    fn test_without_interrupts_both_land() {
        let mut config = duel(vec![press(0, "basic.slash")], vec![press(0, "basic.heavy")], 100.0);
        config.hits_interrupt = false;
        let mut sim = Simulation::new(&config, catalog());
        let summary = sim.run(config.ticks);

        assert_eq!(summary.agent(2).map(|b| b.attacks_cancelled), Some(0));
        assert_eq!(summary.agent(2).map(|b| b.attacks_completed), Some(1));
    }

    #[test]
    fn test_defeated_agent_stops_pressing() {
        let config = duel(
            vec![press(0, "basic.slash")],
            vec![press(0, "basic.heavy"), press(30, "basic.slash")],
            5.0,
        );
        let mut sim = Simulation::new(&config, catalog());
        let summary = sim.run(config.ticks);

        let b = summary.agent(2).expect("present");
        assert!(!b.alive);
        assert_eq!(b.deaths, 1);
        assert_eq!(b.attacks_started, 1);
        assert_eq!(summary.agent(1).map(|a| a.kills), Some(1));
        assert_eq!(summary.survivors(), 1);
    }

    #[test]
    fn test_pillar_blocks_thrust() {
        let mut config = duel(vec![press(0, "stone.serpentinite")], Vec::new(), 100.0);
        config.agents[1].position = Vec3::new(0.0, 0.0, 2.0);
        config.agents[1].radius = 0.7;

        let open = Simulation::new(&config, catalog()).run(config.ticks);
        assert!(open.total_hits() > 0);

        config.obstacles.push(Obstacle {
            center: Vec3::new(0.0, 0.0, 1.0),
            radius: 0.3,
        });
        let blocked = Simulation::new(&config, catalog()).run(config.ticks);
        assert_eq!(blocked.total_hits(), 0);
    }

    #[test]
    fn test_unknown_move_is_counted() {
        let config = duel(vec![press(0, "no.such_move")], Vec::new(), 100.0);
        let mut sim = Simulation::new(&config, catalog());
        let summary = sim.run(5);
        assert_eq!(summary.agent(1).map(|a| a.presses_refused), Some(1));
        assert_eq!(summary.total_hits(), 0);
    }

    #[test]
    fn test_runs_are_deterministic() {
        let config = SimConfig::default();
        let first = Simulation::new(&config, catalog()).run(config.ticks);
        let second = Simulation::new(&config, catalog()).run(config.ticks);
        assert_eq!(first, second);
        assert!(first.total_hits() > 0);
    }
}
