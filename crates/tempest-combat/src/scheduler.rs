//! Per-agent attack scheduling.
//!
//! The [`AttackScheduler`] owns the simulation clock and every registered
//! [`CombatAgent`]. It resolves move IDs through the [`MoveCatalog`], enforces
//! one running attack per agent, and ticks agents in ascending ID order so a
//! replay with the same inputs produces the same hits.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tempest_common::{AgentId, CooldownCategory, MoveId, SimClock, Tick};
use tracing::{debug, info};

use crate::agent::{AgentTickReport, CombatAgent, Started};
use crate::catalog::MoveCatalog;
use crate::config::CombatConfig;
use crate::effects::{EffectPresentation, NoEffects};
use crate::error::StartError;
use crate::resource::{ResourceKind, ResourcePool};
use crate::world::CombatWorld;

/// Per-agent outcome of one scheduler tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulerTickReport {
    /// Tick that was simulated.
    pub tick: Tick,
    /// Agent reports in ascending ID order.
    pub agents: Vec<(AgentId, AgentTickReport)>,
}

impl SchedulerTickReport {
    /// Hits landed by all agents this tick.
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.agents.iter().map(|(_, r)| r.hit_count()).sum()
    }
}

/// Drives every agent's attacks.
pub struct AttackScheduler {
    catalog: Arc<MoveCatalog>,
    config: CombatConfig,
    agents: BTreeMap<AgentId, CombatAgent>,
    clock: SimClock,
    effects: Box<dyn EffectPresentation + Send>,
}

impl fmt::Debug for AttackScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttackScheduler")
            .field("moves", &self.catalog.len())
            .field("agents", &self.agents.len())
            .field("now", &self.clock.now())
            .finish_non_exhaustive()
    }
}

impl AttackScheduler {
    /// Create a scheduler at tick 0 with no agents and no presentation sink.
    #[must_use]
    pub fn new(catalog: Arc<MoveCatalog>, config: CombatConfig) -> Self {
        let mut config = config;
        config.validate();
        info!(moves = catalog.len(), "Attack scheduler initialized");
        Self {
            catalog,
            config,
            agents: BTreeMap::new(),
            clock: SimClock::new(),
            effects: Box::new(NoEffects),
        }
    }

    /// Send presentation cues to `effects`.
    #[must_use]
    pub fn with_effects(mut self, effects: impl EffectPresentation + Send + 'static) -> Self {
        self.effects = Box::new(effects);
        self
    }

    /// Register an agent with full pools (returns the existing one if present).
    pub fn add_agent(&mut self, id: AgentId) -> &mut CombatAgent {
        let config = &self.config;
        self.agents.entry(id).or_insert_with(|| {
            debug!(agent = %id, "Agent added");
            CombatAgent::new(id, config)
        })
    }

    /// Unregister an agent, dropping any running attack.
    pub fn remove_agent(&mut self, id: AgentId) -> Option<CombatAgent> {
        self.agents.remove(&id)
    }

    /// Current tick.
    #[must_use]
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    /// Move catalog.
    #[must_use]
    pub fn catalog(&self) -> &MoveCatalog {
        &self.catalog
    }

    /// Pool tuning applied to new agents.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Ask `agent` to start `move_id` on the current tick.
    pub fn try_start(&mut self, agent: AgentId, move_id: &MoveId) -> Result<Started, StartError> {
        let now = self.clock.now();
        let state = self
            .agents
            .get_mut(&agent)
            .ok_or(StartError::UnknownAgent(agent))?;
        let definition = self
            .catalog
            .get(move_id)
            .ok_or_else(|| StartError::UnknownMove(move_id.clone()))?;

        let result = state.try_start(&definition, now, self.effects.as_ref());
        if let Err(err) = &result {
            debug!(agent = %agent, %move_id, %err, "Start refused");
        }
        result
    }

    /// Advance the clock and tick every agent in ascending ID order.
    pub fn tick<W: CombatWorld + ?Sized>(&mut self, world: &mut W) -> SchedulerTickReport {
        let now = self.clock.advance();
        let effects = self.effects.as_ref();
        let mut report = SchedulerTickReport {
            tick: now,
            agents: Vec::with_capacity(self.agents.len()),
        };
        for (id, agent) in &mut self.agents {
            report.agents.push((*id, agent.tick(&mut *world, effects, now)));
        }
        report
    }

    /// Advance the clock without ticking agents.
    ///
    /// For hosts that tick agents themselves through [`Self::tick_agent`].
    pub fn advance_clock(&mut self) -> Tick {
        self.clock.advance()
    }

    /// Tick one agent on the current tick.
    pub fn tick_agent<W: CombatWorld + ?Sized>(&mut self, agent: AgentId, world: &mut W) -> Option<AgentTickReport> {
        let now = self.clock.now();
        let effects = self.effects.as_ref();
        self.agents
            .get_mut(&agent)
            .map(|state| state.tick(world, effects, now))
    }

    /// Cancel `agent`'s running attack. Returns false if nothing was running.
    pub fn cancel(&mut self, agent: AgentId) -> bool {
        let now = self.clock.now();
        let effects = self.effects.as_ref();
        self.agents
            .get_mut(&agent)
            .is_some_and(|state| state.cancel(now, effects))
    }

    /// Check if `agent` has a running attack.
    #[must_use]
    pub fn is_active(&self, agent: AgentId) -> bool {
        self.agents.get(&agent).is_some_and(CombatAgent::is_active)
    }

    /// Ticks until `agent` may start a move of `category` (0 when ready or unknown).
    #[must_use]
    pub fn cooldown_remaining(&self, agent: AgentId, category: CooldownCategory) -> Tick {
        let now = self.clock.now();
        self.agents
            .get(&agent)
            .map_or(0, |state| state.cooldown_remaining(category, now))
    }

    /// Current combo depth of `agent`.
    #[must_use]
    pub fn combo_depth(&self, agent: AgentId) -> u32 {
        self.agents.get(&agent).map_or(0, CombatAgent::combo_depth)
    }

    /// Pool of `kind` belonging to `agent`.
    #[must_use]
    pub fn pool(&self, agent: AgentId, kind: ResourceKind) -> Option<&ResourcePool> {
        self.agents.get(&agent).map(|state| state.pool(kind))
    }

    /// Refill `agent`'s pools (respawn). Returns false for unknown agents.
    pub fn restore_pools(&mut self, agent: AgentId) -> bool {
        self.agents
            .get_mut(&agent)
            .map(CombatAgent::restore_pools)
            .is_some()
    }

    /// State of one agent.
    #[must_use]
    pub fn agent(&self, agent: AgentId) -> Option<&CombatAgent> {
        self.agents.get(&agent)
    }

    /// Mutable state of one agent.
    pub fn agent_mut(&mut self, agent: AgentId) -> Option<&mut CombatAgent> {
        self.agents.get_mut(&agent)
    }

    /// All agents in ascending ID order.
    pub fn agents(&self) -> impl Iterator<Item = &CombatAgent> {
        self.agents.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AttackDefinition;
    use crate::effects::{EffectBus, EffectCue};
    use crate::hitbox::HitShape;
    use crate::instance::AttackPhase;
    use crate::world::MockWorld;
    use glam::Vec3;

    const HERO: AgentId = AgentId::from_raw(1);
    const FOE: AgentId = AgentId::from_raw(2);

    fn catalog() -> Arc<MoveCatalog> {
        let mut catalog = MoveCatalog::with_capacity_limits(&CombatConfig::default());
        catalog
            .register(
                AttackDefinition::builder("slash")
                    .timing(3, 13, 4)
                    .cost(ResourceKind::Stamina, 10.0)
                    .shape(HitShape::sphere(1.5))
                    .build()
                    .expect("valid"),
            )
            .expect("registered");

        let finisher = AttackDefinition::builder("finisher")
            .timing(0, 0, 0)
            .build_shared()
            .expect("valid");
        catalog
            .register(
                AttackDefinition::builder("opener")
                    .timing(0, 0, 0)
                    .follow_up(finisher, 20)
                    .build()
                    .expect("valid"),
            )
            .expect("registered");

        catalog
            .register(
                AttackDefinition::builder("technique")
                    .timing(0, 0, 0)
                    .cooldown(10, CooldownCategory::TECHNIQUE)
                    .build()
                    .expect("valid"),
            )
            .expect("registered");
        catalog
            .register(
                AttackDefinition::builder("technique.alt")
                    .timing(0, 0, 0)
                    .cooldown(4, CooldownCategory::TECHNIQUE)
                    .build()
                    .expect("valid"),
            )
            .expect("registered");
        Arc::new(catalog)
    }

    fn setup() -> (AttackScheduler, MockWorld) {
        let mut scheduler = AttackScheduler::new(catalog(), CombatConfig::default());
        scheduler.add_agent(HERO);
        scheduler.add_agent(FOE);

        let mut world = MockWorld::new();
        world.place(HERO, Vec3::ZERO, Vec3::Z, 0.5);
        world.place(FOE, Vec3::new(0.0, 0.0, 2.0), -Vec3::Z, 0.5);
        (scheduler, world)
    }

    fn id(name: &str) -> MoveId {
        MoveId::new(name)
    }

    #[test]
    fn test_full_attack_with_exact_stamina() {
        let (mut scheduler, mut world) = setup();
        scheduler
            .agent_mut(HERO)
            .expect("registered")
            .pool_mut(ResourceKind::Stamina)
            .set_current(10.0);

        scheduler.try_start(HERO, &id("slash")).expect("affordable");
        let stamina = scheduler.pool(HERO, ResourceKind::Stamina).expect("registered");
        assert_eq!(stamina.current(), 0.0);

        let mut hit_ticks = Vec::new();
        let mut end_tick = None;
        for _ in 0..20 {
            let report = scheduler.tick(&mut world);
            if report.hit_count() > 0 {
                hit_ticks.push(report.tick);
            }
            if report.agents.iter().any(|(_, r)| r.ended.is_some()) {
                end_tick = Some(report.tick);
            }
        }

        assert_eq!(hit_ticks, vec![3]);
        assert_eq!(end_tick, Some(20));
        assert!(!scheduler.is_active(HERO));
    }

    #[test]
    fn test_insufficient_stamina() {
        let (mut scheduler, _) = setup();
        scheduler
            .agent_mut(HERO)
            .expect("registered")
            .pool_mut(ResourceKind::Stamina)
            .set_current(5.0);

        let err = scheduler.try_start(HERO, &id("slash")).unwrap_err();
        assert_eq!(
            err,
            StartError::InsufficientResource {
                kind: ResourceKind::Stamina,
                required: 10.0,
                available: 5.0,
            }
        );
        assert!(err.is_transient());
        assert!(!scheduler.is_active(HERO));
        let stamina = scheduler.pool(HERO, ResourceKind::Stamina).expect("registered");
        assert_eq!(stamina.current(), 5.0);
    }

    #[test]
    fn test_unknown_identities() {
        let (mut scheduler, _) = setup();
        assert_eq!(
            scheduler.try_start(AgentId::from_raw(99), &id("slash")),
            Err(StartError::UnknownAgent(AgentId::from_raw(99)))
        );
        assert_eq!(
            scheduler.try_start(HERO, &id("nope")),
            Err(StartError::UnknownMove(id("nope")))
        );
    }

    #[test]
    fn test_one_attack_at_a_time() {
        let (mut scheduler, mut world) = setup();
        scheduler.try_start(HERO, &id("slash")).expect("ready");

        for _ in 0..19 {
            scheduler.tick(&mut world);
            assert!(matches!(
                scheduler.try_start(HERO, &id("opener")),
                Err(StartError::AlreadyActive { .. })
            ));
        }
        scheduler.tick(&mut world);
        assert!(scheduler.try_start(HERO, &id("opener")).is_ok());
    }

    #[test]
    fn test_follow_up_two_ticks_later() {
        let (mut scheduler, mut world) = setup();
        let first = scheduler.try_start(HERO, &id("opener")).expect("ready");
        assert_eq!(first.combo_depth, 0);

        scheduler.tick(&mut world);
        scheduler.tick(&mut world);
        assert_eq!(scheduler.now(), 2);

        let second = scheduler.try_start(HERO, &id("opener")).expect("ready");
        assert!(second.substituted);
        assert_eq!(second.move_id, id("finisher"));
        assert_eq!(second.requested, id("opener"));
        assert_eq!(second.combo_depth, 1);
        assert_eq!(scheduler.combo_depth(HERO), 1);
    }

    fn start_after(ticks_after_completion: u64) -> Started {
        let (mut scheduler, mut world) = setup();
        scheduler.try_start(HERO, &id("opener")).expect("ready");
        // completes on tick 1
        for _ in 0..=ticks_after_completion {
            scheduler.tick(&mut world);
        }
        scheduler.try_start(HERO, &id("opener")).expect("ready")
    }

    #[test]
    fn test_follow_up_window_boundary() {
        let at_window = start_after(20);
        assert!(at_window.substituted);
        assert_eq!(at_window.combo_depth, 1);

        let past_window = start_after(21);
        assert!(!past_window.substituted);
        assert_eq!(past_window.move_id, id("opener"));
        assert_eq!(past_window.combo_depth, 0);
    }

    #[test]
    fn test_category_cooldown() {
        let (mut scheduler, mut world) = setup();
        scheduler.try_start(HERO, &id("technique")).expect("ready");
        scheduler.tick(&mut world);

        assert_eq!(
            scheduler.try_start(HERO, &id("technique")),
            Err(StartError::OnCooldown {
                category: CooldownCategory::TECHNIQUE,
                remaining: 9,
            })
        );
        assert_eq!(scheduler.cooldown_remaining(HERO, CooldownCategory::TECHNIQUE), 9);
        assert_eq!(scheduler.cooldown_remaining(HERO, CooldownCategory::BASIC), 0);
        // other categories are unaffected
        assert!(scheduler.try_start(HERO, &id("slash")).is_ok());
        assert!(scheduler.cancel(HERO));

        while scheduler.now() < 10 {
            scheduler.tick(&mut world);
        }
        assert!(scheduler.try_start(HERO, &id("technique")).is_ok());
    }

    #[test]
    fn test_category_cooldown_blocks_sibling_moves() {
        let (mut scheduler, mut world) = setup();
        scheduler.try_start(HERO, &id("technique")).expect("ready");
        scheduler.tick(&mut world);

        // a different move in the same category shares the window
        assert_eq!(
            scheduler.try_start(HERO, &id("technique.alt")),
            Err(StartError::OnCooldown {
                category: CooldownCategory::TECHNIQUE,
                remaining: 9,
            })
        );
        assert_eq!(scheduler.agent(HERO).map(|a| a.stats().attacks_started), Some(1));

        while scheduler.now() < 10 {
            scheduler.tick(&mut world);
        }
        assert!(scheduler.try_start(HERO, &id("technique.alt")).is_ok());
        scheduler.tick(&mut world);
        assert_eq!(scheduler.cooldown_remaining(HERO, CooldownCategory::TECHNIQUE), 3);
    }

    #[test]
    fn test_cancel_emits_cue() {
        let bus = EffectBus::new(16);
        let sender = bus.sender();
        let (scheduler, mut world) = setup();
        let mut scheduler = scheduler.with_effects(sender);

        scheduler.try_start(HERO, &id("slash")).expect("ready");
        scheduler.tick(&mut world);
        assert!(scheduler.cancel(HERO));
        assert!(!scheduler.cancel(HERO));

        let cues = bus.drain();
        assert!(matches!(cues.first(), Some(EffectCue::AttackStarted { .. })));
        assert!(matches!(cues.last(), Some(EffectCue::AttackCancelled { tick: 1, .. })));
        assert!(scheduler.agent(HERO).and_then(|a| a.active()).is_none());
    }

    #[test]
    fn test_replay_is_deterministic() {
        let run = || {
            let (mut scheduler, mut world) = setup();
            scheduler.try_start(HERO, &id("slash")).expect("ready");
            scheduler.try_start(FOE, &id("slash")).expect("ready");
            for _ in 0..25 {
                scheduler.tick(&mut world);
            }
            world.hits
        };
        let first = run();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].attacker, HERO);
        assert_eq!(first, run());
    }

    #[test]
    fn test_manual_agent_ticking() {
        let (mut scheduler, mut world) = setup();
        scheduler.try_start(HERO, &id("slash")).expect("ready");
        for _ in 0..3 {
            scheduler.advance_clock();
            scheduler.tick_agent(HERO, &mut world);
        }
        let phase = scheduler
            .agent(HERO)
            .and_then(|a| a.active())
            .map(|i| i.phase());
        assert_eq!(phase, Some(AttackPhase::Active));
        assert!(scheduler.tick_agent(AgentId::from_raw(42), &mut world).is_none());
    }

    #[test]
    fn test_restore_and_remove() {
        let (mut scheduler, _) = setup();
        scheduler.try_start(HERO, &id("slash")).expect("ready");
        assert!(scheduler.restore_pools(HERO));
        assert!(scheduler
            .pool(HERO, ResourceKind::Stamina)
            .is_some_and(ResourcePool::is_full));

        assert!(scheduler.remove_agent(HERO).is_some());
        assert!(!scheduler.restore_pools(HERO));
        assert!(!scheduler.is_active(HERO));
    }
}
