//! Per-agent combat state.
//!
//! A [`CombatAgent`] owns everything one agent needs to attack: its pools,
//! combo and cooldown state, and at most one running [`AttackInstance`].
//! Agents share nothing, so hosts that schedule agents themselves may tick
//! them independently.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tempest_common::{AgentId, CooldownCategory, MoveId, Tick};
use tracing::debug;

use crate::combo::ComboController;
use crate::config::CombatConfig;
use crate::cooldown::CooldownTracker;
use crate::definition::AttackDefinition;
use crate::effects::{EffectCue, EffectPresentation};
use crate::error::{InstanceStartError, StartError};
use crate::instance::{AttackInstance, EndReason, InstanceTickReport};
use crate::resource::{ResourceKind, ResourcePool};
use crate::world::CombatWorld;

/// A successful start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    /// Move that actually started.
    pub move_id: MoveId,
    /// Move that was requested.
    pub requested: MoveId,
    /// Combo depth of the started move (0 for a fresh attack).
    pub combo_depth: u32,
    /// Whether a pending follow-up replaced the request.
    pub substituted: bool,
}

/// Lifetime counters for one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCombatStats {
    /// Attacks started.
    pub attacks_started: u32,
    /// Attacks that ran through recovery.
    pub attacks_completed: u32,
    /// Attacks cancelled.
    pub attacks_cancelled: u32,
    /// Hits applied to targets.
    pub hits_landed: u32,
    /// Deepest combo reached.
    pub best_combo: u32,
}

/// What happened to one agent during a tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentTickReport {
    /// Report of the active instance, if one ticked.
    pub instance: Option<InstanceTickReport>,
    /// Set when the active instance ended this tick.
    pub ended: Option<EndReason>,
}

impl AgentTickReport {
    /// Hits landed this tick.
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.instance.as_ref().map_or(0, |r| r.hits.len())
    }
}

/// Combat state of one agent.
#[derive(Debug, Clone)]
pub struct CombatAgent {
    id: AgentId,
    stamina: ResourcePool,
    breath: ResourcePool,
    combo: ComboController,
    cooldowns: CooldownTracker,
    active: Option<AttackInstance>,
    last_start_tick: Option<Tick>,
    stats: AgentCombatStats,
}

impl CombatAgent {
    /// Create an agent with full pools.
    #[must_use]
    pub fn new(id: AgentId, config: &CombatConfig) -> Self {
        Self {
            id,
            stamina: ResourcePool::new(ResourceKind::Stamina, config.stamina),
            breath: ResourcePool::new(ResourceKind::Breath, config.breath),
            combo: ComboController::new(),
            cooldowns: CooldownTracker::new(),
            active: None,
            last_start_tick: None,
            stats: AgentCombatStats::default(),
        }
    }

    /// Agent ID.
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Try to start `requested` (or the pending follow-up) on tick `now`.
    ///
    /// Checks run in order: already attacking, cooldown, resource. A refused
    /// start changes nothing, including the pending follow-up.
    pub fn try_start(
        &mut self,
        requested: &Arc<AttackDefinition>,
        now: Tick,
        effects: &dyn EffectPresentation,
    ) -> Result<Started, StartError> {
        if let Some(active) = self.active.as_ref().filter(|a| a.phase().is_running()) {
            return Err(StartError::AlreadyActive {
                active: active.definition().id().clone(),
            });
        }

        let resolution = self.combo.preview(requested, now);
        let definition = Arc::clone(&resolution.definition);

        let category = definition.cooldown_category();
        let remaining = self.cooldowns.remaining(category, now);
        if remaining > 0 {
            return Err(StartError::OnCooldown {
                category,
                remaining,
            });
        }

        let mut instance = AttackInstance::new(Arc::clone(&definition), self.id);
        let pool = self.pool_mut(definition.resource());
        instance.start(pool, now).map_err(|err| match err {
            InstanceStartError::InsufficientResource {
                kind,
                required,
                available,
            } => StartError::InsufficientResource {
                kind,
                required,
                available,
            },
            InstanceStartError::AlreadyStarted { .. } => StartError::AlreadyActive {
                active: definition.id().clone(),
            },
        })?;

        self.cooldowns
            .record_start(category, definition.id().clone(), definition.cooldown(), now);
        self.combo.commit(&resolution);
        self.active = Some(instance);
        self.last_start_tick = Some(now);
        self.stats.attacks_started += 1;
        self.stats.best_combo = self.stats.best_combo.max(resolution.combo_depth);

        debug!(
            agent = %self.id,
            move_id = %definition.id(),
            requested = %requested.id(),
            combo_depth = resolution.combo_depth,
            "Agent started attack"
        );
        effects.present(EffectCue::AttackStarted {
            agent: self.id,
            move_id: definition.id().clone(),
            combo_depth: resolution.combo_depth,
            tick: now,
        });

        Ok(Started {
            move_id: definition.id().clone(),
            requested: requested.id().clone(),
            combo_depth: resolution.combo_depth,
            substituted: resolution.substituted,
        })
    }

    /// Advance one tick: regen pools, tick the active attack, expire the combo window.
    pub fn tick<W: CombatWorld + ?Sized>(
        &mut self,
        world: &mut W,
        effects: &dyn EffectPresentation,
        now: Tick,
    ) -> AgentTickReport {
        self.stamina.tick();
        self.breath.tick();

        let mut report = AgentTickReport::default();
        if let Some(instance) = self.active.as_mut() {
            let instance_report = instance.tick(world, effects, now);
            self.stats.hits_landed += instance_report.hits.len() as u32;
            report.instance = Some(instance_report);

            if instance.is_finished() {
                let reason = instance.end_reason().unwrap_or(EndReason::Completed);
                match reason {
                    EndReason::Completed => {
                        self.combo.record_completion(instance.definition(), now);
                        self.stats.attacks_completed += 1;
                    },
                    EndReason::Cancelled => {
                        self.combo.reset();
                        self.stats.attacks_cancelled += 1;
                    },
                }
                report.ended = Some(reason);
                self.active = None;
            }
        }

        self.combo.expire(now);
        report
    }

    /// Cancel the active attack. Returns false if nothing was running.
    pub fn cancel(&mut self, now: Tick, effects: &dyn EffectPresentation) -> bool {
        let Some(mut instance) = self.active.take() else {
            return false;
        };
        if !instance.cancel() {
            return false;
        }

        debug!(agent = %self.id, move_id = %instance.definition().id(), "Attack cancelled");
        effects.present(EffectCue::AttackCancelled {
            agent: self.id,
            move_id: instance.definition().id().clone(),
            tick: now,
        });
        self.combo.reset();
        self.stats.attacks_cancelled += 1;
        true
    }

    /// Check if an attack is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.phase().is_running())
    }

    /// Running attack, if any.
    #[must_use]
    pub fn active(&self) -> Option<&AttackInstance> {
        self.active.as_ref()
    }

    /// Ticks until `category` is ready.
    #[must_use]
    pub fn cooldown_remaining(&self, category: CooldownCategory, now: Tick) -> Tick {
        self.cooldowns.remaining(category, now)
    }

    /// Current combo depth.
    #[must_use]
    pub fn combo_depth(&self) -> u32 {
        self.combo.combo_depth()
    }

    /// Combo state.
    #[must_use]
    pub fn combo(&self) -> &ComboController {
        &self.combo
    }

    /// Tick of the last successful start.
    #[must_use]
    pub fn last_start_tick(&self) -> Option<Tick> {
        self.last_start_tick
    }

    /// Pool of `kind`.
    #[must_use]
    pub fn pool(&self, kind: ResourceKind) -> &ResourcePool {
        match kind {
            ResourceKind::Stamina => &self.stamina,
            ResourceKind::Breath => &self.breath,
        }
    }

    /// Mutable pool of `kind`.
    pub fn pool_mut(&mut self, kind: ResourceKind) -> &mut ResourcePool {
        match kind {
            ResourceKind::Stamina => &mut self.stamina,
            ResourceKind::Breath => &mut self.breath,
        }
    }

    /// Refill both pools (respawn).
    pub fn restore_pools(&mut self) {
        self.stamina.restore_full();
        self.breath.restore_full();
    }

    /// Lifetime counters.
    #[must_use]
    pub fn stats(&self) -> &AgentCombatStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectBus, NoEffects};
    use crate::hitbox::HitShape;
    use crate::world::MockWorld;
    use glam::Vec3;

    const ME: AgentId = AgentId::from_raw(1);

    fn agent() -> CombatAgent {
        CombatAgent::new(ME, &CombatConfig::default())
    }

    fn world() -> MockWorld {
        let mut world = MockWorld::new();
        world.place(ME, Vec3::ZERO, Vec3::Z, 0.5);
        world.place(AgentId::from_raw(2), Vec3::new(0.0, 0.0, 2.0), -Vec3::Z, 0.5);
        world
    }

    fn quick(id: &str) -> AttackDefinition {
        AttackDefinition::builder(id)
            .timing(1, 1, 1)
            .shape(HitShape::sphere(1.5))
            .build()
            .expect("valid")
    }

    #[test]
    fn test_start_and_complete() {
        let mut agent = agent();
        let mut world = world();
        let bus = EffectBus::new(32);
        let def = Arc::new(quick("slash"));

        let started = agent.try_start(&def, 0, &bus).expect("ready");
        assert_eq!(started.move_id.as_str(), "slash");
        assert_eq!(started.combo_depth, 0);
        assert!(agent.is_active());

        let mut ended = None;
        for now in 1..=3 {
            ended = agent.tick(&mut world, &bus, now).ended.or(ended);
        }
        assert_eq!(ended, Some(EndReason::Completed));
        assert!(!agent.is_active());
        assert_eq!(agent.stats().attacks_completed, 1);
        assert_eq!(agent.stats().hits_landed, 1);
        assert!(matches!(bus.drain().first(), Some(EffectCue::AttackStarted { .. })));
    }

    #[test]
    fn test_already_active() {
        let mut agent = agent();
        let def = Arc::new(quick("slash"));
        agent.try_start(&def, 0, &NoEffects).expect("ready");

        let err = agent.try_start(&def, 0, &NoEffects).unwrap_err();
        assert_eq!(
            err,
            StartError::AlreadyActive {
                active: MoveId::new("slash")
            }
        );
    }

    #[test]
    fn test_refused_start_keeps_follow_up() {
        let mut agent = agent();
        let mut world = world();
        let costly = AttackDefinition::builder("costly")
            .timing(0, 0, 0)
            .cost(ResourceKind::Breath, 80.0)
            .build_shared()
            .expect("valid");
        let opener = AttackDefinition::builder("opener")
            .timing(0, 0, 0)
            .follow_up(costly, 10)
            .build_shared()
            .expect("valid");

        agent.try_start(&opener, 0, &NoEffects).expect("ready");
        agent.tick(&mut world, &NoEffects, 1);
        agent.pool_mut(ResourceKind::Breath).set_current(10.0);

        let err = agent.try_start(&opener, 2, &NoEffects).unwrap_err();
        assert!(matches!(err, StartError::InsufficientResource { .. }));
        assert!(agent.combo().pending_follow_up().is_some());
        assert_eq!(agent.pool(ResourceKind::Breath).current(), 10.0);
    }

    #[test]
    fn test_cancel_resets_combo() {
        let mut agent = agent();
        let bus = EffectBus::new(8);
        let def = Arc::new(quick("slash"));

        assert!(!agent.cancel(0, &bus));
        agent.try_start(&def, 0, &bus).expect("ready");
        assert!(agent.cancel(1, &bus));
        assert!(!agent.is_active());
        assert_eq!(agent.combo_depth(), 0);
        assert_eq!(agent.stats().attacks_cancelled, 1);
        assert!(matches!(bus.drain().last(), Some(EffectCue::AttackCancelled { .. })));
    }

    #[test]
    fn test_pools_regen_and_restore() {
        let mut agent = agent();
        let mut world = world();
        let def = AttackDefinition::builder("heavy")
            .timing(0, 0, 0)
            .cost(ResourceKind::Stamina, 40.0)
            .build_shared()
            .expect("valid");

        agent.try_start(&def, 0, &NoEffects).expect("ready");
        assert_eq!(agent.pool(ResourceKind::Stamina).current(), 60.0);

        for now in 1..=30 {
            agent.tick(&mut world, &NoEffects, now);
        }
        assert!(agent.pool(ResourceKind::Stamina).current() > 60.0);

        agent.restore_pools();
        assert!(agent.pool(ResourceKind::Stamina).is_full());
    }
}
