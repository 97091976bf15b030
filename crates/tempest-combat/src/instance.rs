//! One execution of an attack definition.
//!
//! An [`AttackInstance`] walks `Idle -> Startup -> Active -> Recovery -> Ended`
//! one tick at a time, spawning hitboxes during `Active` and resolving them
//! against the host world. Phases never go backwards.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tempest_common::{AgentId, Tick};
use tracing::{debug, trace};

use crate::definition::{AttackDefinition, StrikeMode};
use crate::effects::{EffectCue, EffectPresentation};
use crate::error::InstanceStartError;
use crate::hit_registry::HitRegistry;
use crate::hitbox::{Hitbox, HitboxPlacement};
use crate::resource::ResourcePool;
use crate::world::{CombatWorld, HitEvent, Pose};

/// Lifecycle phase of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttackPhase {
    /// Created, not started.
    Idle,
    /// Windup.
    Startup,
    /// Hitboxes live and resolving.
    Active,
    /// Cooldown animation, no hits.
    Recovery,
    /// Terminal.
    Ended,
}

impl AttackPhase {
    /// Check if hits can land in this phase.
    #[must_use]
    pub fn can_damage(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Check if the attack is over.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Ended)
    }

    /// Check if the attack is started and not yet over.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Startup | Self::Active | Self::Recovery)
    }
}

/// Why an attack reached `Ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Recovery ran out.
    Completed,
    /// Cut short by [`AttackInstance::cancel`] or a vanished owner.
    Cancelled,
}

/// What happened during one [`AttackInstance::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceTickReport {
    /// Phase at the start of the tick.
    pub phase_before: Option<AttackPhase>,
    /// Phase at the end of the tick.
    pub phase_after: Option<AttackPhase>,
    /// Hitboxes spawned this tick.
    pub hitboxes_spawned: u32,
    /// Hits applied this tick, in resolution order.
    pub hits: Vec<HitEvent>,
}

impl InstanceTickReport {
    /// Check if the phase changed this tick.
    #[must_use]
    pub fn transitioned(&self) -> bool {
        self.phase_before != self.phase_after
    }

    /// Check if the attack ended this tick.
    #[must_use]
    pub fn ended(&self) -> bool {
        self.transitioned() && self.phase_after == Some(AttackPhase::Ended)
    }
}

/// A running attack owned by one agent.
#[derive(Debug, Clone)]
pub struct AttackInstance {
    definition: Arc<AttackDefinition>,
    owner: AgentId,
    phase: AttackPhase,
    /// Ticks since start.
    current_tick: u32,
    /// Value of `current_tick` when the current phase was entered.
    phase_started: u32,
    started_at: Option<Tick>,
    hitboxes: Vec<Hitbox>,
    registry: HitRegistry,
    hitboxes_spawned: u32,
    last_spawn_tick: u32,
    end_reason: Option<EndReason>,
}

impl AttackInstance {
    /// Create an idle instance of `definition` owned by `owner`.
    #[must_use]
    pub fn new(definition: Arc<AttackDefinition>, owner: AgentId) -> Self {
        let registry = HitRegistry::new(definition.max_hits_per_target());
        Self {
            definition,
            owner,
            phase: AttackPhase::Idle,
            current_tick: 0,
            phase_started: 0,
            started_at: None,
            hitboxes: Vec::new(),
            registry,
            hitboxes_spawned: 0,
            last_spawn_tick: 0,
            end_reason: None,
        }
    }

    /// Pay the cost from `pool` and enter `Startup`.
    ///
    /// An `Ended` instance may be started again from scratch. On error nothing
    /// changes: the phase stays where it was and the pool is untouched.
    pub fn start(&mut self, pool: &mut ResourcePool, now: Tick) -> Result<(), InstanceStartError> {
        if self.phase.is_running() {
            return Err(InstanceStartError::AlreadyStarted { phase: self.phase });
        }
        let cost = self.definition.resource_cost();
        if !pool.consume(cost) {
            return Err(InstanceStartError::InsufficientResource {
                kind: pool.kind(),
                required: cost,
                available: pool.current(),
            });
        }

        self.phase = AttackPhase::Startup;
        self.current_tick = 0;
        self.phase_started = 0;
        self.started_at = Some(now);
        self.hitboxes.clear();
        self.registry.clear();
        self.hitboxes_spawned = 0;
        self.last_spawn_tick = 0;
        self.end_reason = None;
        debug!(
            owner = %self.owner,
            move_id = %self.definition.id(),
            cost,
            "Attack started"
        );
        Ok(())
    }

    /// Advance one tick: age hitboxes, evaluate phase transitions, resolve hits.
    pub fn tick<W: CombatWorld + ?Sized>(
        &mut self,
        world: &mut W,
        effects: &dyn EffectPresentation,
        now: Tick,
    ) -> InstanceTickReport {
        let mut report = InstanceTickReport {
            phase_before: Some(self.phase),
            phase_after: Some(self.phase),
            ..Default::default()
        };
        if !self.phase.is_running() {
            return report;
        }

        let Some(pose) = world.pose(self.owner) else {
            debug!(owner = %self.owner, move_id = %self.definition.id(), "Owner vanished, cancelling attack");
            if self.cancel() {
                effects.present(EffectCue::AttackCancelled {
                    agent: self.owner,
                    move_id: self.definition.id().clone(),
                    tick: now,
                });
            }
            report.phase_after = Some(self.phase);
            return report;
        };

        self.current_tick = self.current_tick.saturating_add(1);
        for hitbox in &mut self.hitboxes {
            hitbox.advance(Some(&pose));
        }
        self.hitboxes.retain(|h| !h.is_expired());

        let timing = self.definition.timing();
        let active_end = timing.startup.saturating_add(timing.active);
        let recovery_end = active_end.saturating_add(timing.recovery);

        if self.phase == AttackPhase::Startup && self.current_tick >= timing.startup {
            self.enter(AttackPhase::Active);
            self.spawn_hitbox(&pose, effects, now);
            report.hitboxes_spawned += 1;
        }

        if self.phase == AttackPhase::Active {
            let entry_tick = self.current_tick == self.phase_started;
            // the entry tick always gets one hit-check, even for a zero-length window
            if entry_tick || self.current_tick < active_end {
                if !entry_tick && self.blitz_spawn_due() {
                    self.spawn_hitbox(&pose, effects, now);
                    report.hitboxes_spawned += 1;
                }
                report.hits = self.resolve_hits(world, &pose, effects, now);
            }
            if self.current_tick >= active_end {
                self.enter(AttackPhase::Recovery);
                for hitbox in &mut self.hitboxes {
                    if hitbox.lifetime().is_none() {
                        hitbox.expire();
                    }
                }
                self.hitboxes.retain(|h| !h.is_expired());
            }
        }

        if self.phase == AttackPhase::Recovery && self.current_tick >= recovery_end {
            self.enter(AttackPhase::Ended);
            self.hitboxes.clear();
            self.end_reason = Some(EndReason::Completed);
            effects.present(EffectCue::AttackEnded {
                agent: self.owner,
                move_id: self.definition.id().clone(),
                tick: now,
            });
        }

        report.phase_after = Some(self.phase);
        report
    }

    /// Force `Ended` without firing further hits. Returns false if not running.
    pub fn cancel(&mut self) -> bool {
        if !self.phase.is_running() {
            return false;
        }
        self.enter(AttackPhase::Ended);
        self.hitboxes.clear();
        self.end_reason = Some(EndReason::Cancelled);
        true
    }

    fn enter(&mut self, phase: AttackPhase) {
        debug!(
            owner = %self.owner,
            move_id = %self.definition.id(),
            from = ?self.phase,
            to = ?phase,
            tick = self.current_tick,
            "Attack phase transition"
        );
        self.phase = phase;
        self.phase_started = self.current_tick;
    }

    fn blitz_spawn_due(&self) -> bool {
        match self.definition.strike() {
            StrikeMode::Blitz {
                spawn_interval,
                max_hitboxes,
            } => {
                self.hitboxes_spawned < max_hitboxes
                    && self.current_tick - self.last_spawn_tick >= spawn_interval
            },
            StrikeMode::Single | StrikeMode::Persistent => false,
        }
    }

    fn spawn_hitbox(&mut self, pose: &Pose, effects: &dyn EffectPresentation, now: Tick) {
        let def = &self.definition;
        let lifetime = match def.strike() {
            StrikeMode::Single => Some(1),
            StrikeMode::Persistent | StrikeMode::Blitz { .. } => def.hitbox().lifetime,
        };
        let placement = HitboxPlacement {
            index: self.hitboxes_spawned,
            forward_offset: def.hitbox_forward_offset(),
            lifetime,
            knockback: def.knockback_for(self.hitboxes_spawned),
        };
        let hitbox = Hitbox::spawn(def.hitbox(), placement, pose, now);

        trace!(
            owner = %self.owner,
            move_id = %def.id(),
            index = hitbox.index(),
            "Hitbox spawned"
        );
        effects.present(EffectCue::HitboxSpawned {
            agent: self.owner,
            move_id: def.id().clone(),
            index: hitbox.index(),
            position: hitbox.volume().center,
            tick: now,
        });

        self.hitboxes.push(hitbox);
        self.hitboxes_spawned += 1;
        self.last_spawn_tick = self.current_tick;
    }

    fn resolve_hits<W: CombatWorld + ?Sized>(
        &mut self,
        world: &mut W,
        attacker: &Pose,
        effects: &dyn EffectPresentation,
        now: Tick,
    ) -> Vec<HitEvent> {
        let def = Arc::clone(&self.definition);
        let filter = def.target_filter();
        let mut hits = Vec::new();

        for slot in 0..self.hitboxes.len() {
            let (volume, index, mode) = {
                let hitbox = &self.hitboxes[slot];
                if hitbox.is_expired() {
                    continue;
                }
                (*hitbox.volume(), hitbox.index(), hitbox.knockback())
            };

            for target in world.query_overlapping(&volume, self.owner) {
                if target == self.owner
                    || !self.hitboxes[slot].can_strike(target, now)
                    || !self.registry.can_hit(target)
                {
                    continue;
                }
                let Some(target_pose) = world.pose(target) else {
                    trace!(%target, "Candidate has no pose, skipping");
                    continue;
                };
                if !filter.accepts(&*world, attacker, target_pose.position) {
                    continue;
                }

                let hit = HitEvent {
                    attacker: self.owner,
                    target,
                    move_id: def.id().clone(),
                    damage: def.damage(),
                    knockback: mode.vector(
                        def.knockback(),
                        attacker,
                        volume.center,
                        target_pose.position,
                    ),
                    hit_stun: def.hit_stun(),
                    position: volume.center,
                    hitbox_index: index,
                    tick: now,
                };

                match world.apply_hit(&hit) {
                    Ok(()) => {
                        self.registry.record(target);
                        self.hitboxes[slot].record_strike(target, now);
                        trace!(
                            attacker = %self.owner,
                            %target,
                            move_id = %def.id(),
                            damage = hit.damage,
                            hitbox = index,
                            "Hit confirmed"
                        );
                        effects.present(EffectCue::HitConfirmed {
                            attacker: self.owner,
                            target,
                            move_id: def.id().clone(),
                            position: volume.center,
                            tick: now,
                        });
                        hits.push(hit);
                    },
                    Err(err) => {
                        trace!(attacker = %self.owner, %err, "Hit not applied");
                    },
                }
            }
        }

        hits
    }

    /// Definition being executed.
    #[must_use]
    pub fn definition(&self) -> &Arc<AttackDefinition> {
        &self.definition
    }

    /// Owning agent.
    #[must_use]
    pub fn owner(&self) -> AgentId {
        self.owner
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    /// Ticks since start.
    #[must_use]
    pub fn current_tick(&self) -> u32 {
        self.current_tick
    }

    /// Tick `start` succeeded on.
    #[must_use]
    pub fn started_at(&self) -> Option<Tick> {
        self.started_at
    }

    /// Why the attack ended, once it has.
    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Live hitboxes.
    #[must_use]
    pub fn hitboxes(&self) -> &[Hitbox] {
        &self.hitboxes
    }

    /// Hitboxes spawned so far.
    #[must_use]
    pub fn hitboxes_spawned(&self) -> u32 {
        self.hitboxes_spawned
    }

    /// Per-target hit bookkeeping.
    #[must_use]
    pub fn registry(&self) -> &HitRegistry {
        &self.registry
    }

    /// Hits landed so far.
    #[must_use]
    pub fn hits_landed(&self) -> u32 {
        self.registry.total_hits()
    }

    /// Check if the attack is over.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{KnockbackMode, TargetFilter};
    use crate::effects::{EffectBus, NoEffects};
    use crate::hitbox::{HitShape, HitboxSpec};
    use crate::resource::{PoolConfig, ResourceKind};
    use crate::world::MockWorld;
    use glam::Vec3;
    use proptest::prelude::*;

    const OWNER: AgentId = AgentId::from_raw(1);
    const TARGET: AgentId = AgentId::from_raw(2);

    fn pool(current: f32) -> ResourcePool {
        ResourcePool::new(ResourceKind::Stamina, PoolConfig::stamina()).with_current(current)
    }

    fn arena() -> MockWorld {
        let mut world = MockWorld::new();
        world.place(OWNER, Vec3::ZERO, Vec3::Z, 0.5);
        world.place(TARGET, Vec3::new(0.0, 0.0, 2.0), -Vec3::Z, 0.5);
        world
    }

    fn sphere_move(id: &str) -> crate::definition::AttackDefinitionBuilder {
        AttackDefinition::builder(id).shape(HitShape::sphere(1.5))
    }

    fn run(instance: &mut AttackInstance, world: &mut MockWorld, ticks: Tick) -> Vec<InstanceTickReport> {
        (1..=ticks)
            .map(|now| instance.tick(world, &NoEffects, now))
            .collect()
    }

    #[test]
    fn test_single_strike_lifecycle() {
        let def = sphere_move("slash")
            .timing(3, 13, 4)
            .cost(ResourceKind::Stamina, 10.0)
            .build_shared()
            .expect("valid");
        let mut world = arena();
        let mut pool = pool(10.0);
        let mut instance = AttackInstance::new(def, OWNER);

        instance.start(&mut pool, 0).expect("affordable");
        assert_eq!(pool.current(), 0.0);
        assert_eq!(instance.phase(), AttackPhase::Startup);

        let reports = run(&mut instance, &mut world, 20);
        assert_eq!(reports[1].phase_after, Some(AttackPhase::Startup));
        assert_eq!(reports[2].phase_after, Some(AttackPhase::Active));
        assert_eq!(reports[2].hitboxes_spawned, 1);
        assert_eq!(reports[2].hits.len(), 1);
        assert_eq!(reports[14].phase_after, Some(AttackPhase::Active));
        assert_eq!(reports[15].phase_after, Some(AttackPhase::Recovery));
        assert_eq!(reports[18].phase_after, Some(AttackPhase::Recovery));
        assert!(reports[19].ended());

        assert_eq!(instance.end_reason(), Some(EndReason::Completed));
        assert!(instance.hitboxes().is_empty());
        assert_eq!(world.hits_on(TARGET), 1);
    }

    #[test]
    fn test_start_without_resource() {
        let def = sphere_move("slash")
            .cost(ResourceKind::Stamina, 10.0)
            .build_shared()
            .expect("valid");
        let mut pool = pool(5.0);
        let mut instance = AttackInstance::new(def, OWNER);

        let err = instance.start(&mut pool, 0).unwrap_err();
        assert_eq!(
            err,
            InstanceStartError::InsufficientResource {
                kind: ResourceKind::Stamina,
                required: 10.0,
                available: 5.0,
            }
        );
        assert_eq!(pool.current(), 5.0);
        assert_eq!(instance.phase(), AttackPhase::Idle);
    }

    #[test]
    fn test_start_twice() {
        let def = sphere_move("slash").build_shared().expect("valid");
        let mut pool = pool(100.0);
        let mut instance = AttackInstance::new(def, OWNER);
        instance.start(&mut pool, 0).expect("first start");
        assert_eq!(
            instance.start(&mut pool, 0),
            Err(InstanceStartError::AlreadyStarted {
                phase: AttackPhase::Startup
            })
        );
    }

    #[test]
    fn test_restart_after_end() {
        let def = sphere_move("slash")
            .timing(0, 1, 0)
            .build_shared()
            .expect("valid");
        let mut world = arena();
        let mut pool = pool(100.0);
        let mut instance = AttackInstance::new(def, OWNER);

        instance.start(&mut pool, 0).expect("first start");
        instance.tick(&mut world, &NoEffects, 1);
        instance.tick(&mut world, &NoEffects, 2);
        assert!(instance.is_finished());
        assert_eq!(instance.hits_landed(), 1);

        instance.start(&mut pool, 3).expect("restart");
        assert_eq!(instance.phase(), AttackPhase::Startup);
        assert_eq!(instance.current_tick(), 0);
        assert_eq!(instance.hits_landed(), 0);
        assert_eq!(instance.end_reason(), None);
    }

    #[test]
    fn test_idle_instance_does_not_tick() {
        let def = sphere_move("slash").build_shared().expect("valid");
        let mut world = arena();
        let mut instance = AttackInstance::new(def, OWNER);
        let report = instance.tick(&mut world, &NoEffects, 1);
        assert!(!report.transitioned());
        assert_eq!(instance.current_tick(), 0);
    }

    #[test]
    fn test_blitz_spawn_count() {
        let def = sphere_move("dash")
            .timing(2, 40, 0)
            .blitz(5, 8)
            .build_shared()
            .expect("valid");
        let mut world = arena();
        let mut instance = AttackInstance::new(def, OWNER);
        instance.start(&mut pool(100.0), 0).expect("free move");

        let reports = run(&mut instance, &mut world, 40);
        let spawn_ticks: Vec<usize> = reports
            .iter()
            .enumerate()
            .filter(|(_, r)| r.hitboxes_spawned > 0)
            .map(|(i, _)| i + 1)
            .collect();

        assert_eq!(spawn_ticks, vec![2, 7, 12, 17, 22, 27, 32, 37]);
        assert_eq!(instance.hitboxes_spawned(), 8);
    }

    #[test]
    fn test_blitz_each_hitbox_strikes_once() {
        let def = sphere_move("dash")
            .timing(2, 40, 0)
            .blitz(5, 8)
            .max_hits_per_target(8)
            .build_shared()
            .expect("valid");
        let mut world = arena();
        let mut instance = AttackInstance::new(def, OWNER);
        instance.start(&mut pool(100.0), 0).expect("free move");
        run(&mut instance, &mut world, 40);

        let indices: Vec<u32> = world.hits.iter().map(|h| h.hitbox_index).collect();
        assert_eq!(indices, (0..8).collect::<Vec<_>>());
        let hit_ticks: Vec<Tick> = world.hits.iter().map(|h| h.tick).collect();
        assert_eq!(hit_ticks, vec![2, 7, 12, 17, 22, 27, 32, 37]);
        assert_eq!(instance.hits_landed(), 8);
        assert_eq!(instance.registry().hits_on(TARGET), 8);
    }

    #[test]
    fn test_zero_startup_lifecycle() {
        let def = sphere_move("jab")
            .timing(0, 13, 4)
            .build_shared()
            .expect("valid");
        let mut world = arena();
        let mut instance = AttackInstance::new(def, OWNER);
        instance.start(&mut pool(100.0), 0).expect("free move");

        let reports = run(&mut instance, &mut world, 17);
        assert_eq!(reports[0].phase_after, Some(AttackPhase::Active));
        assert_eq!(reports[0].hits.len(), 1);
        assert_eq!(reports[11].phase_after, Some(AttackPhase::Active));
        assert_eq!(reports[12].phase_after, Some(AttackPhase::Recovery));
        assert_eq!(reports[15].phase_after, Some(AttackPhase::Recovery));
        assert!(reports[16].ended());
        assert_eq!(instance.current_tick(), 17);
        assert_eq!(instance.end_reason(), Some(EndReason::Completed));
    }

    #[test]
    fn test_zero_active_window_checks_once() {
        let def = sphere_move("flick")
            .timing(1, 0, 2)
            .build_shared()
            .expect("valid");
        let mut world = arena();
        let mut instance = AttackInstance::new(def, OWNER);
        instance.start(&mut pool(100.0), 0).expect("free move");

        let first = instance.tick(&mut world, &NoEffects, 1);
        assert_eq!(first.hits.len(), 1);
        assert_eq!(first.phase_after, Some(AttackPhase::Recovery));

        run(&mut instance, &mut world, 2);
        assert!(instance.is_finished());
        assert_eq!(world.hits_on(TARGET), 1);
    }

    #[test]
    fn test_all_zero_timing_completes_on_first_tick() {
        let def = sphere_move("instant")
            .timing(0, 0, 0)
            .build_shared()
            .expect("valid");
        let mut world = arena();
        let mut instance = AttackInstance::new(def, OWNER);
        instance.start(&mut pool(100.0), 0).expect("free move");

        let report = instance.tick(&mut world, &NoEffects, 1);
        assert!(report.ended());
        assert_eq!(report.hits.len(), 1);
    }

    #[test]
    fn test_cancel_clears_hitboxes() {
        let def = sphere_move("hold")
            .timing(0, 30, 5)
            .strike(StrikeMode::Persistent)
            .build_shared()
            .expect("valid");
        let mut world = arena();
        let mut instance = AttackInstance::new(def, OWNER);
        instance.start(&mut pool(100.0), 0).expect("free move");
        run(&mut instance, &mut world, 2);
        assert_eq!(instance.hitboxes().len(), 1);

        assert!(instance.cancel());
        assert!(instance.hitboxes().is_empty());
        assert_eq!(instance.end_reason(), Some(EndReason::Cancelled));
        assert!(!instance.cancel());

        let report = instance.tick(&mut world, &NoEffects, 3);
        assert!(report.hits.is_empty());
    }

    #[test]
    fn test_owner_vanishing_cancels() {
        let def = sphere_move("slash").build_shared().expect("valid");
        let mut world = arena();
        let bus = EffectBus::new(16);
        let mut instance = AttackInstance::new(def, OWNER);
        instance.start(&mut pool(100.0), 0).expect("free move");

        world.remove(OWNER);
        instance.tick(&mut world, &bus, 1);
        assert_eq!(instance.end_reason(), Some(EndReason::Cancelled));
        assert!(matches!(
            bus.drain().as_slice(),
            [EffectCue::AttackCancelled { .. }]
        ));
    }

    #[test]
    fn test_unavailable_target_does_not_stop_resolution() {
        let other = AgentId::from_raw(3);
        let def = sphere_move("slash")
            .timing(0, 1, 0)
            .build_shared()
            .expect("valid");
        let mut world = arena();
        world.place(other, Vec3::new(0.5, 0.0, 2.0), -Vec3::Z, 0.5);
        world.vanish(TARGET);

        let mut instance = AttackInstance::new(def, OWNER);
        instance.start(&mut pool(100.0), 0).expect("free move");
        let report = instance.tick(&mut world, &NoEffects, 1);

        assert_eq!(report.hits.len(), 1);
        assert_eq!(report.hits[0].target, other);
        assert_eq!(instance.registry().hits_on(TARGET), 0);
    }

    #[test]
    fn test_facing_filter() {
        let behind = AgentId::from_raw(3);
        let def = AttackDefinition::builder("sweep")
            .timing(0, 1, 0)
            .hitbox(HitboxSpec::new(HitShape::sphere(4.0)).with_forward_offset(0.0))
            .target_filter(TargetFilter::Facing { max_angle: 60.0 })
            .build_shared()
            .expect("valid");
        let mut world = arena();
        world.place(behind, Vec3::new(0.0, 0.0, -2.0), Vec3::Z, 0.5);

        let mut instance = AttackInstance::new(def, OWNER);
        instance.start(&mut pool(100.0), 0).expect("free move");
        instance.tick(&mut world, &NoEffects, 1);

        assert_eq!(world.hits_on(TARGET), 1);
        assert_eq!(world.hits_on(behind), 0);
    }

    #[test]
    fn test_double_slash_two_hitboxes_two_hits() {
        let def = sphere_move("double")
            .timing(0, 10, 0)
            .blitz(4, 2)
            .max_hits_per_target(2)
            .knockback(1.0, KnockbackMode::Pull)
            .final_knockback(KnockbackMode::Radial)
            .build_shared()
            .expect("valid");
        let mut world = arena();
        let mut instance = AttackInstance::new(def, OWNER);
        instance.start(&mut pool(100.0), 0).expect("free move");
        run(&mut instance, &mut world, 10);

        assert_eq!(world.hits.len(), 2);
        assert_eq!(world.hits[0].hitbox_index, 0);
        assert_eq!(world.hits[1].hitbox_index, 1);
        // pull toward the attacker, then push away from the hitbox
        assert!(world.hits[0].knockback.z < 0.0);
        assert!(world.hits[1].knockback.z > 0.0);
    }

    #[test]
    fn test_effect_cues() {
        let def = sphere_move("slash")
            .timing(1, 1, 1)
            .build_shared()
            .expect("valid");
        let mut world = arena();
        let bus = EffectBus::new(16);
        let mut instance = AttackInstance::new(def, OWNER);
        instance.start(&mut pool(100.0), 0).expect("free move");
        for now in 1..=3 {
            instance.tick(&mut world, &bus, now);
        }

        let cues = bus.drain();
        assert!(matches!(cues[0], EffectCue::HitboxSpawned { index: 0, .. }));
        assert!(matches!(&cues[1], EffectCue::HitConfirmed { target, .. } if *target == TARGET));
        assert!(matches!(cues[2], EffectCue::AttackEnded { .. }));
    }

    proptest! {
        #[test]
        fn phases_never_go_backwards(startup in 0u32..8, active in 0u32..8, recovery in 0u32..8) {
            let def = sphere_move("any")
                .timing(startup, active, recovery)
                .build_shared()
                .expect("valid");
            let mut world = arena();
            let mut instance = AttackInstance::new(def, OWNER);
            instance.start(&mut pool(100.0), 0).expect("free move");

            let mut last = instance.phase();
            for now in 1..=u64::from(startup + active + recovery + 2) {
                instance.tick(&mut world, &NoEffects, now);
                prop_assert!(instance.phase() >= last);
                last = instance.phase();
            }
            prop_assert_eq!(instance.phase(), AttackPhase::Ended);
        }

        #[test]
        fn hits_never_exceed_ceiling(max_hits in 1u32..5, active in 1u32..30, rehit in 1u32..4) {
            let def = AttackDefinition::builder("drill")
                .timing(0, active, 0)
                .strike(StrikeMode::Persistent)
                .hitbox(HitboxSpec::new(HitShape::sphere(1.5)).with_rehit_interval(rehit))
                .max_hits_per_target(max_hits)
                .build_shared()
                .expect("valid");
            let mut world = arena();
            let mut instance = AttackInstance::new(def, OWNER);
            instance.start(&mut pool(100.0), 0).expect("free move");
            run(&mut instance, &mut world, u64::from(active) + 2);

            prop_assert!(world.hits_on(TARGET) <= max_hits as usize);
            prop_assert!(instance.registry().hits_on(TARGET) <= max_hits);
        }
    }
}
