//! Symbolic move IDs mapped to shared definitions.

use std::collections::BTreeMap;
use std::sync::Arc;

use tempest_common::MoveId;
use tracing::debug;

use crate::config::CombatConfig;
use crate::definition::AttackDefinition;
use crate::error::ConfigError;

/// Registry of every move agents may request.
///
/// Definitions are built once and shared. When created with pool capacities,
/// moves that could never be paid for are rejected on registration.
#[derive(Debug, Clone, Default)]
pub struct MoveCatalog {
    moves: BTreeMap<MoveId, Arc<AttackDefinition>>,
    capacities: Option<CombatConfig>,
}

impl MoveCatalog {
    /// Create an empty catalog without capacity checks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty catalog rejecting moves that exceed the pools in `config`.
    #[must_use]
    pub fn with_capacity_limits(config: &CombatConfig) -> Self {
        Self {
            moves: BTreeMap::new(),
            capacities: Some(*config),
        }
    }

    /// Register a definition.
    pub fn register(&mut self, definition: AttackDefinition) -> Result<Arc<AttackDefinition>, ConfigError> {
        self.register_shared(Arc::new(definition))
    }

    /// Register an already shared definition.
    pub fn register_shared(
        &mut self,
        definition: Arc<AttackDefinition>,
    ) -> Result<Arc<AttackDefinition>, ConfigError> {
        if self.moves.contains_key(definition.id()) {
            return Err(ConfigError::DuplicateMove(definition.id().clone()));
        }
        self.check_affordable(&definition)?;

        debug!(move_id = %definition.id(), chain = definition.chain_length(), "Registered move");
        self.moves
            .insert(definition.id().clone(), Arc::clone(&definition));
        Ok(definition)
    }

    /// Run `factory` once and register its result under `id`.
    ///
    /// The built definition must carry the same ID.
    pub fn register_factory<F>(&mut self, id: impl Into<MoveId>, factory: F) -> Result<Arc<AttackDefinition>, ConfigError>
    where
        F: FnOnce(MoveId) -> Result<AttackDefinition, ConfigError>,
    {
        let id = id.into();
        if self.moves.contains_key(&id) {
            return Err(ConfigError::DuplicateMove(id));
        }
        let definition = factory(id)?;
        self.register(definition)
    }

    /// Check every link of `definition`'s chain against the pool capacities.
    pub fn check_affordable(&self, definition: &AttackDefinition) -> Result<(), ConfigError> {
        let Some(capacities) = &self.capacities else {
            return Ok(());
        };
        let chain = std::iter::successors(Some(definition), |d| d.follow_up().map(|f| &**f));
        for link in chain {
            let capacity = capacities.capacity(link.resource());
            if link.resource_cost() > capacity {
                return Err(ConfigError::CostExceedsCapacity {
                    move_id: link.id().clone(),
                    kind: link.resource(),
                    cost: link.resource_cost(),
                    capacity,
                });
            }
        }
        Ok(())
    }

    /// Look up a move.
    #[must_use]
    pub fn get(&self, id: &MoveId) -> Option<Arc<AttackDefinition>> {
        self.moves.get(id).cloned()
    }

    /// Check if a move is registered.
    #[must_use]
    pub fn contains(&self, id: &MoveId) -> bool {
        self.moves.contains_key(id)
    }

    /// Registered IDs in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &MoveId> {
        self.moves.keys()
    }

    /// Registered definitions in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<AttackDefinition>> {
        self.moves.values()
    }

    /// Number of registered moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}
