//! Combat tuning shared by every agent.

use serde::{Deserialize, Serialize};

use crate::resource::{PoolConfig, ResourceKind};

/// Pool settings applied to every agent a scheduler creates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Stamina pool tuning.
    pub stamina: PoolConfig,
    /// Breath pool tuning.
    pub breath: PoolConfig,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            stamina: PoolConfig::stamina(),
            breath: PoolConfig::breath(),
        }
    }
}

impl CombatConfig {
    /// Tuning for the pool of `kind`.
    #[must_use]
    pub fn pool(&self, kind: ResourceKind) -> PoolConfig {
        match kind {
            ResourceKind::Stamina => self.stamina,
            ResourceKind::Breath => self.breath,
        }
    }

    /// Maximum amount the pool of `kind` can hold.
    #[must_use]
    pub fn capacity(&self, kind: ResourceKind) -> f32 {
        self.pool(kind).max
    }

    /// Clamp values to sensible ranges.
    pub fn validate(&mut self) {
        self.stamina.validate();
        self.breath.validate();
    }
}
