//! Data-driven moves from TOML files.
//!
//! This module provides:
//! - Loading moves from `*.toml` files holding `[[moves]]` tables
//! - Duplicate detection across every loaded file
//! - Follow-up resolution by ID, rejecting unknown and cyclic chains
//! - Registration into a [`MoveCatalog`]
//!
//! ```toml
//! [[moves]]
//! id = "custom.cross_cut"
//! technique = { kind = "double_slash", interval = 3 }
//! damage = 9.0
//! resource = "breath"
//! cost = 15.0
//! follow_up = "custom.finisher"
//! follow_up_window = 12
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tempest_combat::{AttackDefinition, AttackTiming, ConfigError, MoveCatalog, ResourceKind, TargetFilter};
use tempest_common::{CooldownCategory, MoveId};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::technique::Technique;

/// Errors that can occur during move loading.
#[derive(Debug, Error)]
pub enum MoveLoadError {
    /// Move directory not found.
    #[error("Move path not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read a file.
    #[error("Failed to read move file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse move TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A move failed validation or registration.
    #[error("Invalid move: {0}")]
    Config(#[from] ConfigError),

    /// A loaded move reuses an ID already loaded or registered.
    #[error("Duplicate move ID: {0}")]
    DuplicateId(MoveId),

    /// A follow-up names a move that was never loaded.
    #[error("Move {move_id} follows up into unknown move {follow_up}")]
    UnknownFollowUp {
        /// Move declaring the follow-up
        move_id: MoveId,
        /// Missing follow-up
        follow_up: MoveId,
    },

    /// A follow-up chain loops back on itself.
    #[error("Follow-up chain through {0} is cyclic")]
    CyclicFollowUp(MoveId),
}

/// Result type for move loading operations.
pub type MoveLoadResult<T> = Result<T, MoveLoadError>;

/// One move as written in a move file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveSpec {
    /// Catalog ID.
    pub id: MoveId,
    /// Archetype preset.
    pub technique: Technique,
    /// Phase durations; the archetype's when omitted.
    #[serde(default)]
    pub timing: Option<AttackTiming>,
    /// Damage per hit.
    #[serde(default = "default_damage")]
    pub damage: f32,
    /// Reach override.
    #[serde(default)]
    pub range: Option<f32>,
    /// Knockback force override.
    #[serde(default)]
    pub knockback: Option<f32>,
    /// Hit stun override.
    #[serde(default)]
    pub hit_stun: Option<u32>,
    /// Hits allowed per target override.
    #[serde(default)]
    pub max_hits_per_target: Option<u32>,
    /// Target filter override.
    #[serde(default)]
    pub target_filter: Option<TargetFilter>,
    /// Pool paid from.
    #[serde(default)]
    pub resource: ResourceKind,
    /// Cost paid on start.
    #[serde(default)]
    pub cost: f32,
    /// Cooldown in ticks.
    #[serde(default)]
    pub cooldown: u32,
    /// Category sharing the cooldown.
    #[serde(default)]
    pub cooldown_category: CooldownCategory,
    /// Move offered after this one completes.
    #[serde(default)]
    pub follow_up: Option<MoveId>,
    /// Ticks the follow-up is offered for.
    #[serde(default)]
    pub follow_up_window: u32,
}

const fn default_damage() -> f32 {
    5.0
}

impl MoveSpec {
    fn builder(&self) -> tempest_combat::AttackDefinitionBuilder {
        let mut builder = self
            .technique
            .builder(self.id.clone())
            .damage(self.damage)
            .cost(self.resource, self.cost)
            .cooldown(self.cooldown, self.cooldown_category);
        if let Some(timing) = self.timing {
            builder = builder.with_timing(timing);
        }
        if let Some(range) = self.range {
            builder = builder.range(range);
        }
        if let Some(force) = self.knockback {
            builder = builder.knockback_force(force);
        }
        if let Some(stun) = self.hit_stun {
            builder = builder.hit_stun(stun);
        }
        if let Some(hits) = self.max_hits_per_target {
            builder = builder.max_hits_per_target(hits);
        }
        if let Some(filter) = self.target_filter {
            builder = builder.target_filter(filter);
        }
        builder
    }
}

/// A collection of moves from a single file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveFile {
    /// File format version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Moves in this file.
    #[serde(default)]
    pub moves: Vec<MoveSpec>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// Collects move specs, then builds and registers them in one pass.
#[derive(Debug, Default)]
pub struct MoveLoader {
    specs: BTreeMap<MoveId, MoveSpec>,
}

impl MoveLoader {
    /// Creates an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of collected specs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns true if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Adds every move in a TOML document. Nothing is added if any ID is taken.
    pub fn add_str(&mut self, content: &str) -> MoveLoadResult<usize> {
        let file: MoveFile = toml::from_str(content)?;

        let mut seen = BTreeSet::new();
        for spec in &file.moves {
            if self.specs.contains_key(&spec.id) || !seen.insert(&spec.id) {
                return Err(MoveLoadError::DuplicateId(spec.id.clone()));
            }
        }

        let count = file.moves.len();
        for spec in file.moves {
            self.specs.insert(spec.id.clone(), spec);
        }
        Ok(count)
    }

    /// Adds every move in one file.
    pub fn add_file(&mut self, path: &Path) -> MoveLoadResult<usize> {
        let content = fs::read_to_string(path)?;
        self.add_str(&content)
    }

    /// Adds every `*.toml` file in a directory, in file name order.
    ///
    /// Files that fail to load are skipped with a warning.
    pub fn add_dir(&mut self, path: &Path) -> MoveLoadResult<usize> {
        if !path.is_dir() {
            return Err(MoveLoadError::NotFound(path.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.extension().is_some_and(|ext| ext == "toml") {
                files.push(file_path);
            }
        }
        files.sort();

        let mut count = 0;
        for file_path in files {
            match self.add_file(&file_path) {
                Ok(n) => {
                    count += n;
                    debug!("Loaded {} moves from {:?}", n, file_path);
                },
                Err(e) => {
                    warn!("Failed to load move file {:?}: {}", file_path, e);
                },
            }
        }
        Ok(count)
    }

    /// Builds every collected move and registers it in `catalog`.
    ///
    /// Follow-ups are built before the moves that chain into them and shared.
    /// Nothing is registered unless every move can be.
    pub fn register_into(self, catalog: &mut MoveCatalog) -> MoveLoadResult<usize> {
        if let Some(id) = self.specs.keys().find(|id| catalog.contains(id)) {
            return Err(MoveLoadError::DuplicateId(id.clone()));
        }

        let mut built: BTreeMap<MoveId, Arc<AttackDefinition>> = BTreeMap::new();
        for id in self.specs.keys() {
            let mut visiting = Vec::new();
            self.build(id, None, &mut built, &mut visiting)?;
        }
        for definition in built.values() {
            catalog.check_affordable(definition)?;
        }

        let count = built.len();
        for definition in built.into_values() {
            catalog.register_shared(definition)?;
        }
        info!("Registered {} data-driven moves", count);
        Ok(count)
    }

    fn build(
        &self,
        id: &MoveId,
        declared_by: Option<&MoveId>,
        built: &mut BTreeMap<MoveId, Arc<AttackDefinition>>,
        visiting: &mut Vec<MoveId>,
    ) -> MoveLoadResult<Arc<AttackDefinition>> {
        if let Some(definition) = built.get(id) {
            return Ok(Arc::clone(definition));
        }
        if visiting.contains(id) {
            return Err(MoveLoadError::CyclicFollowUp(id.clone()));
        }
        let Some(spec) = self.specs.get(id) else {
            return Err(MoveLoadError::UnknownFollowUp {
                move_id: declared_by.unwrap_or(id).clone(),
                follow_up: id.clone(),
            });
        };

        visiting.push(id.clone());
        let mut builder = spec.builder();
        if let Some(next_id) = &spec.follow_up {
            let next = self.build(next_id, Some(id), built, visiting)?;
            builder = builder.follow_up(next, spec.follow_up_window);
        }
        visiting.pop();

        let definition = builder.build_shared()?;
        built.insert(id.clone(), Arc::clone(&definition));
        Ok(definition)
    }
}

/// Loads every move file in `path` into `catalog`.
pub fn load_dir(path: impl AsRef<Path>, catalog: &mut MoveCatalog) -> MoveLoadResult<usize> {
    let mut loader = MoveLoader::new();
    loader.add_dir(path.as_ref())?;
    loader.register_into(catalog)
}
