//! # Tempest Combat
//!
//! Attack lifecycle and hit-resolution engine.
//!
//! This crate provides:
//! - Resource pools gating attacks (stamina, breath)
//! - Immutable attack definitions built from a small set of primitives
//! - The per-attack phase state machine (startup, active, recovery)
//! - Timed hitboxes resolved against the host world at most once per target
//! - Follow-up combos and category-scoped cooldowns
//! - A deterministic per-agent scheduler and a move catalog
//!
//! The host world is reached only through [`SpatialQuery`],
//! [`CombatApplication`] and [`EffectPresentation`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod agent;
pub mod catalog;
pub mod combo;
pub mod config;
pub mod cooldown;
pub mod definition;
pub mod effects;
pub mod error;
pub mod hit_registry;
pub mod hitbox;
pub mod instance;
pub mod resource;
pub mod scheduler;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::*;
    pub use crate::catalog::*;
    pub use crate::combo::*;
    pub use crate::config::*;
    pub use crate::cooldown::*;
    pub use crate::definition::*;
    pub use crate::effects::*;
    pub use crate::error::*;
    pub use crate::hit_registry::*;
    pub use crate::hitbox::*;
    pub use crate::instance::*;
    pub use crate::resource::*;
    pub use crate::scheduler::*;
    pub use crate::world::*;
}

pub use prelude::*;
