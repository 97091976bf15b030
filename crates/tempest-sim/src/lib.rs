//! # Tempest Sim
//!
//! Headless arena for the Tempest combat engine.
//!
//! Agents stand in an arena, press scripted moves on fixed ticks and fight
//! through the attack scheduler. The arena owns health, hit stun, knockback
//! and line-of-sight pillars; the run ends in a per-agent summary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod arena;
pub mod config;
pub mod runner;
pub mod summary;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::arena::*;
    pub use crate::config::*;
    pub use crate::runner::*;
    pub use crate::summary::*;
}

pub use prelude::*;
