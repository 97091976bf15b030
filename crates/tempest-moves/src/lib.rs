//! # Tempest Moves
//!
//! Move content for the Tempest combat engine:
//! - Archetype presets (`Technique`) every move is built from
//! - Basic weapon moves and the breathing-style forms
//! - The standard move catalog
//! - TOML move files with follow-up resolution

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod loader;
pub mod style;
pub mod technique;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::loader::*;
    pub use crate::style::*;
    pub use crate::technique::*;
}

pub use prelude::*;
