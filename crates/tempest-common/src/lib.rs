//! # Tempest Common
//!
//! Common types shared by every Tempest crate:
//! - ID types (`AgentId`, `MoveId`, `CooldownCategory`)
//! - The discrete simulation clock
//! - Workspace-level error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod clock;
pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::clock::*;
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_allocator_is_sequential() {
        let mut alloc = AgentIdAllocator::new();
        let a = alloc.next_id();
        let b = alloc.next_id();
        assert_ne!(a, b);
        assert!(a.is_valid());
        assert_eq!(b.raw(), a.raw() + 1);
    }

    #[test]
    fn test_agent_allocator_skips_reserved() {
        let mut alloc = AgentIdAllocator::new();
        alloc.reserve(AgentId::from_raw(5));
        alloc.reserve(AgentId::from_raw(2));
        assert_eq!(alloc.next_id().raw(), 6);
        alloc.reserve(AgentId::NULL);
        assert_eq!(alloc.next_id().raw(), 7);
    }

    #[test]
    fn test_clock_elapsed() {
        let mut clock = SimClock::new();
        let start = clock.now();
        clock.advance();
        clock.advance();
        assert_eq!(clock.elapsed_since(start), 2);
    }

    #[test]
    fn test_move_id_display() {
        let id = MoveId::new("water.first_form");
        assert_eq!(id.to_string(), "water.first_form");
        assert_eq!(id.as_str(), "water.first_form");
    }
}
