//! ID types for agents, moves, and cooldown groups.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an agent (player or creature) taking part in combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(u64);

impl AgentId {
    /// Creates an agent ID from a raw value (host entity id, deserialization).
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Null/invalid agent ID.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) agent ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Hands out sequential agent IDs.
///
/// Owned by whoever spawns agents, so two simulations never share a counter
/// and replays produce the same IDs.
#[derive(Debug, Clone)]
pub struct AgentIdAllocator {
    next: u64,
}

impl Default for AgentIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentIdAllocator {
    /// Creates an allocator starting at the first valid ID.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next unused agent ID.
    pub fn next_id(&mut self) -> AgentId {
        let id = AgentId(self.next);
        self.next += 1;
        id
    }

    /// Marks `id` as taken so it is never handed out.
    pub fn reserve(&mut self, id: AgentId) {
        self.next = self.next.max(id.0.saturating_add(1));
    }
}

/// Symbolic identifier of a move, e.g. `"water.first_form"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveId(String);

impl MoveId {
    /// Creates a move ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MoveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MoveId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Group of moves sharing one cooldown timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CooldownCategory(u16);

impl CooldownCategory {
    /// Creates a category from a raw value.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw category value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Basic weapon swings.
    pub const BASIC: Self = Self(0);

    /// Breathing-style forms.
    pub const TECHNIQUE: Self = Self(1);

    /// Movement-heavy dashes.
    pub const DASH: Self = Self(2);
}

impl Default for CooldownCategory {
    fn default() -> Self {
        Self::BASIC
    }
}

impl fmt::Display for CooldownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "category#{}", self.0)
    }
}
