//! Generational handles into the simulation's entity arena.

use serde::{Deserialize, Serialize};

/// Weak reference to an entity: a slot index plus the generation the slot
/// had when the entity was inserted.
///
/// Handles are lookup-only. The arena compares generations on every access,
/// so a handle to a removed (or since reused) slot resolves to nothing
/// instead of to whatever lives there now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle {
    pub index: u32,
    pub generation: u32,
}

impl EntityHandle {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl std::fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}
