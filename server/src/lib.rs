//! Hostile AI and navigation core.
//!
//! Tick-driven simulation of hostile entities: grid pathfinding with a TTL
//! path cache, a wander/chase/attack/leash state machine, cooldown-gated
//! combat with defense mitigation, one-hop pack alerts, boss phases and
//! per-region boss respawns.
//!
//! Everything runs on one logical thread. [`world::GameWorld`] is the entry
//! point; it owns the entities, the navigator and the seeded RNG.

pub mod ai;
pub mod combat;
pub mod config;
pub mod entities;
pub mod navigation;
pub mod world;

pub use config::{AiTuning, ConfigError};
pub use world::{BossRegionConfig, GameWorld, SpawnRejected};

/// RNG used everywhere in the simulation. Seeded, so runs are reproducible.
pub type SimRng = rand_chacha::ChaCha8Rng;

pub fn seeded_rng(seed: u64) -> SimRng {
    use rand::SeedableRng;
    SimRng::seed_from_u64(seed)
}
