//! Server-side entity definitions.

mod arena;
mod behavior;
mod enemy;
mod player;

pub use arena::EntityArena;
pub use behavior::BehaviorState;
pub use enemy::{BossState, Health, HostileEntity};
pub use player::PlayerEntity;

use crate::navigation::Vec2;

/// Anything that lives in the simulation's entity arena
#[derive(Debug, Clone)]
pub enum Actor {
    Hostile(HostileEntity),
    Player(PlayerEntity),
}

impl Actor {
    pub fn position(&self) -> Vec2 {
        match self {
            Actor::Hostile(h) => h.position,
            Actor::Player(p) => p.position,
        }
    }

    pub fn is_alive(&self) -> bool {
        match self {
            Actor::Hostile(h) => h.alive,
            Actor::Player(p) => !p.is_dead(),
        }
    }

    pub fn as_hostile(&self) -> Option<&HostileEntity> {
        match self {
            Actor::Hostile(h) => Some(h),
            Actor::Player(_) => None,
        }
    }

    pub fn as_hostile_mut(&mut self) -> Option<&mut HostileEntity> {
        match self {
            Actor::Hostile(h) => Some(h),
            Actor::Player(_) => None,
        }
    }

    pub fn as_player(&self) -> Option<&PlayerEntity> {
        match self {
            Actor::Player(p) => Some(p),
            Actor::Hostile(_) => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut PlayerEntity> {
        match self {
            Actor::Player(p) => Some(p),
            Actor::Hostile(_) => None,
        }
    }
}

/// The simulation's entity collection
pub type EntityStore = EntityArena<Actor>;
