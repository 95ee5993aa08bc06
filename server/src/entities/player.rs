//! Player-side combatant as seen by the hostile AI.

use crate::combat::CombatGate;
use crate::navigation::Vec2;

/// Default player stats
const PLAYER_MAX_HEALTH: f32 = 100.0;
const PLAYER_MAX_STAMINA: f32 = 100.0;
const PLAYER_DAMAGE: f32 = 10.0;
const PLAYER_ATTACK_RATE: f32 = 2.0;

/// A target hostiles can aggro on. Health is a plain field here rather than
/// a separate record.
#[derive(Debug, Clone)]
pub struct PlayerEntity {
    pub name: String,
    pub position: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub defense: f32,
    pub stamina: f32,
    pub max_stamina: f32,
    pub combat: CombatGate,
    pub alive: bool,
}

impl PlayerEntity {
    pub fn new(name: &str, position: Vec2) -> Self {
        Self {
            name: name.to_string(),
            position,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            defense: 0.0,
            stamina: PLAYER_MAX_STAMINA,
            max_stamina: PLAYER_MAX_STAMINA,
            combat: CombatGate::new(PLAYER_DAMAGE, PLAYER_ATTACK_RATE),
            alive: true,
        }
    }

    pub fn with_defense(mut self, defense: f32) -> Self {
        self.defense = defense;
        self
    }

    pub fn is_dead(&self) -> bool {
        !self.alive || self.health <= 0.0
    }

    pub fn restore_stamina(&mut self, amount: f32) {
        self.stamina = (self.stamina + amount).min(self.max_stamina);
    }

    pub fn revive(&mut self) {
        self.health = self.max_health;
        self.alive = true;
    }
}
