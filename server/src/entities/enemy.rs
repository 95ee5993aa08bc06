//! Server-side hostile entity record.

use log::debug;
use rand::Rng;
use warden_shared::{HostileFamily, HostileTemplate, MovementMode};

use super::behavior::BehaviorState;
use crate::combat::CombatGate;
use crate::config::AiTuning;
use crate::navigation::{PathFollower, Vec2};
use crate::SimRng;

/// Threat bump for elite rolls
const ELITE_THREAT_BONUS: u8 = 2;

/// Dedicated health record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn full(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            (self.current / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn restore(&mut self) {
        self.current = self.max;
    }
}

/// Boss-only state layered on top of the regular hostile record
#[derive(Debug, Clone, PartialEq)]
pub struct BossState {
    pub phase: u8,
    pub enraged: bool,
    pub abilities: Vec<String>,
    pub ability_cooldown: f32,
    /// Ability being wound up and the seconds left until it fires
    pub casting: Option<(String, f32)>,
    /// Lifecycle region that owns this boss, if any
    pub region: Option<String>,
    pub base_speed: f32,
    pub base_damage: f32,
    pub base_attack_rate: f32,
}

/// Server-side hostile state
#[derive(Debug, Clone)]
pub struct HostileEntity {
    pub name: String,
    pub family: HostileFamily,
    pub position: Vec2,
    pub spawn_position: Vec2,
    pub speed: f32,
    pub health: Health,
    pub defense: f32,
    pub behavior: BehaviorState,
    pub combat: CombatGate,
    pub follower: PathFollower,
    pub patrol_radius: f32,
    pub group_id: Option<u32>,
    pub pack_aggro: bool,
    pub threat_level: u8,
    pub is_elite: bool,
    pub movement: MovementMode,
    pub alive: bool,
    pub respawn_secs: f32,
    /// Seconds until an in-place respawn; only meaningful while dead
    pub respawn_timer: f32,
    /// Externally driven flag that freezes a wanderer in place
    pub being_attacked: bool,
    /// Roaming box `(min, max)` for wanderers
    pub bounds: Option<(Vec2, Vec2)>,
    /// Last step handed out as a move request, awaiting its result
    pub pending_move: Option<Vec2>,
    pub boss: Option<BossState>,
}

impl HostileEntity {
    /// Build a hostile from a merged template. Every spawn path goes through
    /// here, including boss spawns.
    pub fn from_template(template: &HostileTemplate, position: Vec2, tuning: &AiTuning, rng: &mut SimRng) -> Self {
        let is_boss = template.family == HostileFamily::Boss;
        let is_elite = !is_boss && template.elite_chance > 0.0 && rng.gen::<f32>() < template.elite_chance;

        let (max_health, damage, threat_level) = if is_elite {
            (
                template.max_health * template.elite_multiplier,
                template.damage * template.elite_multiplier,
                template.threat_level.saturating_add(ELITE_THREAT_BONUS),
            )
        } else {
            (template.max_health, template.damage, template.threat_level)
        };

        let mut behavior = BehaviorState::new(template.aggro_range, template.leash_distance, template.attack_range)
            .with_wander_interval(tuning.wander_interval_min, tuning.wander_interval_max);
        behavior.randomize_wander(rng);

        let boss = is_boss.then(|| BossState {
            phase: 1,
            enraged: false,
            abilities: template.abilities.clone(),
            ability_cooldown: 0.0,
            casting: None,
            region: None,
            base_speed: template.speed,
            base_damage: damage,
            base_attack_rate: template.attack_rate,
        });

        if is_elite {
            debug!("[WORLD] Rolled elite {} at ({:.0}, {:.0})", template.name, position.x, position.y);
        }

        Self {
            name: template.name.clone(),
            family: template.family,
            position,
            spawn_position: position,
            speed: template.speed,
            health: Health::full(max_health),
            defense: template.defense,
            behavior,
            combat: CombatGate::new(damage, template.attack_rate),
            follower: PathFollower::new(),
            patrol_radius: template.patrol_radius,
            group_id: template.group_id,
            pack_aggro: template.pack_aggro,
            threat_level,
            is_elite,
            movement: template.movement,
            alive: true,
            respawn_secs: template.respawn_secs,
            respawn_timer: 0.0,
            being_attacked: false,
            bounds: template
                .bounds
                .map(|[min_x, min_y, max_x, max_y]| (Vec2::new(min_x, min_y), Vec2::new(max_x, max_y))),
            pending_move: None,
            boss,
        }
    }

    pub fn is_boss(&self) -> bool {
        self.boss.is_some()
    }

    pub fn distance_from_spawn(&self) -> f32 {
        self.position.distance_to(self.spawn_position)
    }

    /// Stop everything and start the respawn countdown
    pub fn kill(&mut self) {
        self.alive = false;
        self.health.current = 0.0;
        self.behavior.enter_wander();
        self.follower.clear();
        self.pending_move = None;
        self.respawn_timer = self.respawn_secs;
    }

    /// Come back at the spawn point with full health and a clean slate
    pub fn respawn(&mut self) {
        self.alive = true;
        self.position = self.spawn_position;
        self.health.restore();
        self.behavior.reset();
        self.combat.reset();
        self.follower.clear();
        self.being_attacked = false;
        self.respawn_timer = 0.0;
    }
}
