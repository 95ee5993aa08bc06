//! Behavior state for a single hostile.

use std::f32::consts::TAU;

use rand::Rng;
use warden_shared::{AiState, EntityHandle};

use crate::navigation::Vec2;
use crate::SimRng;

/// State machine record for one hostile.
///
/// State and target only change through the `enter_*` methods, which keep
/// the target set exactly while the entity is in CHASE or ATTACK.
#[derive(Debug, Clone)]
pub struct BehaviorState {
    state: AiState,
    previous_state: Option<AiState>,
    target: Option<EntityHandle>,

    pub aggro_range: f32,
    pub leash_distance: f32,
    pub attack_range: f32,

    pub wander_direction: Vec2,
    /// Seconds left before picking a new wander direction or point
    pub wander_timer: f32,
    pub wander_target: Option<Vec2>,
    pub wander_interval_min: f32,
    pub wander_interval_max: f32,
}

impl BehaviorState {
    pub fn new(aggro_range: f32, leash_distance: f32, attack_range: f32) -> Self {
        Self {
            state: AiState::Wander,
            previous_state: None,
            target: None,
            aggro_range,
            leash_distance,
            attack_range,
            wander_direction: Vec2::new(1.0, 0.0),
            wander_timer: 0.0,
            wander_target: None,
            wander_interval_min: 3.0,
            wander_interval_max: 5.0,
        }
    }

    pub fn with_wander_interval(mut self, min: f32, max: f32) -> Self {
        self.wander_interval_min = min;
        self.wander_interval_max = max.max(min);
        self
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    pub fn previous_state(&self) -> Option<AiState> {
        self.previous_state
    }

    pub fn target(&self) -> Option<EntityHandle> {
        self.target
    }

    fn set_state(&mut self, next: AiState) {
        if self.state == next {
            return;
        }
        self.previous_state = Some(self.state);
        self.state = next;
    }

    pub fn enter_chase(&mut self, target: EntityHandle) {
        self.target = Some(target);
        self.set_state(AiState::Chase);
    }

    /// Move to ATTACK against the current target. Ignored without a target.
    pub fn enter_attack(&mut self) {
        if self.target.is_some() {
            self.set_state(AiState::Attack);
        }
    }

    pub fn enter_wander(&mut self) {
        self.target = None;
        self.wander_target = None;
        self.wander_timer = 0.0;
        self.set_state(AiState::Wander);
    }

    pub fn enter_leash_return(&mut self) {
        self.target = None;
        self.set_state(AiState::LeashReturn);
    }

    /// Back to a fresh WANDER with no history, as after a respawn
    pub fn reset(&mut self) {
        self.enter_wander();
        self.previous_state = None;
    }

    pub fn roll_wander_interval(&self, rng: &mut SimRng) -> f32 {
        if self.wander_interval_max > self.wander_interval_min {
            rng.gen_range(self.wander_interval_min..self.wander_interval_max)
        } else {
            self.wander_interval_min
        }
    }

    /// New random heading and a fresh interval timer
    pub fn randomize_wander(&mut self, rng: &mut SimRng) {
        let angle = rng.gen_range(0.0..TAU);
        self.wander_direction = Vec2::from_angle(angle);
        self.wander_timer = self.roll_wander_interval(rng);
    }

    pub fn can_aggro(&self, from: Vec2, to: Vec2) -> bool {
        from.distance_to(to) <= self.aggro_range
    }

    pub fn should_leash(&self, position: Vec2, spawn: Vec2) -> bool {
        position.distance_to(spawn) > self.leash_distance
    }

    pub fn in_attack_range(&self, from: Vec2, to: Vec2) -> bool {
        from.distance_to(to) <= self.attack_range
    }
}
