//! Attack rate limiting.

/// Slack for float drift when a cooldown lands exactly on a tick boundary
const READY_EPSILON: f32 = 1e-4;

/// Lowest attack rate accepted; keeps the cooldown finite
const MIN_ATTACK_RATE: f32 = 0.01;

/// Cooldown-gated attack trigger.
///
/// A successful attack arms a cooldown of `1 / rate` seconds; no second
/// attack goes through until [`CombatGate::tick`] has run it down.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatGate {
    damage: f32,
    rate: f32,
    cooldown: f32,
    timer: f32,
}

impl CombatGate {
    pub fn new(damage: f32, rate: f32) -> Self {
        let rate = rate.max(MIN_ATTACK_RATE);
        Self {
            damage,
            rate,
            cooldown: 1.0 / rate,
            timer: 0.0,
        }
    }

    pub fn damage(&self) -> f32 {
        self.damage
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// Seconds until the next attack is allowed
    pub fn remaining(&self) -> f32 {
        self.timer
    }

    pub fn is_ready(&self) -> bool {
        self.timer <= READY_EPSILON
    }

    pub fn set_damage(&mut self, damage: f32) {
        self.damage = damage;
    }

    /// Change the attack rate. A cooldown already running keeps its remaining time.
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate.max(MIN_ATTACK_RATE);
        self.cooldown = 1.0 / self.rate;
    }

    /// Attempt an attack. Returns true and arms the cooldown if ready.
    pub fn attack(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.timer = self.cooldown;
        true
    }

    /// Attack that also spends `cost` from a resource pool. Nothing is spent
    /// unless the pool covers the cost and the cooldown is ready.
    pub fn attack_with_cost(&mut self, cost: f32, pool: &mut f32) -> bool {
        if *pool < cost || !self.is_ready() {
            return false;
        }
        *pool -= cost;
        self.timer = self.cooldown;
        true
    }

    pub fn tick(&mut self, dt: f32) {
        if self.timer > 0.0 {
            self.timer = (self.timer - dt).max(0.0);
        }
    }

    pub fn reset(&mut self) {
        self.timer = 0.0;
    }
}
