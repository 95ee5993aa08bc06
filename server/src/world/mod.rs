//! The simulation world.
//!
//! [`GameWorld`] owns the entity store, the AI driver, the boss regions, the
//! walkability map and the seeded RNG. One call to [`GameWorld::update`]
//! advances everything by one frame and returns the events it produced.

mod boss_regions;

pub use boss_regions::{BossLifecycle, BossRegionConfig, RegionSlot, RespawnDue, SpawnRejected};

use std::time::Duration;

use log::{debug, info, warn};
use warden_shared::{AiState, DamageKind, EntityHandle, EventSink, HostileFamily, HostileTemplate, SimEvent};

use crate::ai::{self, AiDriver};
use crate::combat::{apply_damage, DamageReport};
use crate::config::{AiTuning, ConfigError};
use crate::entities::{Actor, EntityStore, HostileEntity, PlayerEntity};
use crate::navigation::{Vec2, WalkabilityMap};
use crate::SimRng;

pub struct GameWorld {
    store: EntityStore,
    driver: AiDriver,
    bosses: BossLifecycle,
    map: Box<dyn WalkabilityMap + Send>,
    rng: SimRng,
    clock: Duration,
    /// Events raised since the last drain
    outbox: Vec<SimEvent>,
}

impl GameWorld {
    pub fn new(map: impl WalkabilityMap + Send + 'static, tuning: AiTuning, seed: u64) -> Self {
        info!("[WORLD] Created world with seed {}", seed);
        Self {
            store: EntityStore::new(),
            driver: AiDriver::from_tuning(tuning),
            bosses: BossLifecycle::new(),
            map: Box::new(map),
            rng: crate::seeded_rng(seed),
            clock: Duration::ZERO,
            outbox: Vec::new(),
        }
    }

    pub fn with_boss_regions(mut self, regions: impl IntoIterator<Item = BossRegionConfig>) -> Self {
        for region in regions {
            self.bosses.add_region(region);
        }
        self
    }

    pub fn register_boss_region(&mut self, region: BossRegionConfig) {
        self.bosses.add_region(region);
    }

    // ------------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------------

    pub fn spawn_player(&mut self, name: &str, position: Vec2) -> EntityHandle {
        let handle = self.store.insert(Actor::Player(PlayerEntity::new(name, position)));
        info!("[WORLD] Player {} joined as {}", name, handle);
        handle
    }

    pub fn spawn_hostile(&mut self, template: &HostileTemplate, position: Vec2) -> EntityHandle {
        let entity = HostileEntity::from_template(template, position, self.driver.tuning(), &mut self.rng);
        let handle = self.store.insert(Actor::Hostile(entity));
        debug!(
            "[WORLD] Spawned {} {} at ({:.0}, {:.0})",
            template.family.name(),
            template.name,
            position.x,
            position.y
        );
        handle
    }

    /// Spawn the boss of `region`, unless it already has one alive or pending
    pub fn spawn_boss(&mut self, region: &str) -> Result<EntityHandle, SpawnRejected> {
        let config = self.bosses.begin_spawn(region)?;
        let mut entity =
            HostileEntity::from_template(&config.template, config.spawn_position(), self.driver.tuning(), &mut self.rng);
        if let Some(boss) = entity.boss.as_mut() {
            boss.region = Some(region.to_string());
        }

        let handle = self.store.insert(Actor::Hostile(entity));
        self.bosses.confirm_spawn(region, handle);
        self.outbox.emit(SimEvent::BossSpawned {
            region: region.to_string(),
            entity: handle,
        });
        Ok(handle)
    }

    /// Spawn every region's boss that is not already up or pending
    pub fn spawn_all_bosses(&mut self) -> Vec<EntityHandle> {
        let mut spawned = Vec::new();
        for region in self.bosses.region_ids() {
            match self.spawn_boss(&region) {
                Ok(handle) => spawned.push(handle),
                Err(reason) => debug!("[BOSS] Skipped {}: {}", region, reason),
            }
        }
        spawned
    }

    /// Remove an entity outright. A boss removed this way frees its region.
    pub fn despawn(&mut self, handle: EntityHandle) -> bool {
        if self.store.remove(handle).is_none() {
            return false;
        }
        self.bosses.release(handle);
        debug!("[WORLD] Despawned {}", handle);
        true
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn entity(&self, handle: EntityHandle) -> Option<&Actor> {
        self.store.get(handle)
    }

    pub fn hostile(&self, handle: EntityHandle) -> Option<&HostileEntity> {
        self.store.get(handle).and_then(Actor::as_hostile)
    }

    pub fn hostile_mut(&mut self, handle: EntityHandle) -> Option<&mut HostileEntity> {
        self.store.get_mut(handle).and_then(Actor::as_hostile_mut)
    }

    pub fn player(&self, handle: EntityHandle) -> Option<&PlayerEntity> {
        self.store.get(handle).and_then(Actor::as_player)
    }

    pub fn player_mut(&mut self, handle: EntityHandle) -> Option<&mut PlayerEntity> {
        self.store.get_mut(handle).and_then(Actor::as_player_mut)
    }

    pub fn state_of(&self, handle: EntityHandle) -> Option<AiState> {
        ai::state_of(&self.store, handle)
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn hostile_count(&self) -> usize {
        self.store.iter().filter(|(_, a)| matches!(a, Actor::Hostile(_))).count()
    }

    pub fn boss_lifecycle(&self) -> &BossLifecycle {
        &self.bosses
    }

    pub fn is_boss_alive(&self, region: &str) -> bool {
        self.bosses.is_boss_alive(region)
    }

    pub fn tuning(&self) -> &AiTuning {
        self.driver.tuning()
    }

    /// Swap the tuning between ticks. Invalid values are rejected and the
    /// current tuning stays in place.
    pub fn set_tuning(&mut self, tuning: AiTuning) -> Result<(), ConfigError> {
        tuning.validate()?;
        self.driver.set_tuning(tuning);
        info!("[CONFIG] Applied new AI tuning");
        Ok(())
    }

    /// Simulation time elapsed so far
    pub fn clock(&self) -> Duration {
        self.clock
    }

    // ------------------------------------------------------------------------
    // Inputs from collaborators
    // ------------------------------------------------------------------------

    pub fn set_player_position(&mut self, handle: EntityHandle, position: Vec2) -> bool {
        match self.player_mut(handle) {
            Some(player) => {
                player.position = position;
                true
            }
            None => false,
        }
    }

    /// Flag a hostile as currently under attack. Wanderers hold still while set.
    pub fn set_being_attacked(&mut self, handle: EntityHandle, being_attacked: bool) {
        if let Some(entity) = self.hostile_mut(handle) {
            entity.being_attacked = being_attacked;
        }
    }

    /// Apply the part of a requested move that the movement collaborator
    /// allowed. Wanderers turn away from any axis that was refused.
    pub fn apply_move(&mut self, handle: EntityHandle, applied: Vec2) -> bool {
        let Some(entity) = self.store.get_mut(handle).and_then(Actor::as_hostile_mut) else {
            return false;
        };
        if !entity.alive {
            return false;
        }
        let requested = entity.pending_move.take().unwrap_or(applied);
        entity.position += applied;
        if entity.family == HostileFamily::Wanderer {
            ai::on_move_result(entity, requested, applied, &mut self.rng);
        }
        true
    }

    /// Damage from outside the AI layer (traps, scripted hits, other systems)
    pub fn apply_damage(
        &mut self,
        target: EntityHandle,
        amount: f32,
        source: Option<EntityHandle>,
        kind: DamageKind,
    ) -> Option<DamageReport> {
        self.resolve_hit(target, amount, source, kind)
    }

    /// A player swing, gated by the player's cooldown and stamina
    pub fn player_attack(&mut self, player: EntityHandle, target: EntityHandle) -> Option<DamageReport> {
        let cost = self.driver.tuning().player_attack_stamina_cost;
        let damage = {
            let attacker = self.store.get_mut(player).and_then(Actor::as_player_mut)?;
            if attacker.is_dead() {
                return None;
            }
            let PlayerEntity { combat, stamina, .. } = attacker;
            if !combat.attack_with_cost(cost, stamina) {
                debug!("[COMBAT] {} attack refused (cooldown or stamina)", player);
                return None;
            }
            combat.damage()
        };

        self.outbox.emit(SimEvent::AttackPerformed {
            attacker: player,
            target,
            damage,
        });
        self.resolve_hit(target, damage, Some(player), DamageKind::Physical)
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advance the world by `delta` seconds and return every event raised
    /// since the previous drain
    pub fn update(&mut self, delta: f32) -> Vec<SimEvent> {
        let dt = self.driver.tuning().sanitize_delta(delta);
        self.clock += Duration::from_secs_f32(dt);

        for (_, actor) in self.store.iter_mut() {
            if let Actor::Player(player) = actor {
                player.combat.tick(dt);
            }
        }

        let attacks = self
            .driver
            .tick(&mut self.store, &*self.map, dt, self.clock, &mut self.rng, &mut self.outbox);
        for attack in attacks {
            self.resolve_hit(attack.target, attack.damage, Some(attack.attacker), DamageKind::Physical);
        }

        self.tick_respawns(dt);
        self.tick_boss_regions(dt);

        self.take_events()
    }

    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn resolve_hit(
        &mut self,
        target: EntityHandle,
        amount: f32,
        source: Option<EntityHandle>,
        kind: DamageKind,
    ) -> Option<DamageReport> {
        let report = apply_damage(&mut self.store, target, amount, source, kind, &mut self.outbox)?;
        if report.killed {
            self.on_killed(target);
        }
        self.driver.on_damaged(&mut self.store, target, source, &mut self.outbox);
        Some(report)
    }

    fn on_killed(&mut self, handle: EntityHandle) {
        let Some(entity) = self.hostile(handle) else {
            return;
        };
        let region_boss = entity.boss.as_ref().is_some_and(|b| b.region.is_some());
        let respawn_secs = entity.respawn_secs;
        if region_boss {
            self.bosses.on_boss_death(handle, respawn_secs);
        } else {
            debug!("[WORLD] {} will respawn in {:.0}s", handle, respawn_secs);
        }
    }

    /// Regular hostiles come back in place once their timer runs out.
    /// Region bosses are handled by the lifecycle instead.
    fn tick_respawns(&mut self, dt: f32) {
        for (handle, actor) in self.store.iter_mut() {
            let Actor::Hostile(entity) = actor else {
                continue;
            };
            if entity.alive || entity.boss.as_ref().is_some_and(|b| b.region.is_some()) {
                continue;
            }
            entity.respawn_timer -= dt;
            if entity.respawn_timer <= 0.0 {
                entity.respawn();
                entity.behavior.randomize_wander(&mut self.rng);
                info!("[WORLD] {} {} respawned", entity.name, handle);
                self.outbox.emit(SimEvent::Respawned { entity: handle });
            }
        }
    }

    fn tick_boss_regions(&mut self, dt: f32) {
        for due in self.bosses.update(dt) {
            if let Some(corpse) = due.corpse {
                self.store.remove(corpse);
            }
            if let Err(reason) = self.spawn_boss(&due.region) {
                warn!("[BOSS] Respawn in {} failed: {}", due.region, reason);
            }
        }
    }
}
