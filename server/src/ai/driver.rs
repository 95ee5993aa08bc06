//! Per-tick driver for every hostile in the store.

use std::time::Duration;

use log::{debug, trace};
use warden_shared::{AiState, EntityHandle, EventSink, HostileFamily, SimEvent};

use super::{alert_pack, behavior_for, Followup, TargetView, TickContext};
use crate::config::AiTuning;
use crate::entities::{Actor, EntityStore};
use crate::navigation::{FollowParams, GridNavigator, Vec2, WalkabilityMap};
use crate::SimRng;

/// An attack that landed its cooldown this tick and still needs resolving
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackIntent {
    pub attacker: EntityHandle,
    pub target: EntityHandle,
    pub damage: f32,
}

/// Runs every living hostile once per tick. Owns the navigator so path
/// caching is shared across entities.
#[derive(Debug, Clone)]
pub struct AiDriver {
    navigator: GridNavigator,
    tuning: AiTuning,
}

impl AiDriver {
    pub fn new(navigator: GridNavigator, tuning: AiTuning) -> Self {
        Self { navigator, tuning }
    }

    pub fn from_tuning(tuning: AiTuning) -> Self {
        Self::new(GridNavigator::from_tuning(&tuning), tuning)
    }

    pub fn tuning(&self) -> &AiTuning {
        &self.tuning
    }

    pub fn set_tuning(&mut self, tuning: AiTuning) {
        self.navigator.reconfigure(&tuning);
        self.tuning = tuning;
    }

    pub fn navigator(&self) -> &GridNavigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut GridNavigator {
        &mut self.navigator
    }

    /// Advance all hostiles by `dt` seconds. Attacks are collected rather
    /// than applied so the caller resolves them after every entity moved.
    pub fn tick(
        &mut self,
        store: &mut EntityStore,
        map: &dyn WalkabilityMap,
        dt: f32,
        now: Duration,
        rng: &mut SimRng,
        events: &mut dyn EventSink,
    ) -> Vec<AttackIntent> {
        let dt = self.tuning.sanitize_delta(dt);

        let players: Vec<TargetView> = store
            .iter()
            .filter_map(|(handle, actor)| match actor {
                Actor::Player(p) if !p.is_dead() => Some(TargetView {
                    handle,
                    position: p.position,
                }),
                _ => None,
            })
            .collect();

        let hostiles: Vec<EntityHandle> = store
            .iter()
            .filter(|(_, actor)| matches!(actor, Actor::Hostile(h) if h.alive))
            .map(|(handle, _)| handle)
            .collect();

        let mut attacks = Vec::new();
        let follow = FollowParams::from_tuning(&self.tuning);

        for handle in hostiles {
            let Some((family, position, target_handle)) = store
                .get(handle)
                .and_then(Actor::as_hostile)
                .filter(|e| e.alive)
                .map(|e| (e.family, e.position, e.behavior.target()))
            else {
                continue;
            };

            let target = target_handle.and_then(|t| live_view(store, t));
            let candidate = nearest(&players, position);

            let followup = {
                let Some(entity) = store.get_mut(handle).and_then(Actor::as_hostile_mut) else {
                    continue;
                };
                entity.combat.tick(dt);

                let mut ctx = TickContext {
                    dt,
                    now,
                    tuning: &self.tuning,
                    follow,
                    navigator: &mut self.navigator,
                    map,
                    rng: &mut *rng,
                    events: &mut *events,
                };
                behavior_for(family).update(handle, entity, target, candidate, &mut ctx)
            };

            match followup {
                Followup::None => {}
                Followup::AlertPack { target } => {
                    alert_pack(store, handle, target, self.tuning.pack_alert_radius, events);
                }
                Followup::Attack(intent) => attacks.push(intent),
            }
        }

        trace!("[AI] Tick done, {} attacks queued", attacks.len());
        attacks
    }

    /// React to `victim` being hit by `source`: an idle or returning hostile
    /// turns on its attacker and calls its pack. A victim that died still
    /// calls its pack.
    pub fn on_damaged(
        &self,
        store: &mut EntityStore,
        victim: EntityHandle,
        source: Option<EntityHandle>,
        events: &mut dyn EventSink,
    ) {
        let Some(source) = source else {
            return;
        };
        if source == victim || live_view(store, source).is_none() {
            return;
        }

        let alert = {
            let Some(entity) = store.get_mut(victim).and_then(Actor::as_hostile_mut) else {
                return;
            };
            if entity.family == HostileFamily::Wanderer {
                return;
            }
            if entity.alive && !entity.behavior.state().holds_target() {
                entity.behavior.enter_chase(source);
                entity.follower.clear();
                events.emit(SimEvent::AggroStarted {
                    entity: victim,
                    target: source,
                });
                debug!("[AI] {} retaliating against {}", victim, source);
            }
            entity.pack_aggro && entity.group_id.is_some()
        };

        if alert {
            alert_pack(store, victim, source, self.tuning.pack_alert_radius, events);
        }
    }
}

fn live_view(store: &EntityStore, handle: EntityHandle) -> Option<TargetView> {
    let actor = store.get(handle)?;
    if !actor.is_alive() {
        return None;
    }
    Some(TargetView {
        handle,
        position: actor.position(),
    })
}

fn nearest(candidates: &[TargetView], from: Vec2) -> Option<TargetView> {
    candidates
        .iter()
        .min_by(|a, b| {
            from.distance_to(a.position)
                .partial_cmp(&from.distance_to(b.position))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .copied()
}

/// Current state of a hostile, if the handle resolves to one
pub fn state_of(store: &EntityStore, handle: EntityHandle) -> Option<AiState> {
    store.get(handle).and_then(Actor::as_hostile).map(|e| e.behavior.state())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{HostileEntity, PlayerEntity};
    use crate::navigation::ObstacleMap;
    use rand::SeedableRng;
    use warden_shared::HostileTemplate;

    struct Harness {
        driver: AiDriver,
        store: EntityStore,
        map: ObstacleMap,
        rng: SimRng,
        clock: Duration,
        events: Vec<SimEvent>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                driver: AiDriver::from_tuning(AiTuning::default()),
                store: EntityStore::new(),
                map: ObstacleMap::open(),
                rng: SimRng::seed_from_u64(11),
                clock: Duration::ZERO,
                events: Vec::new(),
            }
        }

        fn hostile(&mut self, template: HostileTemplate, at: Vec2) -> EntityHandle {
            let tuning = self.driver.tuning().clone();
            let entity = HostileEntity::from_template(&template, at, &tuning, &mut self.rng);
            self.store.insert(Actor::Hostile(entity))
        }

        fn player(&mut self, at: Vec2) -> EntityHandle {
            self.store.insert(Actor::Player(PlayerEntity::new("hero", at)))
        }

        fn tick(&mut self, dt: f32) -> Vec<AttackIntent> {
            self.clock += Duration::from_secs_f32(dt);
            self.driver
                .tick(&mut self.store, &self.map, dt, self.clock, &mut self.rng, &mut self.events)
        }

        fn entity(&self, handle: EntityHandle) -> &HostileEntity {
            self.store.get(handle).and_then(Actor::as_hostile).unwrap()
        }

        fn entity_mut(&mut self, handle: EntityHandle) -> &mut HostileEntity {
            self.store.get_mut(handle).and_then(Actor::as_hostile_mut).unwrap()
        }

        fn move_player(&mut self, handle: EntityHandle, to: Vec2) {
            self.store.get_mut(handle).and_then(Actor::as_player_mut).unwrap().position = to;
        }
    }

    fn wolf() -> HostileTemplate {
        HostileTemplate {
            speed: 100.0,
            aggro_range: 200.0,
            leash_distance: 500.0,
            attack_range: 30.0,
            attack_rate: 2.0,
            patrol_radius: 0.0,
            ..HostileTemplate::new("Wolf", HostileFamily::Enemy)
        }
    }

    #[test]
    fn test_aggro_on_nearest_player() {
        let mut h = Harness::new();
        let e = h.hostile(wolf(), Vec2::ZERO);
        let _far = h.player(Vec2::new(190.0, 0.0));
        let near = h.player(Vec2::new(0.0, 100.0));

        h.tick(0.05);

        assert_eq!(h.entity(e).behavior.state(), AiState::Chase);
        assert_eq!(h.entity(e).behavior.target(), Some(near));
        assert!(h.events.contains(&SimEvent::AggroStarted { entity: e, target: near }));
    }

    #[test]
    fn test_no_aggro_outside_range() {
        let mut h = Harness::new();
        let e = h.hostile(wolf(), Vec2::ZERO);
        h.player(Vec2::new(250.0, 0.0));
        h.tick(0.05);
        assert_eq!(h.entity(e).behavior.state(), AiState::Wander);
    }

    #[test]
    fn test_chase_enters_attack_in_range() {
        let mut h = Harness::new();
        let e = h.hostile(wolf(), Vec2::ZERO);
        h.player(Vec2::new(100.0, 0.0));

        let mut attacked = false;
        for _ in 0..40 {
            if !h.tick(0.05).is_empty() {
                attacked = true;
                break;
            }
        }
        assert!(attacked);
        assert_eq!(h.entity(e).behavior.state(), AiState::Attack);
    }

    #[test]
    fn test_attack_hysteresis() {
        let mut h = Harness::new();
        let e = h.hostile(wolf(), Vec2::ZERO);
        let p = h.player(Vec2::new(20.0, 0.0));

        h.tick(0.05); // aggro
        h.tick(0.05); // in range -> attack
        assert_eq!(h.entity(e).behavior.state(), AiState::Attack);

        // 35 is past the attack range but inside 1.2x of it
        h.move_player(p, Vec2::new(35.0, 0.0));
        h.tick(0.05);
        assert_eq!(h.entity(e).behavior.state(), AiState::Attack);

        h.move_player(p, Vec2::new(37.0, 0.0));
        h.tick(0.05);
        assert_eq!(h.entity(e).behavior.state(), AiState::Chase);
        assert_eq!(h.entity(e).behavior.target(), Some(p));
    }

    #[test]
    fn test_attacks_respect_rate() {
        let mut h = Harness::new();
        let e = h.hostile(wolf(), Vec2::ZERO);
        h.player(Vec2::new(10.0, 0.0));

        let dt = 0.05;
        let mut times = Vec::new();
        for step in 0..100 {
            if !h.tick(dt).is_empty() {
                times.push(step as f32 * dt);
            }
        }
        assert!(times.len() >= 8);
        let cooldown = h.entity(e).combat.cooldown();
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= cooldown - 1e-3);
        }
    }

    #[test]
    fn test_leash_overrides_attack_range() {
        let mut h = Harness::new();
        let e = h.hostile(wolf(), Vec2::ZERO);
        let p = h.player(Vec2::new(100.0, 0.0));
        h.tick(0.05);
        assert_eq!(h.entity(e).behavior.state(), AiState::Chase);

        // Entity got dragged past the leash while the target sits in attack range
        h.entity_mut(e).position = Vec2::new(600.0, 0.0);
        h.move_player(p, Vec2::new(610.0, 0.0));
        h.tick(0.05);

        assert_eq!(h.entity(e).behavior.state(), AiState::LeashReturn);
        assert_eq!(h.entity(e).behavior.target(), None);
        assert!(h.events.contains(&SimEvent::Leashed { entity: e }));
    }

    #[test]
    fn test_missing_target_in_chase_returns_home() {
        let mut h = Harness::new();
        let e = h.hostile(wolf(), Vec2::ZERO);
        let p = h.player(Vec2::new(150.0, 0.0));
        h.tick(0.05);
        assert_eq!(h.entity(e).behavior.state(), AiState::Chase);

        h.store.remove(p);
        h.tick(0.05);
        assert_eq!(h.entity(e).behavior.state(), AiState::LeashReturn);
        assert_eq!(h.entity(e).behavior.target(), None);
    }

    #[test]
    fn test_missing_target_in_attack_wanders() {
        let mut h = Harness::new();
        let e = h.hostile(wolf(), Vec2::ZERO);
        let p = h.player(Vec2::new(10.0, 0.0));
        h.tick(0.05);
        h.tick(0.05);
        assert_eq!(h.entity(e).behavior.state(), AiState::Attack);

        h.store.get_mut(p).and_then(Actor::as_player_mut).unwrap().alive = false;
        h.tick(0.05);
        assert_eq!(h.entity(e).behavior.state(), AiState::Wander);
        assert_eq!(h.entity(e).behavior.target(), None);
    }

    #[test]
    fn test_return_heals_and_wanders() {
        let mut h = Harness::new();
        let e = h.hostile(wolf(), Vec2::ZERO);
        {
            let entity = h.entity_mut(e);
            entity.position = Vec2::new(100.0, 0.0);
            entity.health.current = 10.0;
            entity.behavior.enter_leash_return();
        }

        for _ in 0..40 {
            h.tick(0.05);
            if h.entity(e).behavior.state() == AiState::Wander {
                break;
            }
        }
        assert_eq!(h.entity(e).behavior.state(), AiState::Wander);
        assert!(h.entity(e).distance_from_spawn() < 20.0);
        assert_eq!(h.entity(e).health.current, h.entity(e).health.max);
        assert!(h.events.contains(&SimEvent::ReturnedHome { entity: e }));
    }

    #[test]
    fn test_return_finishes_with_tight_leash_arrival() {
        let mut h = Harness::new();
        let tuning = AiTuning {
            leash_arrival_distance: 10.0,
            ..AiTuning::default()
        };
        h.driver.set_tuning(tuning);
        let e = h.hostile(wolf(), Vec2::ZERO);
        {
            let entity = h.entity_mut(e);
            entity.position = Vec2::new(100.0, 0.0);
            entity.behavior.enter_leash_return();
        }

        for _ in 0..60 {
            h.tick(0.05);
            if h.entity(e).behavior.state() == AiState::Wander {
                break;
            }
        }
        assert_eq!(h.entity(e).behavior.state(), AiState::Wander);
        assert!(h.entity(e).distance_from_spawn() < 20.0);
        assert!(h.events.contains(&SimEvent::ReturnedHome { entity: e }));
    }

    #[test]
    fn test_pack_member_joins_on_aggro() {
        let mut h = Harness::new();
        let pack = HostileTemplate {
            group_id: Some(7),
            ..wolf()
        };
        let leader = h.hostile(pack.clone(), Vec2::ZERO);
        let mate = h.hostile(pack.clone(), Vec2::new(100.0, 0.0));
        let straggler = h.hostile(pack, Vec2::new(220.0, 0.0));
        let p = h.player(Vec2::new(-150.0, 0.0));

        h.tick(0.05);

        assert_eq!(h.entity(leader).behavior.state(), AiState::Chase);
        assert_eq!(h.entity(mate).behavior.state(), AiState::Chase);
        assert_eq!(h.entity(mate).behavior.target(), Some(p));
        assert_eq!(h.entity(straggler).behavior.state(), AiState::Wander);
    }

    #[test]
    fn test_retaliation_targets_attacker() {
        let mut h = Harness::new();
        let e = h.hostile(wolf(), Vec2::ZERO);
        let p = h.player(Vec2::new(400.0, 0.0));

        h.driver.on_damaged(&mut h.store, e, Some(p), &mut h.events);
        assert_eq!(h.entity(e).behavior.state(), AiState::Chase);
        assert_eq!(h.entity(e).behavior.target(), Some(p));
    }

    #[test]
    fn test_wanderer_ignores_players() {
        let mut h = Harness::new();
        let dino = h.hostile(HostileTemplate::new("Dino", HostileFamily::Wanderer), Vec2::ZERO);
        h.player(Vec2::new(10.0, 0.0));
        for _ in 0..20 {
            h.tick(0.05);
        }
        assert_eq!(h.entity(dino).behavior.state(), AiState::Wander);
        assert!(h.entity(dino).position != Vec2::ZERO);
    }

    #[test]
    fn test_wanderer_freezes_while_attacked() {
        let mut h = Harness::new();
        let dino = h.hostile(HostileTemplate::new("Dino", HostileFamily::Wanderer), Vec2::ZERO);
        h.entity_mut(dino).being_attacked = true;
        for _ in 0..20 {
            h.tick(0.05);
        }
        assert_eq!(h.entity(dino).position, Vec2::ZERO);
    }

    #[test]
    fn test_wanderer_stays_inside_bounds() {
        let mut h = Harness::new();
        let template = HostileTemplate {
            speed: 200.0,
            bounds: Some([-100.0, -100.0, 100.0, 100.0]),
            ..HostileTemplate::new("Dino", HostileFamily::Wanderer)
        };
        let dino = h.hostile(template, Vec2::ZERO);
        for _ in 0..400 {
            h.tick(0.05);
            let pos = h.entity(dino).position;
            assert!(pos.x.abs() <= 100.0 && pos.y.abs() <= 100.0, "escaped to {:?}", pos);
        }
    }

    #[test]
    fn test_gated_mover_emits_requests() {
        let mut h = Harness::new();
        let template = HostileTemplate {
            movement: warden_shared::MovementMode::Gated,
            ..HostileTemplate::new("Dino", HostileFamily::Wanderer)
        };
        let dino = h.hostile(template, Vec2::ZERO);
        h.tick(0.05);
        assert_eq!(h.entity(dino).position, Vec2::ZERO);
        assert!(h.entity(dino).pending_move.is_some());
        assert!(h
            .events
            .iter()
            .any(|ev| matches!(ev, SimEvent::MoveRequested { entity, .. } if *entity == dino)));
    }

    #[test]
    fn test_boss_changes_phase_and_enrages() {
        let mut h = Harness::new();
        let template = HostileTemplate {
            max_health: 1000.0,
            speed: 100.0,
            ..HostileTemplate::new("Tyrant", HostileFamily::Boss)
        };
        let boss = h.hostile(template, Vec2::ZERO);

        h.entity_mut(boss).health.current = 500.0;
        h.tick(0.05);
        {
            let e = h.entity(boss);
            assert_eq!(e.boss.as_ref().unwrap().phase, 2);
            assert!((e.speed - 120.0).abs() < 1e-3);
            assert!((e.combat.rate() - 1.3).abs() < 1e-4);
        }

        h.entity_mut(boss).health.current = 200.0;
        h.tick(0.05);
        let e = h.entity(boss);
        let state = e.boss.as_ref().unwrap();
        assert_eq!(state.phase, 3);
        assert!(state.enraged);
        assert!((e.combat.damage() - 15.0).abs() < 1e-3);
        assert!(h
            .events
            .contains(&SimEvent::BossPhaseChanged { entity: boss, phase: 3, enraged: true }));
    }

    #[test]
    fn test_boss_regenerates_while_returning() {
        let mut h = Harness::new();
        let template = HostileTemplate {
            max_health: 10_000.0,
            ..HostileTemplate::new("Tyrant", HostileFamily::Boss)
        };
        let boss = h.hostile(template, Vec2::ZERO);
        {
            let e = h.entity_mut(boss);
            e.position = Vec2::new(2000.0, 0.0);
            e.health.current = 9000.0;
            e.behavior.enter_leash_return();
        }
        h.tick(0.1);
        assert!((h.entity(boss).health.current - 9010.0).abs() < 1e-2);
    }

    #[test]
    fn test_boss_ability_winds_up_then_fires() {
        let mut h = Harness::new();
        let tuning = AiTuning {
            boss_ability_chance: 1.0,
            ..AiTuning::default()
        };
        h.driver.set_tuning(tuning);
        let template = HostileTemplate {
            speed: 10.0,
            aggro_range: 300.0,
            attack_range: 50.0,
            leash_distance: 5000.0,
            abilities: vec!["tail_sweep".to_string()],
            ..HostileTemplate::new("Tyrant", HostileFamily::Boss)
        };
        let boss = h.hostile(template, Vec2::ZERO);
        let p = h.player(Vec2::new(200.0, 0.0));

        h.tick(0.05); // aggro
        h.tick(0.05); // starts winding up
        assert!(h.entity(boss).boss.as_ref().unwrap().casting.is_some());
        let parked = h.entity(boss).position;

        for _ in 0..10 {
            h.tick(0.05);
        }
        assert_eq!(h.entity(boss).position, parked);
        assert!(!h.events.iter().any(|ev| matches!(ev, SimEvent::BossAbilityUsed { .. })));

        for _ in 0..15 {
            h.tick(0.05);
        }
        assert!(h.events.contains(&SimEvent::BossAbilityUsed {
            entity: boss,
            ability: "tail_sweep".to_string(),
            target: Some(p),
        }));
        assert!(h.entity(boss).boss.as_ref().unwrap().ability_cooldown > 0.0);
    }

    #[test]
    fn test_boss_leashes_instead_of_casting() {
        let mut h = Harness::new();
        let tuning = AiTuning {
            boss_ability_chance: 1.0,
            ..AiTuning::default()
        };
        h.driver.set_tuning(tuning);
        let template = HostileTemplate {
            aggro_range: 300.0,
            attack_range: 50.0,
            leash_distance: 500.0,
            abilities: vec!["stomp".to_string()],
            ..HostileTemplate::new("Tyrant", HostileFamily::Boss)
        };
        let boss = h.hostile(template, Vec2::ZERO);
        let p = h.player(Vec2::new(800.0, 0.0));
        {
            let e = h.entity_mut(boss);
            e.position = Vec2::new(600.0, 0.0);
            e.behavior.enter_chase(p);
        }

        h.tick(0.05);

        let e = h.entity(boss);
        assert_eq!(e.behavior.state(), AiState::LeashReturn);
        assert_eq!(e.behavior.target(), None);
        assert!(e.boss.as_ref().unwrap().casting.is_none());
        assert!(h.events.contains(&SimEvent::Leashed { entity: boss }));
    }

    #[test]
    fn test_boss_leash_cancels_windup() {
        let mut h = Harness::new();
        let template = HostileTemplate {
            leash_distance: 500.0,
            abilities: vec!["stomp".to_string()],
            ..HostileTemplate::new("Tyrant", HostileFamily::Boss)
        };
        let boss = h.hostile(template, Vec2::ZERO);
        let p = h.player(Vec2::new(700.0, 0.0));
        {
            let e = h.entity_mut(boss);
            e.position = Vec2::new(550.0, 0.0);
            e.behavior.enter_chase(p);
            e.boss.as_mut().unwrap().casting = Some(("stomp".to_string(), 0.5));
        }

        h.tick(0.05);

        let e = h.entity(boss);
        assert_eq!(e.behavior.state(), AiState::LeashReturn);
        assert!(e.boss.as_ref().unwrap().casting.is_none());
        assert!(!h.events.iter().any(|ev| matches!(ev, SimEvent::BossAbilityUsed { .. })));
    }
}
