//! Headless simulation server
//!
//! Loads AI tuning and boss regions, builds a demo world and runs it at the
//! simulation tick rate until Ctrl-C.

use std::time::{Duration, Instant};

use log::{debug, error, info};
use warden_server::navigation::{BoxObstacle, CircleObstacle, ObstacleMap, Vec2, WalkabilityMap};
use warden_server::{AiTuning, BossRegionConfig, GameWorld};
use warden_shared::{HostileFamily, HostileTemplate, MovementMode, SimEvent, SIM_TICK_RATE};

const TUNING_PATH: &str = "ai_tuning.json";
const BOSS_REGIONS_PATH: &str = "boss_regions.json";
const WORLD_SEED: u64 = 0x5EED;

/// Map used when nothing else is configured: a walled arena with a few rocks
fn demo_map() -> ObstacleMap {
    ObstacleMap::bounded(BoxObstacle::from_corners(0.0, 0.0, 4000.0, 4000.0))
        .with_obstacle(CircleObstacle::new(800.0, 800.0, 60.0).into())
        .with_obstacle(BoxObstacle::from_center(1500.0, 1200.0, 40.0, 200.0).into())
        .with_obstacle(CircleObstacle::new(2600.0, 2200.0, 90.0).into())
}

fn default_boss_regions() -> Vec<BossRegionConfig> {
    let rex = HostileTemplate {
        max_health: 2000.0,
        defense: 8.0,
        speed: 70.0,
        damage: 45.0,
        attack_range: 70.0,
        aggro_range: 350.0,
        leash_distance: 900.0,
        respawn_secs: 120.0,
        abilities: vec!["tail_sweep".to_string(), "stomp".to_string()],
        ..HostileTemplate::new("Magma Rex", HostileFamily::Boss)
    };
    vec![BossRegionConfig::new("lava_crags", Vec2::new(3000.0, 3000.0), rex)]
}

fn populate(world: &mut GameWorld) {
    let raptor = HostileTemplate {
        max_health: 60.0,
        speed: 90.0,
        damage: 8.0,
        attack_rate: 1.5,
        group_id: Some(1),
        elite_chance: 0.1,
        ..HostileTemplate::new("Raptor", HostileFamily::Enemy)
    };
    for offset in [Vec2::new(0.0, 0.0), Vec2::new(60.0, 20.0), Vec2::new(30.0, 70.0)] {
        world.spawn_hostile(&raptor, Vec2::new(1000.0, 1000.0) + offset);
    }

    let grazer = HostileTemplate {
        speed: 30.0,
        movement: MovementMode::Gated,
        bounds: Some([200.0, 200.0, 1800.0, 1800.0]),
        ..HostileTemplate::new("Grazer", HostileFamily::Wanderer)
    };
    for i in 0..4 {
        world.spawn_hostile(&grazer, Vec2::new(400.0 + i as f32 * 150.0, 500.0));
    }

    world.spawn_all_bosses();
}

/// Demo player walking a slow circle through the raptor camp
fn player_path(t: f32) -> Vec2 {
    let angle = t * 0.05;
    Vec2::new(1000.0, 1000.0) + Vec2::from_angle(angle) * 450.0
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting hostile simulation...");
    info!("Tick rate: {} Hz", SIM_TICK_RATE);

    let tuning = match AiTuning::load_from_json(TUNING_PATH) {
        Ok(tuning) => tuning,
        Err(e) => {
            error!("Failed to load AI tuning: {}", e);
            error!("Using default tuning");
            AiTuning::default()
        }
    };

    let regions = match BossRegionConfig::load_from_json(BOSS_REGIONS_PATH) {
        Ok(regions) => regions,
        Err(e) => {
            error!("Failed to load boss regions: {}", e);
            error!("Using built-in boss regions");
            default_boss_regions()
        }
    };

    let map = demo_map();
    // Gated movers are resolved here against a copy of the map
    let collision = map.clone();
    let mut world = GameWorld::new(map, tuning, WORLD_SEED).with_boss_regions(regions);
    populate(&mut world);
    let player = world.spawn_player("scout", player_path(0.0));

    let tick_duration = Duration::from_secs_f64(1.0 / SIM_TICK_RATE as f64);
    let mut ticker = tokio::time::interval(tick_duration);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();
    let mut tick_count: u64 = 0;

    info!("Simulation started with {} hostiles", world.hostile_count());

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down after {} ticks", tick_count);
                break;
            }
        }

        let delta = last_tick.elapsed().as_secs_f32();
        last_tick = Instant::now();

        let t = world.clock().as_secs_f32();
        world.set_player_position(player, player_path(t));

        for event in world.update(delta) {
            match event {
                SimEvent::MoveRequested { entity, dx, dy } => {
                    let Some(from) = world.hostile(entity).map(|h| h.position) else {
                        continue;
                    };
                    let applied = Vec2::new(
                        if collision.is_passable(from.x + dx, from.y) { dx } else { 0.0 },
                        if collision.is_passable(from.x, from.y + dy) { dy } else { 0.0 },
                    );
                    world.apply_move(entity, applied);
                }
                SimEvent::Killed { entity, killer, .. } => {
                    info!("{} killed by {:?}", entity, killer);
                    if entity == player {
                        if let Some(p) = world.player_mut(player) {
                            p.revive();
                        }
                    }
                }
                other => debug!("{}: {:?}", other.name(), other),
            }
        }

        if let Some(p) = world.player_mut(player) {
            p.restore_stamina(5.0 * delta);
        }

        tick_count += 1;
    }
}
