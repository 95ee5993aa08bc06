//! Regular enemy state machine: WANDER, CHASE, ATTACK and LEASH_RETURN.
//!
//! The per-state steps are free functions so the boss behavior can reuse
//! them around its own additions.

use std::f32::consts::TAU;

use log::{debug, info};
use rand::Rng;
use warden_shared::{AiState, EntityHandle, SimEvent};

use super::{AttackIntent, Followup, HostileBehavior, TargetView, TickContext};
use crate::entities::HostileEntity;
use crate::navigation::Vec2;

pub struct EnemyBehavior;

impl HostileBehavior for EnemyBehavior {
    fn name(&self) -> &'static str {
        "enemy"
    }

    fn update(
        &self,
        handle: EntityHandle,
        entity: &mut HostileEntity,
        target: Option<TargetView>,
        candidate: Option<TargetView>,
        ctx: &mut TickContext<'_>,
    ) -> Followup {
        match entity.behavior.state() {
            AiState::Wander => update_wander(handle, entity, candidate, ctx),
            AiState::Chase => update_chase(handle, entity, target, ctx),
            AiState::Attack => update_attack(handle, entity, target, ctx),
            AiState::LeashReturn => update_leash_return(handle, entity, ctx),
        }
    }
}

/// Pick up a target in aggro range, otherwise patrol around spawn
pub(crate) fn update_wander(
    handle: EntityHandle,
    entity: &mut HostileEntity,
    candidate: Option<TargetView>,
    ctx: &mut TickContext<'_>,
) -> Followup {
    if let Some(candidate) = candidate {
        if entity.behavior.can_aggro(entity.position, candidate.position) {
            entity.behavior.enter_chase(candidate.handle);
            entity.follower.clear();
            ctx.events.emit(SimEvent::AggroStarted {
                entity: handle,
                target: candidate.handle,
            });
            debug!("[AI] {} {} aggroed on {}", entity.name, handle, candidate.handle);

            if entity.pack_aggro && entity.group_id.is_some() {
                return Followup::AlertPack {
                    target: candidate.handle,
                };
            }
            return Followup::None;
        }
    }

    entity.behavior.wander_timer -= ctx.dt;
    if entity.behavior.wander_target.is_none() || entity.behavior.wander_timer <= 0.0 {
        let angle = ctx.rng.gen_range(0.0..TAU);
        let reach = entity.patrol_radius * ctx.tuning.wander_patrol_fraction;
        let dist = if reach > 0.0 { ctx.rng.gen_range(0.0..reach) } else { 0.0 };
        entity.behavior.wander_target = Some(entity.spawn_position + Vec2::from_angle(angle) * dist);
        entity.behavior.wander_timer = entity.behavior.roll_wander_interval(ctx.rng);
    }

    if let Some(point) = entity.behavior.wander_target {
        let speed = entity.speed * ctx.tuning.wander_speed_multiplier;
        ctx.move_toward(handle, entity, point, speed);
    }
    Followup::None
}

/// Leash first, then close to attack range
pub(crate) fn update_chase(
    handle: EntityHandle,
    entity: &mut HostileEntity,
    target: Option<TargetView>,
    ctx: &mut TickContext<'_>,
) -> Followup {
    let Some(target) = target else {
        debug!("[AI] {} lost its target, returning home", handle);
        entity.behavior.enter_leash_return();
        entity.follower.clear();
        return Followup::None;
    };

    if leash_if_needed(handle, entity, ctx) {
        return Followup::None;
    }

    if entity.behavior.in_attack_range(entity.position, target.position) {
        entity.behavior.enter_attack();
        return Followup::None;
    }

    let speed = entity.speed;
    ctx.move_toward(handle, entity, target.position, speed);
    Followup::None
}

/// Swing whenever the gate allows; fall back to CHASE past the hysteresis band
pub(crate) fn update_attack(
    handle: EntityHandle,
    entity: &mut HostileEntity,
    target: Option<TargetView>,
    ctx: &mut TickContext<'_>,
) -> Followup {
    let Some(target) = target else {
        entity.behavior.enter_wander();
        return Followup::None;
    };

    if leash_if_needed(handle, entity, ctx) {
        return Followup::None;
    }

    let dist = entity.position.distance_to(target.position);
    if dist > entity.behavior.attack_range * ctx.tuning.attack_range_hysteresis {
        entity.behavior.enter_chase(target.handle);
        return Followup::None;
    }

    if entity.combat.attack() {
        let damage = entity.combat.damage();
        ctx.events.emit(SimEvent::AttackPerformed {
            attacker: handle,
            target: target.handle,
            damage,
        });
        return Followup::Attack(AttackIntent {
            attacker: handle,
            target: target.handle,
            damage,
        });
    }
    Followup::None
}

/// Walk home; on arrival go back to WANDER, healed if configured
pub(crate) fn update_leash_return(handle: EntityHandle, entity: &mut HostileEntity, ctx: &mut TickContext<'_>) -> Followup {
    let mut home = entity.distance_from_spawn() < ctx.tuning.leash_arrival_distance;
    if !home {
        let spawn = entity.spawn_position;
        let speed = entity.speed * ctx.tuning.return_speed_multiplier;
        // the follower stops at its own arrival distance, which may be the wider one
        home = ctx.move_toward(handle, entity, spawn, speed);
    }
    if !home {
        return Followup::None;
    }

    entity.behavior.enter_wander();
    entity.follower.clear();
    if ctx.tuning.heal_on_return {
        entity.health.restore();
    }
    ctx.events.emit(SimEvent::ReturnedHome { entity: handle });
    debug!("[AI] {} {} back at spawn", entity.name, handle);
    Followup::None
}

pub(crate) fn leash_if_needed(handle: EntityHandle, entity: &mut HostileEntity, ctx: &mut TickContext<'_>) -> bool {
    if !entity.behavior.should_leash(entity.position, entity.spawn_position) {
        return false;
    }
    info!(
        "[AI] {} {} leashed at {:.0} from spawn",
        entity.name,
        handle,
        entity.distance_from_spawn()
    );
    entity.behavior.enter_leash_return();
    entity.follower.clear();
    ctx.events.emit(SimEvent::Leashed { entity: handle });
    true
}
