//! Boss behavior: the regular enemy state machine plus health phases,
//! wind-up abilities and fast regeneration while walking home.

use log::info;
use rand::Rng;
use warden_shared::{AiState, EntityHandle, SimEvent};

use super::enemy::{leash_if_needed, update_attack, update_chase, update_leash_return, update_wander};
use super::{Followup, HostileBehavior, TargetView, TickContext};
use crate::config::AiTuning;
use crate::entities::{BossState, HostileEntity};

pub struct BossBehavior;

impl HostileBehavior for BossBehavior {
    fn name(&self) -> &'static str {
        "boss"
    }

    fn update(
        &self,
        handle: EntityHandle,
        entity: &mut HostileEntity,
        target: Option<TargetView>,
        candidate: Option<TargetView>,
        ctx: &mut TickContext<'_>,
    ) -> Followup {
        update_phase(handle, entity, ctx);

        if let Some(boss) = entity.boss.as_mut() {
            if boss.ability_cooldown > 0.0 {
                boss.ability_cooldown = (boss.ability_cooldown - ctx.dt).max(0.0);
            }
        }

        match entity.behavior.state() {
            AiState::Wander => update_wander(handle, entity, candidate, ctx),
            AiState::Chase => {
                if leash_if_needed(handle, entity, ctx) {
                    if let Some(boss) = entity.boss.as_mut() {
                        boss.casting = None;
                    }
                    return Followup::None;
                }
                if let Some(done) = update_casting(handle, entity, target, ctx) {
                    return done;
                }
                if try_start_ability(handle, entity, target, ctx) {
                    return Followup::None;
                }
                update_chase(handle, entity, target, ctx)
            }
            AiState::Attack => update_attack(handle, entity, target, ctx),
            AiState::LeashReturn => {
                let regen = ctx.tuning.boss_regen_per_sec * ctx.dt;
                entity.health.current = (entity.health.current + regen).min(entity.health.max);
                update_leash_return(handle, entity, ctx)
            }
        }
    }
}

/// Phase for a health fraction: above the phase-2 threshold is phase 1,
/// above the phase-3 threshold is phase 2, anything lower is phase 3.
pub(crate) fn phase_for(fraction: f32, tuning: &AiTuning) -> u8 {
    if fraction > tuning.boss_phase2_threshold {
        1
    } else if fraction > tuning.boss_phase3_threshold {
        2
    } else {
        3
    }
}

/// Recompute combat stats from the boss's base stats for `phase`. Phase 3
/// keeps the phase 2 bonuses and adds its own on top.
fn apply_phase_stats(entity: &mut HostileEntity, phase: u8, tuning: &AiTuning) {
    let Some(boss) = entity.boss.as_mut() else {
        return;
    };
    let mut speed = boss.base_speed;
    let mut rate = boss.base_attack_rate;
    let mut damage = boss.base_damage;
    if phase >= 2 {
        speed *= tuning.boss_phase2_speed;
        rate *= tuning.boss_phase2_attack_rate;
    }
    if phase >= 3 {
        speed *= tuning.boss_phase3_speed;
        damage *= tuning.boss_phase3_damage;
    }
    boss.phase = phase;
    boss.enraged = phase >= 3;
    entity.speed = speed;
    entity.combat.set_rate(rate);
    entity.combat.set_damage(damage);
}

fn update_phase(handle: EntityHandle, entity: &mut HostileEntity, ctx: &mut TickContext<'_>) {
    let Some(current) = entity.boss.as_ref().map(|b| b.phase) else {
        return;
    };
    let next = phase_for(entity.health.fraction(), ctx.tuning);
    if next == current {
        return;
    }
    apply_phase_stats(entity, next, ctx.tuning);
    let enraged = entity.boss.as_ref().is_some_and(|b| b.enraged);
    info!("[BOSS] {} {} entered phase {}", entity.name, handle, next);
    ctx.events.emit(SimEvent::BossPhaseChanged {
        entity: handle,
        phase: next,
        enraged,
    });
}

/// Tick an ability wind-up. Returns `Some` while the boss is busy casting.
fn update_casting(
    handle: EntityHandle,
    entity: &mut HostileEntity,
    target: Option<TargetView>,
    ctx: &mut TickContext<'_>,
) -> Option<Followup> {
    let boss: &mut BossState = entity.boss.as_mut()?;
    let (ability, remaining) = boss.casting.take()?;

    if target.is_none() {
        info!("[BOSS] {} {} lost its target, cancelling {}", entity.name, handle, ability);
        return None;
    }

    let remaining = remaining - ctx.dt;
    if remaining > 0.0 {
        boss.casting = Some((ability, remaining));
        return Some(Followup::None);
    }

    info!("[BOSS] {} {} uses {}", entity.name, handle, ability);
    ctx.events.emit(SimEvent::BossAbilityUsed {
        entity: handle,
        ability,
        target: target.map(|t| t.handle),
    });
    Some(Followup::None)
}

/// At medium range and off cooldown, roll for a random ability
fn try_start_ability(
    handle: EntityHandle,
    entity: &mut HostileEntity,
    target: Option<TargetView>,
    ctx: &mut TickContext<'_>,
) -> bool {
    let Some(target) = target else {
        return false;
    };
    let dist = entity.position.distance_to(target.position);
    let min_range = entity.behavior.attack_range * ctx.tuning.boss_ability_range_factor;
    let max_range = entity.behavior.aggro_range;
    let Some(boss) = entity.boss.as_mut() else {
        return false;
    };
    if boss.abilities.is_empty() || boss.ability_cooldown > 0.0 {
        return false;
    }
    if dist <= min_range || dist >= max_range {
        return false;
    }
    if ctx.rng.gen::<f32>() >= ctx.tuning.boss_ability_chance {
        return false;
    }

    let pick = ctx.rng.gen_range(0..boss.abilities.len());
    let ability = boss.abilities[pick].clone();
    boss.casting = Some((ability.clone(), ctx.tuning.boss_ability_windup));
    boss.ability_cooldown = ctx.tuning.boss_ability_cooldown;
    info!("[BOSS] {} {} winding up {}", entity.name, handle, ability);
    true
}
