//! Passive roamer: walks a random heading, bounces off walls and the edge
//! of its roaming box, and never engages.

use warden_shared::{EntityHandle, MovementMode};

use super::{Followup, HostileBehavior, TargetView, TickContext};
use crate::entities::HostileEntity;
use crate::navigation::{MoveOutcome, Vec2};
use crate::SimRng;

pub struct WandererBehavior;

impl HostileBehavior for WandererBehavior {
    fn name(&self) -> &'static str {
        "wanderer"
    }

    fn update(
        &self,
        handle: EntityHandle,
        entity: &mut HostileEntity,
        _target: Option<TargetView>,
        _candidate: Option<TargetView>,
        ctx: &mut TickContext<'_>,
    ) -> Followup {
        if entity.being_attacked {
            return Followup::None;
        }

        entity.behavior.wander_timer -= ctx.dt;
        if entity.behavior.wander_timer <= 0.0 {
            entity.behavior.randomize_wander(ctx.rng);
        }

        let step = entity.speed * ctx.dt;
        let mut dir = entity.behavior.wander_direction;
        let next = entity.position + dir * step;

        if let Some((min, max)) = entity.bounds {
            let pad = ctx.tuning.wanderer_bounds_padding;
            if next.x < min.x + pad || next.x > max.x - pad {
                dir.x = -dir.x;
            }
            if next.y < min.y + pad || next.y > max.y - pad {
                dir.y = -dir.y;
            }
        }

        // Direct movers check terrain themselves; gated ones learn about
        // collisions from the move result instead
        if entity.movement == MovementMode::Direct {
            let probe = entity.position + dir * step;
            if !ctx.map.is_passable(probe.x, entity.position.y) {
                dir.x = -dir.x;
            }
            if !ctx.map.is_passable(entity.position.x, probe.y) {
                dir.y = -dir.y;
            }
        }

        entity.behavior.wander_direction = dir;
        let mut delta = dir * step;
        if entity.movement == MovementMode::Direct {
            let target = entity.position + delta;
            if !ctx.map.is_passable(target.x, target.y) {
                delta = Vec2::ZERO;
            }
        }
        ctx.apply(handle, entity, MoveOutcome { delta, arrived: false });
        Followup::None
    }
}

/// React to a collaborator's answer for a gated move: flip each axis that
/// was requested but not applied, and pick a fresh heading if nothing moved.
pub(crate) fn on_move_result(entity: &mut HostileEntity, requested: Vec2, applied: Vec2, rng: &mut SimRng) {
    let dir = &mut entity.behavior.wander_direction;
    if requested.x != 0.0 && applied.x == 0.0 {
        dir.x = -dir.x;
    }
    if requested.y != 0.0 && applied.y == 0.0 {
        dir.y = -dir.y;
    }
    if applied == Vec2::ZERO {
        entity.behavior.randomize_wander(rng);
    }
}
