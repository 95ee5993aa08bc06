//! Hostile AI: per-family behaviors and the driver that runs them.
//!
//! Each family (regular enemy, boss, wanderer) implements
//! [`HostileBehavior`]. The family is fixed when an entity is built, and the
//! driver looks the behavior up through [`behavior_for`] every tick.

mod boss;
mod driver;
mod enemy;
mod pack;
mod wanderer;

pub use boss::BossBehavior;
pub use driver::{state_of, AiDriver, AttackIntent};
pub use enemy::EnemyBehavior;
pub use pack::alert_pack;
pub use wanderer::WandererBehavior;
pub(crate) use wanderer::on_move_result;

use std::time::Duration;

use warden_shared::{EntityHandle, EventSink, HostileFamily, MovementMode, SimEvent};

use crate::config::AiTuning;
use crate::entities::HostileEntity;
use crate::navigation::{FollowParams, GridNavigator, MoveOutcome, Vec2, WalkabilityMap};
use crate::SimRng;

/// Snapshot of a potential target taken before the entity's update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    pub handle: EntityHandle,
    pub position: Vec2,
}

/// Shared services for one tick
pub struct TickContext<'a> {
    pub dt: f32,
    pub now: Duration,
    pub tuning: &'a AiTuning,
    pub follow: FollowParams,
    pub navigator: &'a mut GridNavigator,
    pub map: &'a dyn WalkabilityMap,
    pub rng: &'a mut SimRng,
    pub events: &'a mut dyn EventSink,
}

impl TickContext<'_> {
    /// Path-follow `entity` toward `target` and hand the step to the world
    pub(crate) fn move_toward(&mut self, handle: EntityHandle, entity: &mut HostileEntity, target: Vec2, speed: f32) -> bool {
        let outcome = entity.follower.step_toward(
            entity.position,
            target,
            speed,
            self.dt,
            self.navigator,
            self.map,
            self.now,
            &self.follow,
        );
        self.apply(handle, entity, outcome)
    }

    /// Apply a step according to the entity's movement mode. Returns whether
    /// the step reported arrival.
    pub(crate) fn apply(&mut self, handle: EntityHandle, entity: &mut HostileEntity, outcome: MoveOutcome) -> bool {
        if outcome.delta != Vec2::ZERO {
            match entity.movement {
                MovementMode::Direct => entity.position += outcome.delta,
                MovementMode::Gated => {
                    entity.pending_move = Some(outcome.delta);
                    self.events.emit(SimEvent::MoveRequested {
                        entity: handle,
                        dx: outcome.delta.x,
                        dy: outcome.delta.y,
                    });
                }
            }
        }
        outcome.arrived
    }
}

/// What the driver should do once an entity's update returns
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Followup {
    None,
    /// The entity just aggroed and wants its group pulled in
    AlertPack { target: EntityHandle },
    Attack(AttackIntent),
}

/// Per-family state machine step
pub trait HostileBehavior: Sync {
    fn name(&self) -> &'static str;

    /// Advance `entity` by one tick.
    ///
    /// `target` is the entity's current target if it still resolves to a
    /// live actor. `candidate` is the nearest live player, offered for aggro.
    fn update(
        &self,
        handle: EntityHandle,
        entity: &mut HostileEntity,
        target: Option<TargetView>,
        candidate: Option<TargetView>,
        ctx: &mut TickContext<'_>,
    ) -> Followup;
}

pub fn behavior_for(family: HostileFamily) -> &'static dyn HostileBehavior {
    match family {
        HostileFamily::Enemy => &EnemyBehavior,
        HostileFamily::Boss => &BossBehavior,
        HostileFamily::Wanderer => &WandererBehavior,
    }
}
