//! Waypoint following on top of [`GridNavigator`], with a gated direct
//! fallback when no path is available.

use std::time::Duration;

use log::trace;

use super::{GridNavigator, Vec2, WalkabilityMap};
use crate::config::AiTuning;

/// Distances and timings that drive path following
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowParams {
    pub arrival_distance: f32,
    pub waypoint_distance: f32,
    pub lead_distance: f32,
    pub recalc_interval: f32,
    pub target_threshold: f32,
    pub direct_arrival_distance: f32,
}

impl FollowParams {
    pub fn from_tuning(tuning: &AiTuning) -> Self {
        Self {
            arrival_distance: tuning.path_arrival_distance,
            waypoint_distance: tuning.waypoint_reached_distance,
            lead_distance: tuning.path_lead_distance,
            recalc_interval: tuning.path_recalc_interval,
            target_threshold: tuning.path_target_moved_threshold,
            direct_arrival_distance: tuning.direct_arrival_distance,
        }
    }
}

impl Default for FollowParams {
    fn default() -> Self {
        Self::from_tuning(&AiTuning::default())
    }
}

/// Result of one movement step. The caller decides how `delta` reaches
/// the entity's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    pub delta: Vec2,
    pub arrived: bool,
}

impl MoveOutcome {
    pub const ARRIVED: MoveOutcome = MoveOutcome {
        delta: Vec2::ZERO,
        arrived: true,
    };

    fn step(delta: Vec2) -> Self {
        Self {
            delta,
            arrived: false,
        }
    }
}

/// Per-entity path state
#[derive(Debug, Clone, Default)]
pub struct PathFollower {
    path: Vec<Vec2>,
    index: usize,
    recalc_timer: f32,
    path_target: Option<Vec2>,
}

impl PathFollower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.path.clear();
        self.index = 0;
        self.path_target = None;
    }

    pub fn path(&self) -> &[Vec2] {
        &self.path
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current_waypoint(&self) -> Option<Vec2> {
        self.path.get(self.index).copied()
    }

    fn needs_new_path(&self, target: Vec2, params: &FollowParams) -> bool {
        if self.path.is_empty() || self.index >= self.path.len() {
            return true;
        }
        if self.recalc_timer > params.recalc_interval {
            return true;
        }
        match self.path_target {
            Some(previous) => previous.distance_to(target) > params.target_threshold,
            None => true,
        }
    }

    /// Advance one tick toward `target`, replanning when the path is stale.
    #[allow(clippy::too_many_arguments)]
    pub fn step_toward(
        &mut self,
        position: Vec2,
        target: Vec2,
        speed: f32,
        dt: f32,
        navigator: &mut GridNavigator,
        map: &dyn WalkabilityMap,
        now: Duration,
        params: &FollowParams,
    ) -> MoveOutcome {
        if position.distance_to(target) < params.arrival_distance {
            self.path.clear();
            self.index = 0;
            return MoveOutcome::ARRIVED;
        }

        self.recalc_timer += dt;
        if self.needs_new_path(target, params) {
            self.path = navigator.find_path(map, position, target, now);
            self.index = 0;
            self.path_target = Some(target);
            self.recalc_timer = 0.0;

            if self.path.len() > 1 && position.distance_to(self.path[0]) < params.lead_distance {
                self.index = 1;
            }
            trace!(
                "[NAV] Replanned {} waypoints toward ({:.1}, {:.1})",
                self.path.len(),
                target.x,
                target.y
            );
        }

        if self.path.is_empty() {
            return step_directly(position, target, speed, dt, map, params.direct_arrival_distance);
        }

        loop {
            if self.index >= self.path.len() {
                self.index = self.path.len() - 1;
            }
            let waypoint = self.path[self.index];
            let dist = position.distance_to(waypoint);
            // The last waypoint is the target itself; only true arrival ends the path
            let reach = if self.index + 1 == self.path.len() {
                params.arrival_distance
            } else {
                params.waypoint_distance
            };

            if dist < reach {
                self.index += 1;
                if self.index >= self.path.len() {
                    self.path.clear();
                    self.index = 0;
                    return MoveOutcome::ARRIVED;
                }
                continue;
            }

            let travel = (speed * dt).min(dist);
            return MoveOutcome::step((waypoint - position) * (travel / dist));
        }
    }
}

/// Straight-line step toward `target`, applying each axis only if the
/// resulting point is passable.
pub fn step_directly(
    position: Vec2,
    target: Vec2,
    speed: f32,
    dt: f32,
    map: &dyn WalkabilityMap,
    arrival_distance: f32,
) -> MoveOutcome {
    let to_target = target - position;
    let dist = to_target.length();
    if dist < arrival_distance {
        return MoveOutcome::ARRIVED;
    }

    let travel = (speed * dt).min(dist);
    let next_x = position.x + to_target.x / dist * travel;
    let next_y = position.y + to_target.y / dist * travel;

    let mut delta = Vec2::ZERO;
    if map.is_passable(next_x, position.y) {
        delta.x = next_x - position.x;
    }
    let settled_x = position.x + delta.x;
    if map.is_passable(settled_x, next_y) {
        delta.y = next_y - position.y;
    }
    MoveOutcome::step(delta)
}
