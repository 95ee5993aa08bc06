//! Navigation for server-side hostile AI.
//!
//! This module provides:
//! - World walkability queries and an obstacle-based implementation
//! - Grid A* pathfinding with a short-lived path cache
//! - Path following and gated direct movement

pub mod cache;
mod follower;
mod grid;

pub use cache::TtlCache;
pub use follower::{step_directly, FollowParams, MoveOutcome, PathFollower};
pub use grid::{simplify_path, Cell, GridNavigator, PathKey};

use log::trace;

// ============================================================================
// Geometry
// ============================================================================

/// A 2D position or direction in world units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` radians
    pub fn from_angle(angle: f32) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len > 0.0001 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }

    pub fn dot(&self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn distance_to(&self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl From<[f32; 2]> for Vec2 {
    fn from(value: [f32; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2 {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

// ============================================================================
// Walkability
// ============================================================================

/// Terrain queries the navigator and movement code rely on
pub trait WalkabilityMap {
    /// Whether the ground at this point can be stood on at all
    fn is_walkable(&self, x: f32, y: f32) -> bool;

    /// Whether something solid occupies this point
    fn is_blocked(&self, x: f32, y: f32) -> bool;

    fn is_passable(&self, x: f32, y: f32) -> bool {
        self.is_walkable(x, y) && !self.is_blocked(x, y)
    }
}

/// Circular obstacle (rocks, trees, etc.)
#[derive(Debug, Clone, PartialEq)]
pub struct CircleObstacle {
    pub center: Vec2,
    pub radius: f32,
}

impl CircleObstacle {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self {
            center: Vec2::new(x, y),
            radius,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.distance_to(self.center) < self.radius
    }
}

/// Axis-aligned box obstacle (walls, buildings, etc.)
#[derive(Debug, Clone, PartialEq)]
pub struct BoxObstacle {
    pub min: Vec2,
    pub max: Vec2,
}

impl BoxObstacle {
    pub fn from_corners(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Vec2::new(min_x.min(max_x), min_y.min(max_y)),
            max: Vec2::new(min_x.max(max_x), min_y.max(max_y)),
        }
    }

    pub fn from_center(center_x: f32, center_y: f32, half_width: f32, half_height: f32) -> Self {
        Self::from_corners(
            center_x - half_width,
            center_y - half_height,
            center_x + half_width,
            center_y + half_height,
        )
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Obstacle {
    Circle(CircleObstacle),
    Box(BoxObstacle),
}

impl Obstacle {
    pub fn contains(&self, point: Vec2) -> bool {
        match self {
            Obstacle::Circle(c) => c.contains(point),
            Obstacle::Box(b) => b.contains(point),
        }
    }
}

impl From<CircleObstacle> for Obstacle {
    fn from(circle: CircleObstacle) -> Self {
        Obstacle::Circle(circle)
    }
}

impl From<BoxObstacle> for Obstacle {
    fn from(area: BoxObstacle) -> Self {
        Obstacle::Box(area)
    }
}

/// Walkability backed by a list of obstacles and an optional walkable area
#[derive(Debug, Clone, Default)]
pub struct ObstacleMap {
    obstacles: Vec<Obstacle>,
    /// Ground outside this box is not walkable (island edges, map borders)
    walkable_area: Option<BoxObstacle>,
}

impl ObstacleMap {
    /// Unbounded map with nothing in it
    pub fn open() -> Self {
        Self::default()
    }

    pub fn bounded(area: BoxObstacle) -> Self {
        Self {
            obstacles: Vec::new(),
            walkable_area: Some(area),
        }
    }

    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }
}

impl WalkabilityMap for ObstacleMap {
    fn is_walkable(&self, x: f32, y: f32) -> bool {
        match &self.walkable_area {
            Some(area) => area.contains(Vec2::new(x, y)),
            None => true,
        }
    }

    fn is_blocked(&self, x: f32, y: f32) -> bool {
        let point = Vec2::new(x, y);
        for obstacle in &self.obstacles {
            if obstacle.contains(point) {
                trace!("[NAV] ({:.1}, {:.1}) blocked by {:?}", x, y, obstacle);
                return true;
            }
        }
        false
    }
}
