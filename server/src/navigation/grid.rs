//! Grid A* over a [`WalkabilityMap`].
//!
//! The world is quantized into square cells; a cell is open when its center
//! is walkable and not blocked. Searches move in 8 directions and never cut
//! a corner past a blocked orthogonal neighbor.
//!
//! The heuristic is Manhattan distance over cell coordinates. With diagonal
//! steps costing √2 it can overestimate, so returned paths are near-optimal
//! rather than guaranteed shortest.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::f32::consts::SQRT_2;
use std::time::Duration;

use log::{debug, trace};

use super::{TtlCache, Vec2, WalkabilityMap};
use crate::config::AiTuning;

/// Integer cell coordinates
pub type Cell = (i32, i32);

/// Cache key: the quantized endpoints of a request, before any substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathKey {
    pub start: Cell,
    pub end: Cell,
}

const NEIGHBORS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// A* node for the open set
#[derive(Debug, Clone, Copy)]
struct Node {
    cell: Cell,
    g_cost: f32,
    f_cost: f32,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Everything one search needs, split from the navigator so the cache can be
/// borrowed mutably while a search runs.
#[derive(Debug, Clone, Copy)]
struct Search {
    cell_size: f32,
    max_iterations: usize,
}

impl Search {
    fn cell_center(&self, cell: Cell) -> Vec2 {
        Vec2::new(
            (cell.0 as f32 + 0.5) * self.cell_size,
            (cell.1 as f32 + 0.5) * self.cell_size,
        )
    }

    fn is_open(&self, map: &dyn WalkabilityMap, cell: Cell) -> bool {
        let center = self.cell_center(cell);
        map.is_passable(center.x, center.y)
    }

    fn run(&self, map: &dyn WalkabilityMap, from: Cell, to: Cell, destination: Vec2) -> Vec<Vec2> {
        let heuristic = |cell: Cell| -> f32 { ((cell.0 - to.0).abs() + (cell.1 - to.1).abs()) as f32 };

        let mut open_set = BinaryHeap::new();
        let mut closed: HashSet<Cell> = HashSet::new();
        let mut came_from: HashMap<Cell, Cell> = HashMap::new();
        let mut g_score: HashMap<Cell, f32> = HashMap::new();

        g_score.insert(from, 0.0);
        open_set.push(Node {
            cell: from,
            g_cost: 0.0,
            f_cost: heuristic(from),
        });

        let mut iterations = 0;
        while let Some(current) = open_set.pop() {
            if iterations >= self.max_iterations {
                debug!(
                    "[NAV] A* gave up after {} iterations ({:?} -> {:?})",
                    iterations, from, to
                );
                return Vec::new();
            }
            iterations += 1;

            if current.cell == to {
                trace!("[NAV] A* reached {:?} in {} iterations", to, iterations);
                return self.build_path(&came_from, to, destination);
            }

            // Stale heap entry for a cell already expanded
            if !closed.insert(current.cell) {
                continue;
            }

            let (cx, cy) = current.cell;
            for &(dx, dy) in &NEIGHBORS {
                let next = (cx + dx, cy + dy);
                if closed.contains(&next) || !self.is_open(map, next) {
                    continue;
                }

                let diagonal = dx != 0 && dy != 0;
                if diagonal && (!self.is_open(map, (cx + dx, cy)) || !self.is_open(map, (cx, cy + dy))) {
                    continue;
                }

                let step = if diagonal { SQRT_2 } else { 1.0 };
                let tentative = current.g_cost + step;
                let improved = g_score.get(&next).map_or(true, |&known| tentative < known);
                if improved {
                    came_from.insert(next, current.cell);
                    g_score.insert(next, tentative);
                    open_set.push(Node {
                        cell: next,
                        g_cost: tentative,
                        f_cost: tentative + heuristic(next),
                    });
                }
            }
        }

        debug!("[NAV] No path {:?} -> {:?} after {} iterations", from, to, iterations);
        Vec::new()
    }

    fn build_path(&self, came_from: &HashMap<Cell, Cell>, goal: Cell, destination: Vec2) -> Vec<Vec2> {
        let mut cells = vec![goal];
        let mut cursor = goal;
        while let Some(&parent) = came_from.get(&cursor) {
            cells.push(parent);
            cursor = parent;
        }
        cells.reverse();

        let mut path: Vec<Vec2> = cells.into_iter().map(|c| self.cell_center(c)).collect();
        if let Some(last) = path.last_mut() {
            *last = destination;
        }
        simplify_path(&path)
    }
}

fn sign(value: f32) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Drop interior waypoints that continue in the same direction as the last
/// kept waypoint. Endpoints are always kept.
pub fn simplify_path(path: &[Vec2]) -> Vec<Vec2> {
    if path.len() <= 2 {
        return path.to_vec();
    }

    let mut simplified = vec![path[0]];
    for i in 1..path.len() - 1 {
        let prev = simplified[simplified.len() - 1];
        let curr = path[i];
        let next = path[i + 1];

        let incoming = (sign(curr.x - prev.x), sign(curr.y - prev.y));
        let outgoing = (sign(next.x - curr.x), sign(next.y - curr.y));
        if incoming != outgoing {
            simplified.push(curr);
        }
    }
    simplified.push(path[path.len() - 1]);
    simplified
}

/// Grid pathfinder with a per-navigator path cache
#[derive(Debug, Clone)]
pub struct GridNavigator {
    cell_size: f32,
    max_iterations: usize,
    search_radius: i32,
    cache: TtlCache<PathKey, Vec<Vec2>>,
}

impl GridNavigator {
    pub fn new(cell_size: f32, max_iterations: usize, cache_ttl: Duration, cache_capacity: usize, search_radius: i32) -> Self {
        Self {
            cell_size,
            max_iterations,
            search_radius,
            cache: TtlCache::new(cache_ttl, cache_capacity),
        }
    }

    pub fn from_tuning(tuning: &AiTuning) -> Self {
        Self::new(
            tuning.nav_cell_size,
            tuning.nav_max_iterations,
            Duration::from_millis(tuning.nav_cache_ttl_ms),
            tuning.nav_cache_capacity,
            tuning.nav_nearest_search_radius,
        )
    }

    fn search(&self) -> Search {
        Search {
            cell_size: self.cell_size,
            max_iterations: self.max_iterations,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn world_to_cell(&self, position: Vec2) -> Cell {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        self.search().cell_center(cell)
    }

    pub fn is_cell_open(&self, map: &dyn WalkabilityMap, cell: Cell) -> bool {
        self.search().is_open(map, cell)
    }

    /// Closest open cell on expanding square rings around `cell`
    pub fn nearest_open_cell(&self, map: &dyn WalkabilityMap, cell: Cell) -> Option<Cell> {
        if self.is_cell_open(map, cell) {
            return Some(cell);
        }
        for radius in 1..=self.search_radius {
            for dx in -radius..=radius {
                for dy in -radius..=radius {
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let candidate = (cell.0 + dx, cell.1 + dy);
                    if self.is_cell_open(map, candidate) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }

    /// Waypoints from `start` to `end`, ending exactly at `end`.
    ///
    /// Returns an empty list when no route was found within the iteration
    /// budget. Results are cached per quantized endpoint pair, failures
    /// included, and reused until they expire.
    pub fn find_path(&mut self, map: &dyn WalkabilityMap, start: Vec2, end: Vec2, now: Duration) -> Vec<Vec2> {
        let key = PathKey {
            start: self.world_to_cell(start),
            end: self.world_to_cell(end),
        };

        let from = self.nearest_open_cell(map, key.start).unwrap_or(key.start);
        let to = self.nearest_open_cell(map, key.end).unwrap_or(key.end);
        if from == to {
            return vec![end];
        }

        let search = self.search();
        let mut path = self
            .cache
            .get_or_insert_with(key, now, || search.run(map, from, to, end));
        // a hit may have been stored for another point in the same end cell
        if let Some(last) = path.last_mut() {
            *last = end;
        }
        path
    }

    pub fn cached_paths(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Apply new tuning; cached paths are dropped since they may no longer match
    pub fn reconfigure(&mut self, tuning: &AiTuning) {
        *self = Self::from_tuning(tuning);
    }
}
