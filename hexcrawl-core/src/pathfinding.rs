//! A* pathfinding and bounded movement search over the board
//!
//! Respects terrain costs, occupancy and the mover's movement type.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardHex, Terrain};
use crate::hex::HexCoord;

/// Cost reported for an unreachable goal
pub const UNREACHABLE: u32 = u32::MAX;

/// Movement rules for one search
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOptions {
    /// Maximum total cost; `u32::MAX` is unrestricted
    pub range: u32,
    pub can_fly: bool,
    pub can_jump: bool,
    pub ignore_difficult_terrain: bool,
    pub ignore_obstacles: bool,
    pub ignore_figures: bool,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            range: u32::MAX,
            can_fly: false,
            can_jump: false,
            ignore_difficult_terrain: false,
            ignore_obstacles: false,
            ignore_figures: false,
        }
    }
}

impl PathOptions {
    pub fn with_range(mut self, range: u32) -> Self {
        self.range = range;
        self
    }

    /// Flying wins over jumping when both are set
    fn mode(&self) -> MoveMode {
        if self.can_fly {
            MoveMode::Flying
        } else if self.can_jump {
            MoveMode::Jumping
        } else {
            MoveMode::Normal
        }
    }

    /// Cost to enter `hex`, or None if it cannot be entered
    pub fn step_cost(&self, hex: &BoardHex) -> Option<u32> {
        match self.mode() {
            MoveMode::Flying => match hex.terrain {
                Terrain::Wall => None,
                Terrain::Obstacle if !self.ignore_obstacles => None,
                _ => Some(1),
            },
            MoveMode::Jumping => match hex.terrain {
                Terrain::Wall => None,
                _ => Some(1),
            },
            MoveMode::Normal => {
                if hex.is_occupied() && !self.ignore_figures {
                    return None;
                }
                match hex.terrain {
                    Terrain::Wall => None,
                    Terrain::Obstacle if !self.ignore_obstacles => None,
                    Terrain::Difficult if !self.ignore_difficult_terrain => Some(2),
                    _ => Some(1),
                }
            }
        }
    }

    /// Whether a move may finish on `hex`. Nobody ends on a wall, an obstacle
    /// or another figure, whatever they passed over on the way.
    pub fn can_end_on(&self, hex: &BoardHex) -> bool {
        let terrain_ok = match hex.terrain {
            Terrain::Wall => false,
            Terrain::Obstacle => self.ignore_obstacles,
            _ => true,
        };
        terrain_ok && (!hex.is_occupied() || self.ignore_figures)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MoveMode {
    Normal,
    Jumping,
    Flying,
}

/// Outcome of a single path search
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathResult {
    /// Both endpoints included; empty when invalid
    pub path: Vec<HexCoord>,
    pub cost: u32,
    pub valid: bool,
}

impl PathResult {
    pub fn unreachable() -> Self {
        Self {
            path: Vec::new(),
            cost: UNREACHABLE,
            valid: false,
        }
    }

    /// Hexes entered along the way (start excluded)
    pub fn steps(&self) -> &[HexCoord] {
        self.path.get(1..).unwrap_or(&[])
    }
}

/// Node in the open set: lowest f first, then earliest insertion
#[derive(Debug, Clone, PartialEq, Eq)]
struct PathNode {
    coord: HexCoord,
    g_cost: u32,
    f_cost: u32,
    seq: u64,
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the cheapest path from `start` to `goal` within `options.range`.
///
/// Neighbors are expanded in canonical direction order and equal-f nodes
/// pop in insertion order, so identical inputs give identical paths.
pub fn find_path(start: HexCoord, goal: HexCoord, board: &Board, options: &PathOptions) -> PathResult {
    if !board.contains(start) {
        return PathResult::unreachable();
    }
    let Some(goal_hex) = board.get(goal) else {
        return PathResult::unreachable();
    };
    // Hex distance is a lower bound on cost
    if start.distance_to(goal) > options.range {
        return PathResult::unreachable();
    }
    if start == goal {
        return PathResult {
            path: vec![start],
            cost: 0,
            valid: true,
        };
    }
    if !options.can_end_on(goal_hex) {
        return PathResult::unreachable();
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: FxHashMap<HexCoord, HexCoord> = FxHashMap::default();
    let mut g_scores: FxHashMap<HexCoord, u32> = FxHashMap::default();
    let mut seq = 0u64;

    g_scores.insert(start, 0);
    open_set.push(PathNode {
        coord: start,
        g_cost: 0,
        f_cost: start.distance_to(goal),
        seq,
    });

    while let Some(current) = open_set.pop() {
        if current.coord == goal {
            return PathResult {
                path: reconstruct_path(&came_from, goal),
                cost: current.g_cost,
                valid: true,
            };
        }
        // Stale entry superseded by a cheaper one
        if g_scores.get(&current.coord).is_some_and(|&g| g < current.g_cost) {
            continue;
        }

        for neighbor in current.coord.neighbors() {
            let Some(hex) = board.get(neighbor) else {
                continue;
            };
            let Some(step) = options.step_cost(hex) else {
                continue;
            };

            let tentative_g = current.g_cost.saturating_add(step);
            if tentative_g > options.range {
                continue;
            }
            let neighbor_g = g_scores.get(&neighbor).copied().unwrap_or(UNREACHABLE);
            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.coord);
                g_scores.insert(neighbor, tentative_g);
                seq += 1;
                open_set.push(PathNode {
                    coord: neighbor,
                    g_cost: tentative_g,
                    f_cost: tentative_g + neighbor.distance_to(goal),
                    seq,
                });
            }
        }
    }

    PathResult::unreachable()
}

/// Reconstruct path from came_from map
fn reconstruct_path(came_from: &FxHashMap<HexCoord, HexCoord>, mut current: HexCoord) -> Vec<HexCoord> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

// ============================================================================
// BOUNDED SEARCH
// ============================================================================

/// Every hex a mover can reach from `start` within its range
#[derive(Clone, Debug)]
pub struct Reachable {
    start: HexCoord,
    costs: FxHashMap<HexCoord, u32>,
    came_from: FxHashMap<HexCoord, HexCoord>,
    ends: FxHashMap<HexCoord, bool>,
}

impl Reachable {
    pub fn start(&self) -> HexCoord {
        self.start
    }

    /// Cost to end a move on `hex`, if that is allowed
    pub fn cost(&self, hex: HexCoord) -> Option<u32> {
        if self.ends.get(&hex).copied().unwrap_or(false) {
            self.costs.get(&hex).copied()
        } else {
            None
        }
    }

    pub fn path_to(&self, hex: HexCoord) -> Option<Vec<HexCoord>> {
        self.cost(hex)?;
        Some(reconstruct_path(&self.came_from, hex))
    }

    /// Legal end hexes in canonical spiral order around the start
    pub fn destinations(&self) -> Vec<HexCoord> {
        let radius = self
            .costs
            .keys()
            .map(|h| h.distance_to(self.start))
            .max()
            .unwrap_or(0);
        self.start
            .spiral(radius)
            .into_iter()
            .filter(|&h| self.cost(h).is_some())
            .collect()
    }
}

/// Uniform-cost search from `start` bounded by `options.range`
pub fn reachable(start: HexCoord, board: &Board, options: &PathOptions) -> Reachable {
    let mut result = Reachable {
        start,
        costs: FxHashMap::default(),
        came_from: FxHashMap::default(),
        ends: FxHashMap::default(),
    };
    if !board.contains(start) {
        return result;
    }

    let mut open_set = BinaryHeap::new();
    let mut seq = 0u64;
    result.costs.insert(start, 0);
    result.ends.insert(start, true);
    open_set.push(PathNode {
        coord: start,
        g_cost: 0,
        f_cost: 0,
        seq,
    });

    while let Some(current) = open_set.pop() {
        if result.costs.get(&current.coord).is_some_and(|&g| g < current.g_cost) {
            continue;
        }
        for neighbor in current.coord.neighbors() {
            let Some(hex) = board.get(neighbor) else {
                continue;
            };
            let Some(step) = options.step_cost(hex) else {
                continue;
            };
            let tentative_g = current.g_cost.saturating_add(step);
            if tentative_g > options.range {
                continue;
            }
            let known = result.costs.get(&neighbor).copied().unwrap_or(UNREACHABLE);
            if tentative_g < known {
                result.costs.insert(neighbor, tentative_g);
                result.came_from.insert(neighbor, current.coord);
                result.ends.insert(neighbor, options.can_end_on(hex));
                seq += 1;
                open_set.push(PathNode {
                    coord: neighbor,
                    g_cost: tentative_g,
                    f_cost: tentative_g,
                    seq,
                });
            }
        }
    }

    result
}

/// Least movement cost from each hex to the nearest of `targets`.
///
/// Runs the search backwards from the targets, charging the cost of entering
/// each hex as a forward move would. Off-board targets are ignored.
pub fn distance_field(targets: &[HexCoord], board: &Board, options: &PathOptions) -> FxHashMap<HexCoord, u32> {
    let mut dist: FxHashMap<HexCoord, u32> = FxHashMap::default();
    let mut open_set = BinaryHeap::new();
    let mut seq = 0u64;

    for &target in targets {
        if board.contains(target) && !dist.contains_key(&target) {
            dist.insert(target, 0);
            seq += 1;
            open_set.push(PathNode {
                coord: target,
                g_cost: 0,
                f_cost: 0,
                seq,
            });
        }
    }

    while let Some(current) = open_set.pop() {
        if dist.get(&current.coord).is_some_and(|&g| g < current.g_cost) {
            continue;
        }
        let Some(hex) = board.get(current.coord) else {
            continue;
        };
        // A mover steps into `current` from each neighbor
        let enter = if current.g_cost == 0 {
            options.can_end_on(hex).then(|| options.step_cost(hex).unwrap_or(1))
        } else {
            options.step_cost(hex)
        };
        let Some(enter) = enter else {
            continue;
        };

        for neighbor in current.coord.neighbors() {
            if !board.contains(neighbor) {
                continue;
            }
            let tentative = current.g_cost.saturating_add(enter);
            let known = dist.get(&neighbor).copied().unwrap_or(UNREACHABLE);
            if tentative < known {
                dist.insert(neighbor, tentative);
                seq += 1;
                open_set.push(PathNode {
                    coord: neighbor,
                    g_cost: tentative,
                    f_cost: tentative,
                    seq,
                });
            }
        }
    }

    dist
}
