//! Line of sight and target enumeration
//!
//! Two sight rules are available:
//! - [`SightRule::Centerline`]: sample the hex line between the two centers;
//!   any intermediate wall or obstacle blocks.
//! - [`SightRule::CornerToCorner`]: sight exists if any of the 36 segments
//!   between a corner of each hex avoids the interior of every blocking hex.
//!
//! They disagree near wall corners; sessions pick one via `RulesConfig`.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::hex::HexCoord;

/// Which line-of-sight rule a session plays by
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SightRule {
    #[default]
    Centerline,
    CornerToCorner,
}

/// Blocking hexes are shrunk by this factor so that a segment grazing an
/// edge or corner does not count as passing through.
const GRAZE_SCALE: f64 = 0.999;

/// Centerline line of sight. Off-board hexes on the line never block.
pub fn has_line_of_sight(from: HexCoord, to: HexCoord, board: &Board) -> bool {
    if from == to {
        return true;
    }
    let line = from.line_to(to);

    // Check all hexes except start and end
    line.iter()
        .skip(1)
        .take(line.len().saturating_sub(2))
        .all(|coord| !blocks(board, *coord))
}

/// Line of sight under the chosen rule
pub fn has_line_of_sight_with(rule: SightRule, from: HexCoord, to: HexCoord, board: &Board) -> bool {
    match rule {
        SightRule::Centerline => has_line_of_sight(from, to, board),
        SightRule::CornerToCorner => has_corner_sight(from, to, board),
    }
}

/// Corner-to-corner line of sight
pub fn has_corner_sight(from: HexCoord, to: HexCoord, board: &Board) -> bool {
    if from == to {
        return true;
    }
    let span = from.distance_to(to);
    let blockers: Vec<[(f64, f64); 6]> = board
        .hexes()
        .filter(|h| h.terrain.blocks_sight() && h.coord != from && h.coord != to)
        .filter(|h| h.coord.distance_to(from) <= span && h.coord.distance_to(to) <= span)
        .map(|h| shrunk_corners(h.coord))
        .collect();

    if blockers.is_empty() {
        return true;
    }

    let from_corners = from.corners();
    let to_corners = to.corners();
    from_corners.iter().any(|&a| {
        to_corners
            .iter()
            .any(|&b| blockers.iter().all(|poly| !segment_hits_polygon(a, b, poly)))
    })
}

/// Occupied hexes an attacker at `attacker` could target.
///
/// Range 0 is melee: occupied adjacent hexes only. Otherwise every occupied
/// hex within range, other than the attacker's own, that is in sight.
/// Results come in canonical spiral order.
pub fn valid_targets(attacker: HexCoord, range: u32, board: &Board) -> Vec<HexCoord> {
    valid_targets_with(SightRule::Centerline, attacker, range, board)
}

pub fn valid_targets_with(rule: SightRule, attacker: HexCoord, range: u32, board: &Board) -> Vec<HexCoord> {
    if range == 0 {
        return attacker
            .neighbors()
            .into_iter()
            .filter(|&h| board.is_occupied(h))
            .collect();
    }
    attacker
        .spiral(range)
        .into_iter()
        .skip(1)
        .filter(|&h| board.is_occupied(h))
        .filter(|&h| has_line_of_sight_with(rule, attacker, h, board))
        .collect()
}

fn blocks(board: &Board, coord: HexCoord) -> bool {
    board
        .terrain(coord)
        .is_some_and(|terrain| terrain.blocks_sight())
}

fn shrunk_corners(hex: HexCoord) -> [(f64, f64); 6] {
    let (cx, cy) = hex.center_point();
    let mut corners = hex.corners();
    for corner in &mut corners {
        corner.0 = cx + (corner.0 - cx) * GRAZE_SCALE;
        corner.1 = cy + (corner.1 - cy) * GRAZE_SCALE;
    }
    corners
}

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Proper intersection of segments p1p2 and q1q2
fn segments_cross(p1: (f64, f64), p2: (f64, f64), q1: (f64, f64), q2: (f64, f64)) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0)) && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Point strictly inside a convex polygon given in winding order
fn inside_convex(point: (f64, f64), poly: &[(f64, f64); 6]) -> bool {
    let mut sign = 0.0f64;
    for i in 0..6 {
        let c = cross(poly[i], poly[(i + 1) % 6], point);
        if c == 0.0 {
            return false;
        }
        if sign == 0.0 {
            sign = c.signum();
        } else if c.signum() != sign {
            return false;
        }
    }
    true
}

fn segment_hits_polygon(a: (f64, f64), b: (f64, f64), poly: &[(f64, f64); 6]) -> bool {
    if inside_convex(a, poly) || inside_convex(b, poly) {
        return true;
    }
    (0..6).any(|i| segments_cross(a, b, poly[i], poly[(i + 1) % 6]))
}
