//! Hex geometry with axial coordinates

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Axial hex coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

/// Direction vectors in axial coordinates (dq, dr)
/// Index: 0=E, 1=NE, 2=NW, 3=W, 4=SW, 5=SE
///
/// This order is canonical: every tie-break in the engine that falls back on
/// position walks hexes in this order.
pub const DIRECTIONS: [(i32, i32); 6] = [
    (1, 0),  // E
    (1, -1), // NE
    (0, -1), // NW
    (-1, 0), // W
    (-1, 1), // SW
    (0, 1),  // SE
];

const SQRT_3: f64 = 1.732_050_807_568_877_2;

impl HexCoord {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Third cube coordinate (q + r + s = 0)
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Distance between two hexes
    pub fn distance_to(&self, other: HexCoord) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = ((self.q + self.r) - (other.q + other.r)).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Get neighbor in direction (0-5)
    pub fn neighbor(&self, direction: usize) -> HexCoord {
        let (dq, dr) = DIRECTIONS[direction % 6];
        HexCoord::new(self.q + dq, self.r + dr)
    }

    /// The six adjacent hexes in canonical direction order
    pub fn neighbors(&self) -> [HexCoord; 6] {
        let mut out = [*self; 6];
        for (dir, slot) in out.iter_mut().enumerate() {
            *slot = self.neighbor(dir);
        }
        out
    }

    pub fn is_adjacent(&self, other: HexCoord) -> bool {
        self.distance_to(other) == 1
    }

    /// Hexes at exactly `radius` from this one.
    ///
    /// Walk starts at the East hex, so `ring(1)` matches `neighbors()`.
    pub fn ring(&self, radius: u32) -> Vec<HexCoord> {
        if radius == 0 {
            return vec![*self];
        }
        let radius = radius as i32;
        let mut out = Vec::with_capacity(6 * radius as usize);
        let (eq, er) = DIRECTIONS[0];
        let mut current = HexCoord::new(self.q + eq * radius, self.r + er * radius);
        for side in 0..6 {
            let dir = (side + 2) % 6;
            for _ in 0..radius {
                out.push(current);
                current = current.neighbor(dir);
            }
        }
        out
    }

    /// All hexes within `radius` (inclusive) in canonical spiral order:
    /// center first, then each ring outward.
    pub fn spiral(&self, radius: u32) -> Vec<HexCoord> {
        let mut out = Vec::with_capacity(hexes_in_range_count(radius));
        for k in 0..=radius {
            out.extend(self.ring(k));
        }
        out
    }

    /// All hexes within `radius`; same set and order as [`HexCoord::spiral`]
    pub fn hexes_in_range(&self, radius: u32) -> Vec<HexCoord> {
        self.spiral(radius)
    }

    /// Sampled centerline between two hexes: `distance + 1` points,
    /// each rounded to the nearest hex. Includes both endpoints.
    pub fn line_to(&self, other: HexCoord) -> Vec<HexCoord> {
        let n = self.distance_to(other);
        if n == 0 {
            return vec![*self];
        }
        let from = FractionalHex::from(*self);
        let to = FractionalHex::from(other);
        (0..=n)
            .map(|i| from.lerp(to, i as f64 / n as f64).round())
            .collect()
    }

    /// Pixel-space center (pointy-top layout, unit corner radius)
    pub fn center_point(&self) -> (f64, f64) {
        let x = SQRT_3 * (self.q as f64 + self.r as f64 / 2.0);
        let y = 1.5 * self.r as f64;
        (x, y)
    }

    /// Pixel-space corners, clockwise from the upper-right corner
    pub fn corners(&self) -> [(f64, f64); 6] {
        let (cx, cy) = self.center_point();
        let mut out = [(0.0, 0.0); 6];
        for (i, corner) in out.iter_mut().enumerate() {
            let angle = (60.0 * i as f64 - 30.0).to_radians();
            *corner = (cx + angle.cos(), cy + angle.sin());
        }
        out
    }
}

impl Add for HexCoord {
    type Output = HexCoord;

    fn add(self, rhs: HexCoord) -> HexCoord {
        HexCoord::new(self.q + rhs.q, self.r + rhs.r)
    }
}

impl Sub for HexCoord {
    type Output = HexCoord;

    fn sub(self, rhs: HexCoord) -> HexCoord {
        HexCoord::new(self.q - rhs.q, self.r - rhs.r)
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// `3n² + 3n + 1`
pub fn hexes_in_range_count(radius: u32) -> usize {
    let n = radius as usize;
    3 * n * n + 3 * n + 1
}

/// Free-function form of [`HexCoord::distance_to`]
pub fn distance(a: HexCoord, b: HexCoord) -> u32 {
    a.distance_to(b)
}

/// Non-integer axial position, produced by interpolation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractionalHex {
    pub q: f64,
    pub r: f64,
}

impl FractionalHex {
    pub fn new(q: f64, r: f64) -> Self {
        Self { q, r }
    }

    pub fn lerp(&self, other: FractionalHex, t: f64) -> FractionalHex {
        FractionalHex::new(
            self.q + (other.q - self.q) * t,
            self.r + (other.r - self.r) * t,
        )
    }

    /// Cube rounding: round all three coordinates, then recompute the one
    /// with the largest rounding error so that q + r + s = 0.
    pub fn round(&self) -> HexCoord {
        let s = -self.q - self.r;
        let mut rq = self.q.round();
        let mut rr = self.r.round();
        let rs = s.round();

        let q_diff = (rq - self.q).abs();
        let r_diff = (rr - self.r).abs();
        let s_diff = (rs - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            rq = -rr - rs;
        } else if r_diff > s_diff {
            rr = -rq - rs;
        }

        HexCoord::new(rq as i32, rr as i32)
    }
}

impl From<HexCoord> for FractionalHex {
    fn from(hex: HexCoord) -> Self {
        FractionalHex::new(hex.q as f64, hex.r as f64)
    }
}
