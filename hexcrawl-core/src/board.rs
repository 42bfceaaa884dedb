//! Battlefield: terrain, overlays and occupancy per hex

use crate::error::{RulesError, RulesResult};
use crate::figure::FigureId;
use crate::hex::HexCoord;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Base terrain of a hex
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    #[default]
    Normal,
    Difficult,
    Hazard,
    Obstacle,
    Wall,
    Water,
    Ice,
    Lava,
}

impl Terrain {
    /// Walls and obstacles block sight
    pub fn blocks_sight(self) -> bool {
        matches!(self, Terrain::Wall | Terrain::Obstacle)
    }

    pub fn is_hazardous(self) -> bool {
        matches!(self, Terrain::Hazard | Terrain::Lava)
    }
}

/// Map overlay tile sitting on top of the terrain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overlay {
    Trap,
    Treasure,
    Door,
    PressurePlate,
    Altar,
    Stairs,
}

/// One hex of the battlefield
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardHex {
    pub coord: HexCoord,
    #[serde(default)]
    pub terrain: Terrain,
    #[serde(default)]
    pub overlay: Option<Overlay>,
    /// At most one figure per hex
    #[serde(default)]
    pub occupant: Option<FigureId>,
    #[serde(default)]
    pub items: BTreeSet<String>,
    #[serde(default)]
    pub tokens: BTreeSet<String>,
}

impl BoardHex {
    pub fn new(coord: HexCoord, terrain: Terrain) -> Self {
        Self {
            coord,
            terrain,
            overlay: None,
            occupant: None,
            items: BTreeSet::new(),
            tokens: BTreeSet::new(),
        }
    }

    /// Hexes a monster would rather not walk through: hazardous terrain,
    /// lava and traps.
    pub fn is_hazardous(&self) -> bool {
        self.terrain.is_hazardous() || self.overlay == Some(Overlay::Trap)
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}

/// Board: hex -> tile (sparse representation)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<BoardHex>", into = "Vec<BoardHex>")]
pub struct Board {
    hexes: FxHashMap<HexCoord, BoardHex>,
}

impl Board {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    pub fn new() -> Self {
        Self::default()
    }

    /// Axial rhombus `0..width × 0..height` of normal terrain
    pub fn rectangle(width: i32, height: i32) -> Self {
        let mut board = Self::new();
        for r in 0..height {
            for q in 0..width {
                board.insert(BoardHex::new(HexCoord::new(q, r), Terrain::Normal));
            }
        }
        board
    }

    /// Hexagon of normal terrain centered on the origin
    pub fn hexagon(radius: u32) -> Self {
        let mut board = Self::new();
        for coord in HexCoord::new(0, 0).spiral(radius) {
            board.insert(BoardHex::new(coord, Terrain::Normal));
        }
        board
    }

    /// Add or replace a hex
    pub fn insert(&mut self, hex: BoardHex) {
        self.hexes.insert(hex.coord, hex);
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn get(&self, coord: HexCoord) -> Option<&BoardHex> {
        self.hexes.get(&coord)
    }

    pub fn get_mut(&mut self, coord: HexCoord) -> Option<&mut BoardHex> {
        self.hexes.get_mut(&coord)
    }

    /// Like [`Board::get`] but reports an off-board coordinate as an error
    pub fn hex(&self, coord: HexCoord) -> RulesResult<&BoardHex> {
        self.get(coord).ok_or(RulesError::OutOfBounds(coord))
    }

    pub fn contains(&self, coord: HexCoord) -> bool {
        self.hexes.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.hexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hexes.is_empty()
    }

    pub fn terrain(&self, coord: HexCoord) -> Option<Terrain> {
        self.get(coord).map(|h| h.terrain)
    }

    pub fn occupant(&self, coord: HexCoord) -> Option<FigureId> {
        self.get(coord).and_then(|h| h.occupant)
    }

    pub fn is_occupied(&self, coord: HexCoord) -> bool {
        self.occupant(coord).is_some()
    }

    /// Iterate hexes (unordered)
    pub fn hexes(&self) -> impl Iterator<Item = &BoardHex> + '_ {
        self.hexes.values()
    }

    /// Occupied hexes with their occupant
    pub fn occupied(&self) -> impl Iterator<Item = (HexCoord, FigureId)> + '_ {
        self.hexes
            .values()
            .filter_map(|h| h.occupant.map(|id| (h.coord, id)))
    }

    // ========================================================================
    // MUTATION
    // ========================================================================

    pub fn set_terrain(&mut self, coord: HexCoord, terrain: Terrain) -> RulesResult<()> {
        let hex = self.get_mut(coord).ok_or(RulesError::OutOfBounds(coord))?;
        hex.terrain = terrain;
        Ok(())
    }

    pub fn set_overlay(&mut self, coord: HexCoord, overlay: Option<Overlay>) -> RulesResult<()> {
        let hex = self.get_mut(coord).ok_or(RulesError::OutOfBounds(coord))?;
        hex.overlay = overlay;
        Ok(())
    }

    /// Put a figure on an empty hex
    pub fn place(&mut self, figure: FigureId, coord: HexCoord) -> RulesResult<()> {
        let hex = self.get_mut(coord).ok_or(RulesError::OutOfBounds(coord))?;
        if let Some(other) = hex.occupant {
            if other != figure {
                return Err(RulesError::InvalidTarget(format!(
                    "{} is already occupied by {}",
                    coord, other
                )));
            }
        }
        hex.occupant = Some(figure);
        Ok(())
    }

    /// Clear the occupant of a hex, returning who was there
    pub fn vacate(&mut self, coord: HexCoord) -> Option<FigureId> {
        self.get_mut(coord).and_then(|h| h.occupant.take())
    }

    /// Move whoever stands on `from` to `to`
    pub fn move_occupant(&mut self, from: HexCoord, to: HexCoord) -> RulesResult<()> {
        if from == to {
            return Ok(());
        }
        let figure = self
            .occupant(from)
            .ok_or_else(|| RulesError::InvalidTarget(format!("nobody stands on {}", from)))?;
        self.place(figure, to)?;
        self.vacate(from);
        Ok(())
    }
}

impl From<Vec<BoardHex>> for Board {
    fn from(hexes: Vec<BoardHex>) -> Self {
        let mut board = Board::new();
        for hex in hexes {
            board.insert(hex);
        }
        board
    }
}

impl From<Board> for Vec<BoardHex> {
    fn from(board: Board) -> Self {
        let mut hexes: Vec<BoardHex> = board.hexes.into_values().collect();
        hexes.sort_by_key(|h| (h.coord.r, h.coord.q));
        hexes
    }
}
