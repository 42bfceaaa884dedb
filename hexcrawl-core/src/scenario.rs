//! Scenario level scaling and scenario setup files

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardHex};
use crate::config::RulesConfig;
use crate::error::RulesResult;
use crate::figure::{Figure, FigureId, FigureKind, FigureType};
use crate::initiative::InitiativeEntry;
use crate::modifier::DeckModification;
use crate::session::Session;

pub const MAX_SCENARIO_LEVEL: u32 = 7;

/// Gold per coin token, indexed by scenario level
const GOLD_CONVERSION: [u32; 8] = [2, 2, 3, 3, 4, 4, 5, 6];

/// Recommended scenario level for a party.
///
/// Half the average character level, rounded up. A party of five plays at
/// half the average rounded down, plus two. Always within `0..=7`.
pub fn scenario_level(party_levels: &[u32]) -> u32 {
    if party_levels.is_empty() {
        return 0;
    }
    let sum: u32 = party_levels.iter().sum();
    let twice_size = 2 * party_levels.len() as u32;
    let level = if party_levels.len() == 5 {
        sum / twice_size + 2
    } else {
        sum.div_ceil(twice_size)
    };
    level.min(MAX_SCENARIO_LEVEL)
}

/// Derived numbers for one scenario level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    pub monster_level: u32,
    pub trap_damage: u32,
    pub hazard_damage: u32,
    pub gold_conversion: u32,
    pub bonus_experience: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioLevel(u32);

impl ScenarioLevel {
    /// Clamped to the playable range
    pub fn new(level: u32) -> Self {
        Self(level.min(MAX_SCENARIO_LEVEL))
    }

    pub fn for_party(party_levels: &[u32]) -> Self {
        Self(scenario_level(party_levels))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn stats(self) -> LevelStats {
        let level = self.0;
        LevelStats {
            monster_level: level,
            trap_damage: 2 + level,
            hazard_damage: 1 + level.div_ceil(3),
            gold_conversion: GOLD_CONVERSION[level as usize],
            bonus_experience: 4 + 2 * level,
        }
    }
}

// ============================================================================
// SETUP FILES
// ============================================================================

/// Base outline of a board before per-hex overrides
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardShape {
    Rectangle { width: i32, height: i32 },
    Hexagon { radius: u32 },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayout {
    #[serde(default)]
    pub shape: Option<BoardShape>,
    /// Added to the shape, replacing any hex with the same coordinate
    #[serde(default)]
    pub hexes: Vec<BoardHex>,
}

impl BoardLayout {
    pub fn build(&self) -> Board {
        let mut board = match self.shape {
            Some(BoardShape::Rectangle { width, height }) => Board::rectangle(width, height),
            Some(BoardShape::Hexagon { radius }) => Board::hexagon(radius),
            None => Board::new(),
        };
        for hex in &self.hexes {
            board.insert(hex.clone());
        }
        board
    }
}

/// One figure in a setup file with its round initiative and deck perks
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub figure: Figure,
    #[serde(default)]
    pub initiative: u32,
    #[serde(default)]
    pub perks: Vec<DeckModification>,
}

/// Scenario setup as loaded from JSON
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSetup {
    pub name: String,
    pub board: BoardLayout,
    /// Fixed level; computed from the party when absent
    #[serde(default)]
    pub level: Option<u32>,
    pub roster: Vec<RosterEntry>,
    #[serde(default)]
    pub rules: RulesConfig,
}

impl ScenarioSetup {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let setup: ScenarioSetup =
            serde_json::from_str(&content).with_context(|| format!("parsing scenario {}", path.display()))?;
        tracing::info!(name = %setup.name, figures = setup.roster.len(), "scenario loaded");
        Ok(setup)
    }

    pub fn party_levels(&self) -> Vec<u32> {
        self.roster
            .iter()
            .filter_map(|entry| match &entry.figure.kind {
                FigureKind::Character(info) => Some(info.level),
                FigureKind::Monster(_) => None,
            })
            .collect()
    }

    pub fn scenario_level(&self) -> ScenarioLevel {
        match self.level {
            Some(level) => ScenarioLevel::new(level),
            None => ScenarioLevel::for_party(&self.party_levels()),
        }
    }

    /// Initiative entries using each figure's listed initiative
    pub fn initiative_entries(&self) -> Vec<InitiativeEntry> {
        self.roster
            .iter()
            .map(|entry| InitiativeEntry::new(entry.figure.id, entry.figure.figure_type(), entry.initiative))
            .collect()
    }

    pub fn character_ids(&self) -> impl Iterator<Item = (FigureId, u32)> + '_ {
        self.roster
            .iter()
            .filter(|entry| entry.figure.figure_type() == FigureType::Character)
            .map(|entry| (entry.figure.id, entry.initiative))
    }

    /// Session under the file's own rules
    pub fn build(&self) -> RulesResult<Session> {
        self.build_with(self.rules.clone())
    }

    pub fn build_with(&self, config: RulesConfig) -> RulesResult<Session> {
        let mut session = Session::new(self.board.build(), self.scenario_level(), config);
        for entry in &self.roster {
            session.add_figure(entry.figure.clone())?;
            if !entry.perks.is_empty() {
                session.modify_deck(entry.figure.id, &entry.perks)?;
            }
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Terrain;
    use crate::figure::CombatProfile;
    use crate::hex::HexCoord;
    use crate::modifier::ModifierCard;

    #[test]
    fn test_base_rule_rounds_half_up() {
        assert_eq!(scenario_level(&[1, 1]), 1);
        assert_eq!(scenario_level(&[3, 4]), 2);
        assert_eq!(scenario_level(&[4, 4, 4, 4]), 2);
        assert_eq!(scenario_level(&[9, 9, 9]), 5);
        assert_eq!(scenario_level(&[]), 0);
    }

    #[test]
    fn test_five_player_rule() {
        // average 3.6: floor(1.8) + 2
        assert_eq!(scenario_level(&[3, 4, 2, 5, 4]), 3);
        for level in 1..=9 {
            let party = [level; 5];
            assert_eq!(scenario_level(&party), (level / 2 + 2).min(MAX_SCENARIO_LEVEL));
        }
        // four players with the same average get no bump
        assert_eq!(scenario_level(&[4, 4, 4, 4]), 2);
    }

    #[test]
    fn test_level_clamped() {
        assert_eq!(scenario_level(&[20, 20]), MAX_SCENARIO_LEVEL);
        assert_eq!(ScenarioLevel::new(12).value(), MAX_SCENARIO_LEVEL);
    }

    #[test]
    fn test_level_stats() {
        let stats = ScenarioLevel::new(0).stats();
        assert_eq!(stats.trap_damage, 2);
        assert_eq!(stats.hazard_damage, 1);
        assert_eq!(stats.bonus_experience, 4);

        let stats = ScenarioLevel::new(4).stats();
        assert_eq!(stats.monster_level, 4);
        assert_eq!(stats.trap_damage, 6);
        assert_eq!(stats.hazard_damage, 3);
        assert_eq!(stats.gold_conversion, 4);
        assert_eq!(stats.bonus_experience, 12);

        assert_eq!(ScenarioLevel::new(7).stats().gold_conversion, 6);
    }

    #[test]
    fn test_setup_from_json() {
        let json = r#"{
            "name": "Crossroads",
            "board": {
                "shape": {"type": "rectangle", "width": 4, "height": 3},
                "hexes": [{"coord": {"q": 2, "r": 1}, "terrain": "wall"}]
            },
            "roster": [
                {
                    "figure": {
                        "id": 1,
                        "kind": {"type": "character", "name": "Brute", "class": "brute", "level": 3,
                                 "profile": {"move_value": 3, "attack": 3}},
                        "position": {"q": 0, "r": 0},
                        "current_hp": 10,
                        "max_hp": 10
                    },
                    "initiative": 25,
                    "perks": [{"op": "remove", "cards": [{"value": {"add": -1}}, {"value": {"add": -1}}]}]
                },
                {
                    "figure": {
                        "id": 10,
                        "kind": {"type": "monster", "name": "Bandit Guard",
                                 "profile": {"move_value": 2, "attack": 2}},
                        "position": {"q": 3, "r": 2},
                        "current_hp": 5,
                        "max_hp": 5
                    },
                    "initiative": 40
                }
            ]
        }"#;
        let setup: ScenarioSetup = serde_json::from_str(json).unwrap();
        assert_eq!(setup.party_levels(), vec![3]);
        assert_eq!(setup.scenario_level().value(), 2);

        let session = setup.build().unwrap();
        assert_eq!(session.board().terrain(HexCoord::new(2, 1)), Some(Terrain::Wall));
        assert_eq!(session.board().occupant(HexCoord::new(3, 2)), Some(FigureId(10)));
        assert_eq!(session.deck(FigureId(1)).unwrap().len(), 18);
        assert_eq!(session.deck(FigureId(10)).unwrap().len(), 20);
    }

    #[test]
    fn test_bad_perk_fails_build() {
        let mut setup = ScenarioSetup {
            name: "t".into(),
            board: BoardLayout {
                shape: Some(BoardShape::Hexagon { radius: 2 }),
                hexes: Vec::new(),
            },
            level: Some(1),
            roster: Vec::new(),
            rules: RulesConfig::default(),
        };
        setup.roster.push(RosterEntry {
            figure: Figure::character(
                FigureId(1),
                "Scoundrel",
                "scoundrel",
                1,
                8,
                CombatProfile::new(4, 2, 0),
            ),
            initiative: 10,
            perks: vec![DeckModification::Remove {
                cards: vec![ModifierCard::plus(3)],
            }],
        });
        assert!(setup.build().is_err());
    }
}
