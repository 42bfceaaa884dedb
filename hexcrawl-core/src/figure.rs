//! Figures: player characters and monsters

use crate::condition::{ConditionSet, HealInterception};
use crate::hex::HexCoord;
use crate::pathfinding::PathOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Figure identifier, unique within a session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FigureId(pub u32);

impl fmt::Display for FigureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side a figure fights on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureType {
    Character,
    Monster,
}

/// Movement and attack numbers used by the monster director and auto-play
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatProfile {
    pub move_value: u32,
    pub attack: u32,
    /// 0 = melee (adjacent only)
    pub range: u32,
    pub flying: bool,
    pub jumping: bool,
    pub ignores_invisibility: bool,
    /// Innate shield
    pub shield: u32,
    pub pierce: u32,
}

impl CombatProfile {
    pub fn new(move_value: u32, attack: u32, range: u32) -> Self {
        Self {
            move_value,
            attack,
            range,
            ..Default::default()
        }
    }

    pub fn flying(mut self) -> Self {
        self.flying = true;
        self
    }

    pub fn jumping(mut self) -> Self {
        self.jumping = true;
        self
    }

    pub fn with_shield(mut self, shield: u32) -> Self {
        self.shield = shield;
        self
    }

    pub fn is_ranged(&self) -> bool {
        self.range > 0
    }

    /// Distance at which this profile can strike: melee reaches adjacent hexes
    pub fn reach(&self) -> u32 {
        self.range.max(1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterInfo {
    pub name: String,
    pub class: String,
    pub level: u32,
    #[serde(default)]
    pub profile: CombatProfile,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterInfo {
    pub name: String,
    #[serde(default)]
    pub elite: bool,
    pub profile: CombatProfile,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FigureKind {
    Character(CharacterInfo),
    Monster(MonsterInfo),
}

/// Result of damage landing on a figure
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageReport {
    /// Damage after Brittle, before clamping to remaining hit points
    pub dealt: u32,
    pub killed: bool,
}

/// Result of a heal landing on a figure
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HealReport {
    pub restored: u32,
    pub interception: HealInterception,
}

/// A figure on (or removed from) the battlefield
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Figure {
    pub id: FigureId,
    pub kind: FigureKind,
    #[serde(default)]
    pub position: Option<HexCoord>,
    pub current_hp: u32,
    pub max_hp: u32,
    #[serde(default)]
    pub conditions: ConditionSet,
    /// Temporary shield from abilities; cleared at end of round
    #[serde(default)]
    pub shield: u32,
    #[serde(default)]
    pub exhausted: bool,
}

impl Figure {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    pub fn character(id: FigureId, name: &str, class: &str, level: u32, max_hp: u32, profile: CombatProfile) -> Self {
        Self::new(
            id,
            FigureKind::Character(CharacterInfo {
                name: name.to_string(),
                class: class.to_string(),
                level,
                profile,
            }),
            max_hp,
        )
    }

    pub fn monster(id: FigureId, name: &str, elite: bool, max_hp: u32, profile: CombatProfile) -> Self {
        Self::new(
            id,
            FigureKind::Monster(MonsterInfo {
                name: name.to_string(),
                elite,
                profile,
            }),
            max_hp,
        )
    }

    fn new(id: FigureId, kind: FigureKind, max_hp: u32) -> Self {
        Self {
            id,
            kind,
            position: None,
            current_hp: max_hp,
            max_hp,
            conditions: ConditionSet::new(),
            shield: 0,
            exhausted: false,
        }
    }

    pub fn at(mut self, position: HexCoord) -> Self {
        self.position = Some(position);
        self
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn figure_type(&self) -> FigureType {
        match self.kind {
            FigureKind::Character(_) => FigureType::Character,
            FigureKind::Monster(_) => FigureType::Monster,
        }
    }

    pub fn is_monster(&self) -> bool {
        self.figure_type() == FigureType::Monster
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            FigureKind::Character(info) => &info.name,
            FigureKind::Monster(info) => &info.name,
        }
    }

    pub fn profile(&self) -> &CombatProfile {
        match &self.kind {
            FigureKind::Character(info) => &info.profile,
            FigureKind::Monster(info) => &info.profile,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0 && !self.exhausted
    }

    /// Alive and standing on the board
    pub fn is_active(&self) -> bool {
        self.is_alive() && self.position.is_some()
    }

    pub fn is_enemy_of(&self, other: &Figure) -> bool {
        self.figure_type() != other.figure_type()
    }

    /// Innate plus temporary shield
    pub fn total_shield(&self) -> u32 {
        self.profile().shield + self.shield
    }

    /// Movement options derived from the combat profile
    pub fn path_options(&self) -> PathOptions {
        let profile = self.profile();
        PathOptions {
            range: profile.move_value,
            can_fly: profile.flying,
            can_jump: profile.jumping,
            ..PathOptions::default()
        }
    }

    // ========================================================================
    // HIT POINTS
    // ========================================================================

    /// Apply damage through the condition engine (Brittle). A figure at 0 HP
    /// is dead; the caller removes it from the board.
    pub fn suffer_damage(&mut self, amount: u32) -> DamageReport {
        let dealt = self.conditions.on_damage(amount);
        self.current_hp = self.current_hp.saturating_sub(dealt);
        DamageReport {
            dealt,
            killed: self.current_hp == 0,
        }
    }

    /// Heal: clears Poison and Wound. If Poison was present the heal only cures.
    pub fn heal(&mut self, amount: u32) -> HealReport {
        let interception = self.conditions.on_heal();
        let restored = if interception.blocks_healing {
            0
        } else {
            amount.min(self.max_hp.saturating_sub(self.current_hp))
        };
        self.current_hp += restored;
        HealReport {
            restored,
            interception,
        }
    }

    /// Take the figure off the board, returning where it stood
    pub fn remove_from_board(&mut self) -> Option<HexCoord> {
        self.position.take()
    }
}
