//! HEXCRAWL Core - Tactical hex combat rules engine
//!
//! This crate provides the rules for cooperative hex-grid skirmishes:
//! - Hex geometry (axial coordinates, rings, spirals, lines)
//! - Boards with terrain, overlays and occupants
//! - Pathfinding with flying, jumping and difficult terrain
//! - Line of sight and target selection
//! - Attack modifier decks with advantage and disadvantage
//! - Conditions, elements and initiative
//! - Monster focus and movement
//! - Scenario sessions that own all mutable state

pub mod hex;
pub mod board;
pub mod figure;
pub mod condition;
pub mod element;
pub mod modifier;
pub mod combat;
pub mod effect;
pub mod pathfinding;
pub mod visibility;
pub mod director;
pub mod initiative;
pub mod scenario;
pub mod session;
pub mod config;
pub mod error;

// Re-exports for convenient access
pub use hex::{HexCoord, DIRECTIONS};
pub use board::{Board, BoardHex, Overlay, Terrain};
pub use figure::{CombatProfile, Figure, FigureId, FigureKind, FigureType};
pub use condition::{Condition, ConditionKind, ConditionSet, DurationPolicy};
pub use element::{Element, ElementState, ElementTracker};
pub use modifier::{AttackModifierDeck, DeckModification, ModifierCard, ModifierValue};
pub use combat::{resolve_attack, AttackEffect, AttackResult};
pub use effect::{Effect, EffectOutcome, ElementOp};
pub use pathfinding::{find_path, reachable, PathOptions, PathResult};
pub use visibility::{has_line_of_sight, valid_targets, SightRule};
pub use director::{select_destination, select_focus};
pub use initiative::{InitiativeEntry, InitiativeOrder};
pub use scenario::{scenario_level, ScenarioLevel, ScenarioSetup};
pub use session::{ScenarioStatus, Session, TurnActions};
pub use config::RulesConfig;
pub use error::{RulesError, RulesResult};
