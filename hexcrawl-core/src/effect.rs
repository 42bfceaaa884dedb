//! Ability effects as a closed set of tagged variants
//!
//! Sessions apply these through `Session::apply_effect`. Forced movement is
//! computed here as a pure function of the board.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Terrain};
use crate::condition::{ApplyOutcome, ConditionKind, DurationPolicy};
use crate::element::Element;
use crate::figure::{DamageReport, HealReport};
use crate::hex::HexCoord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", content = "element", rename_all = "snake_case")]
pub enum ElementOp {
    Infuse(Element),
    Consume(Element),
}

/// One effect of an ability card
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// Direct damage; shields only apply to attacks
    Damage { amount: u32 },
    Heal { amount: u32 },
    Push { distance: u32 },
    Pull { distance: u32 },
    ConditionApply {
        condition: ConditionKind,
        #[serde(default)]
        duration: Option<DurationPolicy>,
    },
    ElementOp { op: ElementOp },
    /// Temporary shield until end of round
    Shield { amount: u32 },
}

/// What applying an effect did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EffectOutcome {
    Damaged(DamageReport),
    Healed(HealReport),
    /// Hexes entered, in order; empty if the target could not be moved
    Moved(Vec<HexCoord>),
    Condition(ApplyOutcome),
    /// For consumption, whether the element was available
    Element { element: Element, succeeded: bool },
    Shielded(u32),
}

/// Hexes a figure at `target` passes through when pushed (`away`) or pulled
/// from `source`, up to `distance` steps.
///
/// Each step goes to the first neighbor in canonical direction order that is
/// on the board, free, not a wall or obstacle, and strictly farther from
/// (push) or closer to (pull) the source. Movement stops at the first step
/// with no such hex.
pub fn forced_path(board: &Board, source: HexCoord, target: HexCoord, distance: u32, away: bool) -> Vec<HexCoord> {
    let mut path = Vec::new();
    let mut current = target;
    for _ in 0..distance {
        let here = current.distance_to(source);
        let next = current.neighbors().into_iter().find(|&n| {
            let Some(hex) = board.get(n) else {
                return false;
            };
            let open = !hex.is_occupied() && !matches!(hex.terrain, Terrain::Wall | Terrain::Obstacle);
            let there = n.distance_to(source);
            open && if away { there > here } else { there < here }
        });
        match next {
            Some(n) => {
                path.push(n);
                current = n;
            }
            None => break,
        }
    }
    path
}
