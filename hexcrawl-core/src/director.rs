//! Monster director: focus and destination selection
//!
//! Both choices reduce to a composite sort key compared as a tuple, so every
//! tie is broken the same way on every run.

use crate::board::Board;
use crate::condition::ConditionKind;
use crate::figure::{Figure, FigureId};
use crate::hex::HexCoord;
use crate::pathfinding::{distance_field, find_path, reachable, PathOptions, UNREACHABLE};
use crate::visibility::{has_line_of_sight_with, SightRule};

/// How a monster sizes up one enemy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FocusCandidate {
    pub figure: FigureId,
    /// An attack hex is within this turn's movement and the monster may attack
    pub can_attack: bool,
    /// Least path cost to a hex from which the enemy can be attacked
    pub movement_required: u32,
    /// Hazardous hexes crossed on that path
    pub hazards_in_path: u32,
    /// Enemy's initiative this round, lower = earlier
    pub initiative: u32,
}

impl FocusCandidate {
    /// Ascending: attackable first, then least movement, fewest hazards,
    /// earliest initiative, lowest id
    pub fn sort_key(&self) -> (bool, u32, u32, u32, FigureId) {
        (
            !self.can_attack,
            self.movement_required,
            self.hazards_in_path,
            self.initiative,
            self.figure,
        )
    }
}

/// Where a monster should move this turn
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    pub hex: HexCoord,
    /// Start included
    pub path: Vec<HexCoord>,
    pub cost: u32,
    /// The focus can be attacked from `hex`
    pub in_attack_position: bool,
}

/// Hexes from which `attacker` can hit a figure standing on `target`, in
/// spiral order around the target. `board` must not have the attacker on it.
pub fn attack_hexes(attacker: &Figure, target: HexCoord, board: &Board, rule: SightRule) -> Vec<HexCoord> {
    let options = attacker.path_options();
    target
        .spiral(attacker.profile().reach())
        .into_iter()
        .skip(1)
        .filter(|&h| board.get(h).is_some_and(|hex| options.can_end_on(hex)))
        .filter(|&h| has_line_of_sight_with(rule, h, target, board))
        .collect()
}

/// Movement points usable this turn
fn movement_budget(monster: &Figure) -> u32 {
    if monster.conditions.has(ConditionKind::Immobilize) || monster.conditions.has(ConditionKind::Stun) {
        0
    } else {
        monster.profile().move_value
    }
}

fn hazards_on_path(steps: &[HexCoord], board: &Board, options: &PathOptions) -> u32 {
    if options.can_fly {
        return 0;
    }
    let counted: &[HexCoord] = if options.can_jump {
        // only the landing hex
        steps.get(steps.len().saturating_sub(1)..).unwrap_or(&[])
    } else {
        steps
    };
    counted
        .iter()
        .filter(|&&h| board.get(h).is_some_and(|hex| hex.is_hazardous()))
        .count() as u32
}

/// Copy of the board with the monster lifted off its hex
fn without(monster: &Figure, board: &Board) -> Board {
    let mut scratch = board.clone();
    if let Some(pos) = monster.position {
        scratch.vacate(pos);
    }
    scratch
}

fn evaluate(monster: &Figure, enemy: &Figure, initiative: u32, board: &Board, rule: SightRule) -> Option<FocusCandidate> {
    let start = monster.position?;
    let target = enemy.position?;
    let options = monster.path_options().with_range(u32::MAX);

    let (movement_required, hazards_in_path) = attack_hexes(monster, target, board, rule)
        .into_iter()
        .filter_map(|hex| {
            let path = find_path(start, hex, board, &options);
            path.valid
                .then(|| (path.cost, hazards_on_path(path.steps(), board, &options)))
        })
        .min()?;

    let can_attack =
        movement_required <= movement_budget(monster) && monster.conditions.check_attack(monster.id).is_ok();

    Some(FocusCandidate {
        figure: enemy.id,
        can_attack,
        movement_required,
        hazards_in_path,
        initiative,
    })
}

/// Score every eligible enemy, best first.
///
/// Dead, off-board and friendly figures are skipped, as are invisible ones
/// unless the monster ignores invisibility. Enemies with no hex from which
/// they could ever be attacked are left out.
pub fn rank_focus(monster: &Figure, candidates: &[(&Figure, u32)], board: &Board, rule: SightRule) -> Vec<FocusCandidate> {
    let scratch = without(monster, board);
    let ignores_invisibility = monster.profile().ignores_invisibility;
    let mut ranked: Vec<FocusCandidate> = candidates
        .iter()
        .filter(|(enemy, _)| enemy.is_active() && enemy.is_enemy_of(monster))
        .filter(|(enemy, _)| enemy.conditions.is_targetable(ignores_invisibility))
        .filter_map(|&(enemy, initiative)| evaluate(monster, enemy, initiative, &scratch, rule))
        .collect();
    ranked.sort_by_key(FocusCandidate::sort_key);
    ranked
}

/// The enemy `monster` focuses on, if any
pub fn select_focus(monster: &Figure, candidates: &[(&Figure, u32)], board: &Board, rule: SightRule) -> Option<FigureId> {
    let focus = rank_focus(monster, candidates, board, rule).first().map(|c| c.figure);
    tracing::debug!(monster = %monster.id, focus = ?focus, "focus selected");
    focus
}

/// Pick the hex `monster` should end its move on to attack `focus`.
///
/// Candidates are every hex reachable with the monster's move. Ascending key:
/// remaining cost to an attack hex, a ranged monster ending adjacent to the
/// focus (it would attack with disadvantage), movement spent, then spiral
/// order around the monster.
pub fn select_destination(monster: &Figure, focus: &Figure, board: &Board, rule: SightRule) -> Option<Destination> {
    let start = monster.position?;
    let target = focus.position?;
    let scratch = without(monster, board);

    let goals = attack_hexes(monster, target, &scratch, rule);
    let options = monster.path_options();
    let field = distance_field(&goals, &scratch, &options.with_range(u32::MAX));
    let reach = reachable(start, &scratch, &options.with_range(movement_budget(monster)));
    let ranged = monster.profile().is_ranged();

    let (hex, cost, remaining) = reach
        .destinations()
        .into_iter()
        .enumerate()
        .filter_map(|(order, hex)| {
            let cost = reach.cost(hex)?;
            let remaining = field.get(&hex).copied().unwrap_or(UNREACHABLE);
            let adjacent_penalty = u32::from(ranged && hex.is_adjacent(target));
            Some(((remaining, adjacent_penalty, cost, order), hex))
        })
        .min()
        .map(|((remaining, _, cost, _), hex)| (hex, cost, remaining))?;

    let path = reach.path_to(hex)?;
    Some(Destination {
        hex,
        path,
        cost,
        in_attack_position: remaining == 0,
    })
}
