//! Scenario session: sole owner of board, figures, decks and elements
//!
//! Commands check everything they need against the current state before they
//! change anything, so a refused command leaves the session as it was.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Overlay};
use crate::combat::{resolve_attack, AttackEffect, AttackResult};
use crate::condition::{Condition, ConditionKind};
use crate::config::RulesConfig;
use crate::director;
use crate::effect::{forced_path, Effect, EffectOutcome, ElementOp};
use crate::element::ElementTracker;
use crate::error::{RulesError, RulesResult};
use crate::figure::{DamageReport, Figure, FigureId, FigureType};
use crate::hex::HexCoord;
use crate::initiative::{InitiativeEntry, InitiativeOrder};
use crate::modifier::{AttackModifierDeck, DeckModification};
use crate::pathfinding::{find_path, PathOptions};
use crate::scenario::ScenarioLevel;
use crate::visibility;

/// Initiative used for enemies that are not in this round's order
const UNSET_INITIATIVE: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Ongoing,
    /// Every monster is gone
    Victory,
    /// Every character is dead or exhausted
    Defeat,
}

/// What happened when a figure's turn began
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Poison and wound damage taken
    pub damage: u32,
    pub killed: bool,
    /// Stunned or killed: the figure does nothing this turn
    pub skip_turn: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveReport {
    pub path: Vec<HexCoord>,
    pub cost: u32,
    /// Trap and hazard damage taken along the way
    pub damage: u32,
    pub killed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttackReport {
    pub target: FigureId,
    pub result: AttackResult,
    pub damage: DamageReport,
    /// Hexes the target was pushed or pulled through
    pub forced: Vec<HexCoord>,
    pub reshuffled: bool,
}

/// Everything an automatically played turn did
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnActions {
    pub figure: FigureId,
    pub focus: Option<FigureId>,
    pub moved: Option<MoveReport>,
    pub attack: Option<AttackReport>,
}

#[derive(Clone, Debug)]
pub struct Session {
    board: Board,
    figures: BTreeMap<FigureId, Figure>,
    decks: FxHashMap<FigureId, AttackModifierDeck>,
    elements: ElementTracker,
    initiative: InitiativeOrder,
    round: u32,
    level: ScenarioLevel,
    config: RulesConfig,
    rng: ChaCha8Rng,
}

impl Session {
    // ========================================================================
    // SETUP
    // ========================================================================

    pub fn new(board: Board, level: ScenarioLevel, config: RulesConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.effective_seed());
        Self {
            board,
            figures: BTreeMap::new(),
            decks: FxHashMap::default(),
            elements: ElementTracker::new(),
            initiative: InitiativeOrder::default(),
            round: 0,
            level,
            config,
            rng,
        }
    }

    /// Add a figure with a freshly shuffled standard deck, placing it on the
    /// board if it has a position
    pub fn add_figure(&mut self, figure: Figure) -> RulesResult<()> {
        if self.figures.contains_key(&figure.id) {
            return Err(RulesError::InvalidTarget(format!(
                "{} is already in the session",
                figure.id
            )));
        }
        if let Some(pos) = figure.position {
            self.board.place(figure.id, pos)?;
        }
        let deck = AttackModifierDeck::standard_shuffled(&mut self.rng);
        self.decks.insert(figure.id, deck);
        tracing::debug!(figure = %figure.id, name = figure.name(), "figure added");
        self.figures.insert(figure.id, figure);
        Ok(())
    }

    /// Replace a figure's deck outright
    pub fn set_deck(&mut self, id: FigureId, deck: AttackModifierDeck) -> RulesResult<()> {
        let slot = self.decks.get_mut(&id).ok_or(RulesError::UnknownFigure(id))?;
        *slot = deck;
        Ok(())
    }

    /// Apply perk and item edits in order, then reshuffle. All or nothing.
    pub fn modify_deck(&mut self, id: FigureId, modifications: &[DeckModification]) -> RulesResult<()> {
        let deck = self.decks.get_mut(&id).ok_or(RulesError::UnknownFigure(id))?;
        let mut next = deck.clone();
        for modification in modifications {
            next.apply_modification(modification)?;
        }
        next.reshuffle(&mut self.rng);
        *deck = next;
        Ok(())
    }

    pub fn add_bless(&mut self, id: FigureId, count: usize) -> RulesResult<usize> {
        let deck = self.decks.get_mut(&id).ok_or(RulesError::UnknownFigure(id))?;
        Ok(deck.add_bless(count, self.config.max_bless, &mut self.rng))
    }

    pub fn add_curse(&mut self, id: FigureId, count: usize) -> RulesResult<usize> {
        let deck = self.decks.get_mut(&id).ok_or(RulesError::UnknownFigure(id))?;
        Ok(deck.add_curse(count, self.config.max_curse, &mut self.rng))
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn level(&self) -> ScenarioLevel {
        self.level
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn elements(&self) -> &ElementTracker {
        &self.elements
    }

    pub fn initiative(&self) -> &InitiativeOrder {
        &self.initiative
    }

    pub fn figure(&self, id: FigureId) -> RulesResult<&Figure> {
        self.figures.get(&id).ok_or(RulesError::UnknownFigure(id))
    }

    pub fn figures(&self) -> impl Iterator<Item = &Figure> + '_ {
        self.figures.values()
    }

    pub fn deck(&self, id: FigureId) -> RulesResult<&AttackModifierDeck> {
        self.decks.get(&id).ok_or(RulesError::UnknownFigure(id))
    }

    fn figure_mut(&mut self, id: FigureId) -> RulesResult<&mut Figure> {
        self.figures.get_mut(&id).ok_or(RulesError::UnknownFigure(id))
    }

    /// A figure that is alive and on the board
    fn active(&self, id: FigureId) -> RulesResult<&Figure> {
        let figure = self.figure(id)?;
        if figure.is_active() {
            Ok(figure)
        } else {
            Err(RulesError::illegal(id, "not on the board"))
        }
    }

    fn position_of(&self, id: FigureId) -> RulesResult<HexCoord> {
        self.active(id)?
            .position
            .ok_or_else(|| RulesError::illegal(id, "not on the board"))
    }

    fn remove_figure(&mut self, id: FigureId) {
        if let Some(figure) = self.figures.get_mut(&id) {
            if let Some(pos) = figure.remove_from_board() {
                self.board.vacate(pos);
            }
        }
        self.initiative.remove(id);
        tracing::info!(figure = %id, round = self.round, "figure removed from the board");
    }

    // ========================================================================
    // ROUND FLOW
    // ========================================================================

    /// Start a new round with the given initiatives. Figures that are not on
    /// the board are left out.
    pub fn begin_round(&mut self, entries: Vec<InitiativeEntry>) {
        let entries = entries
            .into_iter()
            .filter(|e| self.figures.get(&e.figure).is_some_and(Figure::is_active))
            .collect();
        self.initiative = InitiativeOrder::new(entries);
        self.round += 1;
        tracing::info!(round = self.round, figures = self.initiative.len(), "round started");
    }

    /// Next figure in initiative order that is still on the board
    pub fn next_figure(&mut self) -> Option<FigureId> {
        while let Some(id) = self.initiative.advance() {
            if self.figures.get(&id).is_some_and(Figure::is_active) {
                return Some(id);
            }
        }
        None
    }

    /// Turn-start triggers: Poison and Wound damage, Stun
    pub fn start_turn(&mut self, id: FigureId) -> RulesResult<TurnReport> {
        self.active(id)?;
        let figure = self.figure_mut(id)?;
        let start = figure.conditions.start_turn();
        let damage = if start.damage > 0 {
            figure.suffer_damage(start.damage)
        } else {
            DamageReport::default()
        };
        if damage.killed {
            self.remove_figure(id);
        }
        tracing::debug!(figure = %id, damage = damage.dealt, stunned = start.skip_turn, "turn started");
        Ok(TurnReport {
            damage: damage.dealt,
            killed: damage.killed,
            skip_turn: start.skip_turn || damage.killed,
        })
    }

    /// Turn-end triggers; returns the conditions that lapsed
    pub fn end_turn(&mut self, id: FigureId) -> RulesResult<Vec<ConditionKind>> {
        let expired = self.figure_mut(id)?.conditions.end_turn();
        if !expired.is_empty() {
            tracing::debug!(figure = %id, ?expired, "conditions expired");
        }
        Ok(expired)
    }

    /// Elements wane, temporary shields drop, held reshuffles happen
    pub fn end_round(&mut self) {
        self.elements.wane_all();
        for figure in self.figures.values_mut() {
            figure.shield = 0;
        }
        for id in self.figures.keys() {
            if let Some(deck) = self.decks.get_mut(id) {
                deck.finish_draw(&mut self.rng);
            }
        }
        tracing::info!(round = self.round, "round ended");
    }

    pub fn status(&self) -> ScenarioStatus {
        let characters_alive = self
            .figures
            .values()
            .any(|f| f.figure_type() == FigureType::Character && f.is_alive());
        let monsters_left = self.figures.values().any(|f| f.is_monster() && f.is_active());
        if !characters_alive {
            ScenarioStatus::Defeat
        } else if !monsters_left {
            ScenarioStatus::Victory
        } else {
            ScenarioStatus::Ongoing
        }
    }

    /// Close the scenario: conditions other than permanent ones end, elements
    /// reset, bless and curse cards leave every deck
    pub fn end_scenario(&mut self) -> ScenarioStatus {
        let status = self.status();
        for figure in self.figures.values_mut() {
            figure.conditions.end_scenario();
            figure.shield = 0;
        }
        self.elements.reset();
        for id in self.figures.keys() {
            if let Some(deck) = self.decks.get_mut(id) {
                deck.clear_temporary();
                deck.reshuffle(&mut self.rng);
            }
        }
        tracing::info!(rounds = self.round, ?status, "scenario ended");
        status
    }

    // ========================================================================
    // MOVEMENT
    // ========================================================================

    /// Move with the figure's own movement profile
    pub fn move_figure(&mut self, id: FigureId, dest: HexCoord) -> RulesResult<MoveReport> {
        let options = self.figure(id)?.path_options();
        self.move_figure_with(id, dest, &options)
    }

    pub fn move_figure_with(&mut self, id: FigureId, dest: HexCoord, options: &PathOptions) -> RulesResult<MoveReport> {
        self.active(id)?.conditions.check_move(id)?;
        let start = self.position_of(id)?;
        if !self.board.contains(dest) {
            return Err(RulesError::OutOfBounds(dest));
        }
        let path = find_path(start, dest, &self.board, options);
        if !path.valid {
            return Err(RulesError::InvalidTarget(format!("{} cannot reach {}", id, dest)));
        }
        self.commit_move(id, path.path, path.cost, options)
    }

    fn commit_move(&mut self, id: FigureId, path: Vec<HexCoord>, cost: u32, options: &PathOptions) -> RulesResult<MoveReport> {
        let (Some(&start), Some(&end)) = (path.first(), path.last()) else {
            return Err(RulesError::InvalidTarget(format!("empty path for {}", id)));
        };
        self.board.move_occupant(start, end)?;
        self.figure_mut(id)?.position = Some(end);

        let steps = &path[1..];
        let entered: &[HexCoord] = if options.can_fly {
            &[]
        } else if options.can_jump {
            &steps[steps.len().saturating_sub(1)..]
        } else {
            steps
        };
        let (damage, killed) = self.spring_hexes(id, entered)?;
        tracing::debug!(figure = %id, from = %start, to = %end, cost, "figure moved");
        Ok(MoveReport {
            path,
            cost,
            damage,
            killed,
        })
    }

    /// Trap and hazard damage for hexes a figure entered. Traps are spent.
    fn spring_hexes(&mut self, id: FigureId, entered: &[HexCoord]) -> RulesResult<(u32, bool)> {
        let stats = self.level.stats();
        let mut total = 0;
        for &coord in entered {
            let Some(hex) = self.board.get(coord) else {
                continue;
            };
            let trap = hex.overlay == Some(Overlay::Trap);
            let hazard = hex.terrain.is_hazardous();
            let mut hit = 0;
            if trap {
                hit += stats.trap_damage;
                self.board.set_overlay(coord, None)?;
            }
            if hazard {
                hit += stats.hazard_damage;
            }
            if hit == 0 {
                continue;
            }
            let report = self.figure_mut(id)?.suffer_damage(hit);
            total += report.dealt;
            tracing::debug!(figure = %id, hex = %coord, damage = report.dealt, trap, "hex damage");
            if report.killed {
                self.remove_figure(id);
                return Ok((total, true));
            }
        }
        Ok((total, false))
    }

    /// Push (`away`) or pull `target` relative to `source`
    fn force_move(&mut self, source: FigureId, target: FigureId, distance: u32, away: bool) -> RulesResult<Vec<HexCoord>> {
        if source == target {
            return Err(RulesError::InvalidTarget(format!("{} cannot push or pull itself", source)));
        }
        let from = self.position_of(source)?;
        let at = self.position_of(target)?;
        let flying = self.figure(target)?.profile().flying;
        let path = forced_path(&self.board, from, at, distance, away);
        if let Some(&end) = path.last() {
            self.board.move_occupant(at, end)?;
            self.figure_mut(target)?.position = Some(end);
            if !flying {
                self.spring_hexes(target, &path)?;
            }
        }
        Ok(path)
    }

    // ========================================================================
    // ATTACKS AND EFFECTS
    // ========================================================================

    /// Enemies the figure could attack right now with its profile's range
    pub fn valid_targets(&self, id: FigureId) -> RulesResult<Vec<FigureId>> {
        let attacker = self.active(id)?;
        let pos = self.position_of(id)?;
        let ignores_invisibility = attacker.profile().ignores_invisibility;
        let targets = visibility::valid_targets_with(self.config.sight_rule, pos, attacker.profile().reach(), &self.board)
            .into_iter()
            .filter_map(|hex| self.board.occupant(hex))
            .filter(|other| {
                self.figures.get(other).is_some_and(|f| {
                    f.is_active() && f.is_enemy_of(attacker) && f.conditions.is_targetable(ignores_invisibility)
                })
            })
            .collect();
        Ok(targets)
    }

    /// Attack with the profile's base attack value
    pub fn attack(&mut self, attacker: FigureId, target: FigureId, effects: &[AttackEffect]) -> RulesResult<AttackReport> {
        let base = self.figure(attacker)?.profile().attack;
        self.attack_with(attacker, target, base, effects)
    }

    pub fn attack_with(
        &mut self,
        attacker_id: FigureId,
        target_id: FigureId,
        base: u32,
        effects: &[AttackEffect],
    ) -> RulesResult<AttackReport> {
        let attacker = self.active(attacker_id)?.clone();
        let defender = self.active(target_id)?.clone();
        if !attacker.is_enemy_of(&defender) {
            return Err(RulesError::InvalidTarget(format!(
                "{} is not an enemy of {}",
                target_id, attacker_id
            )));
        }
        let from = self.position_of(attacker_id)?;
        let to = self.position_of(target_id)?;
        let in_reach = visibility::valid_targets_with(self.config.sight_rule, from, attacker.profile().reach(), &self.board)
            .contains(&to);
        if !in_reach {
            return Err(RulesError::InvalidTarget(format!(
                "{} is out of range or sight of {}",
                target_id, attacker_id
            )));
        }

        let mut effects = effects.to_vec();
        if attacker.profile().is_ranged() && from.is_adjacent(to) {
            effects.push(AttackEffect::Disadvantage);
        }

        let deck = self
            .decks
            .get_mut(&attacker_id)
            .ok_or(RulesError::UnknownFigure(attacker_id))?;
        let result = resolve_attack(&attacker, &defender, deck, base, &effects, &mut self.rng)?;
        let reshuffled = self.config.reshuffle_after_attack && deck.finish_draw(&mut self.rng);

        let damage = self.figure_mut(target_id)?.suffer_damage(result.final_damage);
        let mut forced = Vec::new();
        if damage.killed {
            self.remove_figure(target_id);
        } else {
            let target = self.figure_mut(target_id)?;
            for &kind in &result.resulting_conditions {
                target.conditions.apply(Condition::new(kind).with_source(attacker_id));
            }
            if result.push > 0 {
                forced = self.force_move(attacker_id, target_id, result.push, true)?;
            }
            // a trap on the push path may already have killed the target
            if result.pull > 0 && self.figure(target_id)?.is_active() {
                forced.extend(self.force_move(attacker_id, target_id, result.pull, false)?);
            }
        }
        for &element in &result.infusions {
            self.elements.infuse(element);
        }
        if result.heal_self > 0 {
            self.figure_mut(attacker_id)?.heal(result.heal_self);
        }

        tracing::debug!(
            attacker = %attacker_id,
            target = %target_id,
            damage = damage.dealt,
            killed = damage.killed,
            "attack landed"
        );
        Ok(AttackReport {
            target: target_id,
            result,
            damage,
            forced,
            reshuffled,
        })
    }

    /// Apply one ability effect from `source` to `target`. Element operations
    /// ignore `target`.
    pub fn apply_effect(&mut self, source: FigureId, target: FigureId, effect: &Effect) -> RulesResult<EffectOutcome> {
        self.figure(source)?;
        if let Effect::ElementOp { op } = *effect {
            return Ok(self.apply_element_op(op));
        }
        self.active(target)?;

        let outcome = match *effect {
            Effect::Damage { amount } => {
                let report = self.figure_mut(target)?.suffer_damage(amount);
                if report.killed {
                    self.remove_figure(target);
                }
                EffectOutcome::Damaged(report)
            }
            Effect::Heal { amount } => EffectOutcome::Healed(self.figure_mut(target)?.heal(amount)),
            Effect::Push { distance } => EffectOutcome::Moved(self.force_move(source, target, distance, true)?),
            Effect::Pull { distance } => EffectOutcome::Moved(self.force_move(source, target, distance, false)?),
            Effect::ConditionApply { condition, duration } => {
                let mut instance = Condition::new(condition).with_source(source);
                if let Some(duration) = duration {
                    instance = instance.with_duration(duration);
                }
                EffectOutcome::Condition(self.figure_mut(target)?.conditions.apply(instance))
            }
            Effect::ElementOp { op } => self.apply_element_op(op),
            Effect::Shield { amount } => {
                let figure = self.figure_mut(target)?;
                figure.shield += amount;
                EffectOutcome::Shielded(figure.shield)
            }
        };
        tracing::debug!(source = %source, target = %target, ?effect, "effect applied");
        Ok(outcome)
    }

    fn apply_element_op(&mut self, op: ElementOp) -> EffectOutcome {
        match op {
            ElementOp::Infuse(element) => {
                self.elements.infuse(element);
                EffectOutcome::Element {
                    element,
                    succeeded: true,
                }
            }
            ElementOp::Consume(element) => EffectOutcome::Element {
                element,
                succeeded: self.elements.consume(element),
            },
        }
    }

    // ========================================================================
    // AUTOMATED TURNS
    // ========================================================================

    /// Play a monster's turn through the director
    pub fn monster_turn(&mut self, id: FigureId) -> RulesResult<TurnActions> {
        if !self.figure(id)?.is_monster() {
            return Err(RulesError::illegal(id, "not a monster"));
        }
        self.auto_turn(id)
    }

    /// Focus, move toward the focus, then attack it if possible. Characters
    /// use this for simulated play.
    pub fn auto_turn(&mut self, id: FigureId) -> RulesResult<TurnActions> {
        let actor = self.active(id)?.clone();
        let rule = self.config.sight_rule;
        let mut actions = TurnActions {
            figure: id,
            focus: None,
            moved: None,
            attack: None,
        };

        let candidates: Vec<(&Figure, u32)> = self
            .figures
            .values()
            .filter(|f| f.is_enemy_of(&actor))
            .map(|f| (f, self.initiative.initiative_of(f.id).unwrap_or(UNSET_INITIATIVE)))
            .collect();
        let Some(focus) = director::select_focus(&actor, &candidates, &self.board, rule) else {
            return Ok(actions);
        };
        actions.focus = Some(focus);

        let focus_figure = self.figure(focus)?;
        let destination = director::select_destination(&actor, focus_figure, &self.board, rule);
        if let Some(dest) = destination {
            if dest.cost > 0 && actor.conditions.check_move(id).is_ok() {
                let options = actor.path_options();
                actions.moved = Some(self.commit_move(id, dest.path, dest.cost, &options)?);
            }
        }

        if self.figure(id)?.is_active() && self.valid_targets(id)?.contains(&focus) {
            match self.attack(id, focus, &[]) {
                Ok(report) => actions.attack = Some(report),
                Err(err) if !err.is_fatal() => {
                    tracing::debug!(figure = %id, %err, "attack refused");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementState};
    use crate::figure::CombatProfile;
    use crate::modifier::{CardEffect, ModifierCard};

    const HERO: FigureId = FigureId(1);
    const GUARD: FigureId = FigureId(10);

    fn session() -> Session {
        let mut session = Session::new(Board::hexagon(4), ScenarioLevel::new(1), RulesConfig::default().with_seed(5));
        session
            .add_figure(
                Figure::character(HERO, "Brute", "brute", 2, 10, CombatProfile::new(3, 3, 0)).at(HexCoord::new(0, 0)),
            )
            .unwrap();
        session
            .add_figure(
                Figure::monster(GUARD, "Bandit Guard", false, 6, CombatProfile::new(2, 2, 0).with_shield(1))
                    .at(HexCoord::new(3, 0)),
            )
            .unwrap();
        session
    }

    fn fixed_deck(cards: Vec<ModifierCard>) -> AttackModifierDeck {
        AttackModifierDeck::from_draw_order(cards)
    }

    #[test]
    fn test_add_figure_places_and_rejects_duplicates() {
        let mut session = session();
        assert_eq!(session.board().occupant(HexCoord::new(0, 0)), Some(HERO));
        assert_eq!(session.deck(HERO).unwrap().len(), 20);
        let dup = Figure::character(HERO, "Brute", "brute", 2, 10, CombatProfile::default());
        assert!(matches!(session.add_figure(dup), Err(RulesError::InvalidTarget(_))));
    }

    #[test]
    fn test_move_and_refusals() {
        let mut session = session();
        let report = session.move_figure(HERO, HexCoord::new(2, 0)).unwrap();
        assert_eq!(report.cost, 2);
        assert_eq!(session.figure(HERO).unwrap().position, Some(HexCoord::new(2, 0)));
        assert_eq!(session.board().occupant(HexCoord::new(0, 0)), None);
        assert_eq!(session.board().occupant(HexCoord::new(2, 0)), Some(HERO));

        assert_eq!(
            session.move_figure(HERO, HexCoord::new(9, 9)),
            Err(RulesError::OutOfBounds(HexCoord::new(9, 9)))
        );
        // occupied by the guard
        assert!(matches!(
            session.move_figure(HERO, HexCoord::new(3, 0)),
            Err(RulesError::InvalidTarget(_))
        ));
        // beyond the guard's move of 2
        assert!(matches!(
            session.move_figure(GUARD, HexCoord::new(3, -3)),
            Err(RulesError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_immobilized_move_changes_nothing() {
        let mut session = session();
        session
            .apply_effect(GUARD, HERO, &Effect::ConditionApply { condition: ConditionKind::Immobilize, duration: None })
            .unwrap();
        let err = session.move_figure(HERO, HexCoord::new(1, 0)).unwrap_err();
        assert!(matches!(err, RulesError::IllegalAction { .. }));
        assert_eq!(session.figure(HERO).unwrap().position, Some(HexCoord::new(0, 0)));
    }

    #[test]
    fn test_trap_springs_once() {
        let mut session = session();
        session.board.set_overlay(HexCoord::new(1, 0), Some(Overlay::Trap)).unwrap();
        let report = session.move_figure(HERO, HexCoord::new(2, 0)).unwrap();
        // level 1 trap: 2 + 1
        assert_eq!(report.damage, 3);
        assert_eq!(session.figure(HERO).unwrap().current_hp, 7);
        assert_eq!(session.board().get(HexCoord::new(1, 0)).unwrap().overlay, None);
    }

    #[test]
    fn test_attack_applies_damage_and_conditions() {
        let mut session = session();
        session.move_figure(HERO, HexCoord::new(2, 0)).unwrap();
        session
            .set_deck(
                HERO,
                fixed_deck(vec![
                    ModifierCard::plus(1)
                        .rolling()
                        .with_effect(CardEffect::Condition(ConditionKind::Wound)),
                    ModifierCard::plus(0),
                    ModifierCard::plus(0),
                ]),
            )
            .unwrap();

        let report = session.attack(HERO, GUARD, &[]).unwrap();
        // 3 + 1 - shield 1
        assert_eq!(report.result.final_damage, 3);
        assert_eq!(report.damage.dealt, 3);
        let guard = session.figure(GUARD).unwrap();
        assert_eq!(guard.current_hp, 3);
        assert!(guard.conditions.has(ConditionKind::Wound));
    }

    #[test]
    fn test_attack_refusals() {
        let mut session = session();
        // three hexes away with a melee profile
        assert!(matches!(session.attack(HERO, GUARD, &[]), Err(RulesError::InvalidTarget(_))));
        assert!(matches!(session.attack(HERO, HERO, &[]), Err(RulesError::InvalidTarget(_))));
        assert_eq!(session.attack(HERO, FigureId(77), &[]).unwrap_err(), RulesError::UnknownFigure(FigureId(77)));
        assert!(session.valid_targets(HERO).unwrap().is_empty());
    }

    #[test]
    fn test_kill_removes_and_wins() {
        let mut session = session();
        session.move_figure(HERO, HexCoord::new(2, 0)).unwrap();
        session.set_deck(HERO, fixed_deck(vec![ModifierCard::double()])).unwrap();
        assert_eq!(session.status(), ScenarioStatus::Ongoing);

        // 4 x2 - shield 1 against 6 hp
        let report = session.attack_with(HERO, GUARD, 4, &[]).unwrap();
        assert!(report.damage.killed);
        // the double flagged a reshuffle that ran right after the attack
        assert!(report.reshuffled);
        assert_eq!(session.board().occupant(HexCoord::new(3, 0)), None);
        assert_eq!(session.status(), ScenarioStatus::Victory);
    }

    #[test]
    fn test_push_into_lethal_trap_skips_pull() {
        let mut session = session();
        session.move_figure(HERO, HexCoord::new(2, 0)).unwrap();
        session.board.set_overlay(HexCoord::new(4, 0), Some(Overlay::Trap)).unwrap();
        session.apply_effect(HERO, GUARD, &Effect::Damage { amount: 1 }).unwrap();
        session
            .set_deck(
                HERO,
                fixed_deck(vec![ModifierCard::plus(0)
                    .with_effect(CardEffect::Push(1))
                    .with_effect(CardEffect::Pull(1))]),
            )
            .unwrap();

        // 3 - shield 1 leaves the guard on 3, the level 1 trap deals 3
        let report = session.attack(HERO, GUARD, &[]).unwrap();
        assert!(!report.damage.killed);
        assert_eq!(report.forced, vec![HexCoord::new(4, 0)]);
        let guard = session.figure(GUARD).unwrap();
        assert!(!guard.is_alive());
        assert_eq!(guard.position, None);
        assert_eq!(session.board().occupant(HexCoord::new(4, 0)), None);
        assert_eq!(session.status(), ScenarioStatus::Victory);
    }

    #[test]
    fn test_held_reshuffle_runs_at_end_of_round() {
        let mut session = Session::new(
            Board::hexagon(3),
            ScenarioLevel::new(0),
            RulesConfig::default().with_reshuffle_after_attack(false),
        );
        session
            .add_figure(Figure::character(HERO, "Brute", "brute", 1, 10, CombatProfile::new(3, 1, 0)).at(HexCoord::new(0, 0)))
            .unwrap();
        session
            .add_figure(Figure::monster(GUARD, "Bandit Guard", false, 9, CombatProfile::new(2, 2, 0)).at(HexCoord::new(1, 0)))
            .unwrap();
        session
            .set_deck(HERO, fixed_deck(vec![ModifierCard::null(), ModifierCard::plus(0)]))
            .unwrap();

        let report = session.attack(HERO, GUARD, &[]).unwrap();
        assert!(!report.reshuffled);
        assert!(session.deck(HERO).unwrap().needs_reshuffle());
        session.end_round();
        assert!(!session.deck(HERO).unwrap().needs_reshuffle());
        assert_eq!(session.deck(HERO).unwrap().discard_pile().len(), 0);
    }

    #[test]
    fn test_turn_start_poison_and_stun() {
        let mut session = session();
        for condition in [ConditionKind::Poison, ConditionKind::Stun] {
            session
                .apply_effect(GUARD, HERO, &Effect::ConditionApply { condition, duration: None })
                .unwrap();
        }
        let report = session.start_turn(HERO).unwrap();
        assert_eq!(report.damage, 1);
        assert!(report.skip_turn);
        assert_eq!(session.figure(HERO).unwrap().current_hp, 9);
        session.end_turn(HERO).unwrap();
        // poison is still there until healed
        let heal = session.apply_effect(HERO, HERO, &Effect::Heal { amount: 3 }).unwrap();
        match heal {
            EffectOutcome::Healed(report) => assert_eq!(report.restored, 0),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!session.figure(HERO).unwrap().conditions.has(ConditionKind::Poison));
    }

    #[test]
    fn test_elements_and_shield_through_effects() {
        let mut session = session();
        let fire = Effect::ElementOp { op: ElementOp::Infuse(Element::Fire) };
        session.apply_effect(HERO, HERO, &fire).unwrap();
        session.apply_effect(HERO, HERO, &Effect::Shield { amount: 2 }).unwrap();
        assert_eq!(session.figure(HERO).unwrap().total_shield(), 2);

        session.end_round();
        assert_eq!(session.elements().state(Element::Fire), ElementState::Waning);
        assert_eq!(session.figure(HERO).unwrap().total_shield(), 0);

        let consume = Effect::ElementOp { op: ElementOp::Consume(Element::Fire) };
        assert_eq!(
            session.apply_effect(HERO, HERO, &consume).unwrap(),
            EffectOutcome::Element { element: Element::Fire, succeeded: true }
        );
        assert_eq!(
            session.apply_effect(HERO, HERO, &consume).unwrap(),
            EffectOutcome::Element { element: Element::Fire, succeeded: false }
        );
    }

    #[test]
    fn test_push_effect() {
        let mut session = session();
        session.move_figure(HERO, HexCoord::new(2, 0)).unwrap();
        let outcome = session.apply_effect(HERO, GUARD, &Effect::Push { distance: 1 }).unwrap();
        assert_eq!(outcome, EffectOutcome::Moved(vec![HexCoord::new(4, 0)]));
        assert_eq!(session.board().occupant(HexCoord::new(4, 0)), Some(GUARD));
    }

    #[test]
    fn test_monster_turn_closes_and_attacks() {
        let mut session = session();
        session.begin_round(vec![
            InitiativeEntry::new(HERO, FigureType::Character, 50),
            InitiativeEntry::new(GUARD, FigureType::Monster, 20),
        ]);
        assert_eq!(session.next_figure(), Some(GUARD));
        session.set_deck(GUARD, fixed_deck(vec![ModifierCard::plus(0)])).unwrap();

        let actions = session.monster_turn(GUARD).unwrap();
        assert_eq!(actions.focus, Some(HERO));
        let moved = actions.moved.unwrap();
        assert_eq!(moved.path.last(), Some(&HexCoord::new(1, 0)));
        let attack = actions.attack.unwrap();
        assert_eq!(attack.damage.dealt, 2);
        assert_eq!(session.figure(HERO).unwrap().current_hp, 8);

        assert!(matches!(session.monster_turn(HERO), Err(RulesError::IllegalAction { .. })));
    }

    #[test]
    fn test_defeat_and_end_scenario() {
        let mut session = session();
        session.add_bless(HERO, 2).unwrap();
        session.apply_effect(GUARD, HERO, &Effect::Damage { amount: 50 }).unwrap();
        assert_eq!(session.status(), ScenarioStatus::Defeat);
        assert_eq!(session.end_scenario(), ScenarioStatus::Defeat);
        assert_eq!(session.deck(HERO).unwrap().bless_count(), 0);
        assert_eq!(session.deck(HERO).unwrap().len(), 20);
    }

    #[test]
    fn test_same_seed_same_session() {
        let a = session();
        let b = session();
        let draw = |s: &Session| s.deck(HERO).unwrap().draw_pile().cloned().collect::<Vec<_>>();
        assert_eq!(draw(&a), draw(&b));
    }
}
