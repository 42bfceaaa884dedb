//! Condition engine: status effects, stacking, expiry and action gates
//!
//! Conditions expire at fixed trigger points:
//! - start of the bearer's turn (Stun is consumed, damage-over-time ticks)
//! - end of the bearer's turn (until-end-of-next-turn conditions lapse)
//! - on heal (until-healed conditions are cleared)
//! - on damage (Brittle is consumed)
//! - end of scenario (everything but permanent conditions)

use crate::error::{RulesError, RulesResult};
use crate::figure::FigureId;
use serde::{Deserialize, Serialize};

/// Condition type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Poison,
    Wound,
    Immobilize,
    Disarm,
    Stun,
    Muddle,
    Strengthen,
    Invisible,
    Brittle,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 9] = [
        ConditionKind::Poison,
        ConditionKind::Wound,
        ConditionKind::Immobilize,
        ConditionKind::Disarm,
        ConditionKind::Stun,
        ConditionKind::Muddle,
        ConditionKind::Strengthen,
        ConditionKind::Invisible,
        ConditionKind::Brittle,
    ];

    /// Poison and Wound accumulate; everything else refreshes on re-application
    pub fn stacks(self) -> bool {
        matches!(self, ConditionKind::Poison | ConditionKind::Wound)
    }

    pub fn default_duration(self) -> DurationPolicy {
        match self {
            ConditionKind::Poison | ConditionKind::Wound => DurationPolicy::UntilHealed,
            ConditionKind::Immobilize
            | ConditionKind::Disarm
            | ConditionKind::Stun
            | ConditionKind::Muddle
            | ConditionKind::Strengthen
            | ConditionKind::Invisible
            | ConditionKind::Brittle => DurationPolicy::UntilEndOfNextTurn,
        }
    }
}

/// When a condition instance lapses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationPolicy {
    UntilEndOfNextTurn,
    UntilEndOfScenario,
    UntilHealed,
    Permanent,
}

/// One condition instance on a figure
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: ConditionKind,
    pub duration: DurationPolicy,
    #[serde(default)]
    pub value: Option<u32>,
    #[serde(default)]
    pub source: Option<FigureId>,
    /// Set once the bearer has started a turn while carrying this instance.
    /// Until-end-of-next-turn instances lapse only after that turn ends.
    #[serde(default)]
    turn_started: bool,
}

impl Condition {
    pub fn new(kind: ConditionKind) -> Self {
        Self {
            kind,
            duration: kind.default_duration(),
            value: None,
            source: None,
            turn_started: false,
        }
    }

    pub fn with_duration(mut self, duration: DurationPolicy) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_value(mut self, value: u32) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_source(mut self, source: FigureId) -> Self {
        self.source = Some(source);
        self
    }

    /// Damage dealt at turn start (Poison / Wound only)
    pub fn damage_per_turn(&self) -> u32 {
        if self.kind.stacks() {
            self.value.unwrap_or(1)
        } else {
            0
        }
    }
}

/// Whether `apply` created a new instance or refreshed an existing one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Added,
    Refreshed,
}

/// What the condition engine does to a figure at the start of its turn
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnStart {
    /// Summed Poison/Wound damage to deal
    pub damage: u32,
    /// Stunned: the whole turn is lost
    pub skip_turn: bool,
}

/// What a heal effect did to the condition set
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HealInterception {
    pub cleared: Vec<ConditionKind>,
    /// A poisoned figure gains no hit points from the heal that cures it
    pub blocks_healing: bool,
}

/// Multiset of conditions carried by one figure
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet {
    conditions: Vec<Condition>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> + '_ {
        self.conditions.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn has(&self, kind: ConditionKind) -> bool {
        self.conditions.iter().any(|c| c.kind == kind)
    }

    pub fn count(&self, kind: ConditionKind) -> usize {
        self.conditions.iter().filter(|c| c.kind == kind).count()
    }

    /// Add a condition. Non-stacking kinds overwrite duration, value and source
    /// of the existing instance instead of creating a second one.
    pub fn apply(&mut self, condition: Condition) -> ApplyOutcome {
        if !condition.kind.stacks() {
            if let Some(existing) = self.conditions.iter_mut().find(|c| c.kind == condition.kind) {
                *existing = condition;
                return ApplyOutcome::Refreshed;
            }
        }
        self.conditions.push(condition);
        ApplyOutcome::Added
    }

    /// Remove every instance of `kind`; true if any were present
    pub fn remove(&mut self, kind: ConditionKind) -> bool {
        let before = self.conditions.len();
        self.conditions.retain(|c| c.kind != kind);
        before != self.conditions.len()
    }

    // ========================================================================
    // TRIGGER POINTS
    // ========================================================================

    pub fn start_turn(&mut self) -> TurnStart {
        let damage = self.conditions.iter().map(Condition::damage_per_turn).sum();
        let skip_turn = self.remove(ConditionKind::Stun);
        for condition in &mut self.conditions {
            condition.turn_started = true;
        }
        TurnStart { damage, skip_turn }
    }

    /// Expire until-end-of-next-turn instances whose turn has now ended
    pub fn end_turn(&mut self) -> Vec<ConditionKind> {
        let mut expired = Vec::new();
        self.conditions.retain(|c| {
            let lapses = c.duration == DurationPolicy::UntilEndOfNextTurn && c.turn_started;
            if lapses {
                expired.push(c.kind);
            }
            !lapses
        });
        expired
    }

    pub fn on_heal(&mut self) -> HealInterception {
        let blocks_healing = self.has(ConditionKind::Poison);
        let mut cleared = Vec::new();
        self.conditions.retain(|c| {
            let lapses = c.duration == DurationPolicy::UntilHealed;
            if lapses && !cleared.contains(&c.kind) {
                cleared.push(c.kind);
            }
            !lapses
        });
        HealInterception {
            cleared,
            blocks_healing,
        }
    }

    /// Damage about to be taken; Brittle doubles it once and is consumed
    pub fn on_damage(&mut self, amount: u32) -> u32 {
        if amount > 0 && self.remove(ConditionKind::Brittle) {
            amount * 2
        } else {
            amount
        }
    }

    pub fn end_scenario(&mut self) {
        self.conditions
            .retain(|c| c.duration == DurationPolicy::Permanent);
    }

    // ========================================================================
    // ACTION GATES
    // ========================================================================

    pub fn check_move(&self, figure: FigureId) -> RulesResult<()> {
        if self.has(ConditionKind::Stun) {
            return Err(RulesError::illegal(figure, "stunned"));
        }
        if self.has(ConditionKind::Immobilize) {
            return Err(RulesError::illegal(figure, "immobilized"));
        }
        Ok(())
    }

    pub fn check_attack(&self, figure: FigureId) -> RulesResult<()> {
        if self.has(ConditionKind::Stun) {
            return Err(RulesError::illegal(figure, "stunned"));
        }
        if self.has(ConditionKind::Disarm) {
            return Err(RulesError::illegal(figure, "disarmed"));
        }
        Ok(())
    }

    /// Invisible figures cannot be targeted by enemies unless the
    /// opposing ability ignores invisibility
    pub fn is_targetable(&self, ignores_invisibility: bool) -> bool {
        ignores_invisibility || !self.has(ConditionKind::Invisible)
    }

    /// (advantage, disadvantage) granted to attacks made by the bearer
    pub fn attack_modifiers(&self) -> (bool, bool) {
        (
            self.has(ConditionKind::Strengthen),
            self.has(ConditionKind::Muddle),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poison_and_wound_stack() {
        let mut set = ConditionSet::new();
        assert_eq!(set.apply(Condition::new(ConditionKind::Poison)), ApplyOutcome::Added);
        assert_eq!(set.apply(Condition::new(ConditionKind::Poison)), ApplyOutcome::Added);
        set.apply(Condition::new(ConditionKind::Wound).with_value(2));
        assert_eq!(set.count(ConditionKind::Poison), 2);

        let start = set.start_turn();
        assert_eq!(start.damage, 4);
        assert!(!start.skip_turn);
    }

    #[test]
    fn test_non_stacking_refreshes() {
        let mut set = ConditionSet::new();
        set.apply(Condition::new(ConditionKind::Muddle));
        set.start_turn();
        let outcome = set.apply(
            Condition::new(ConditionKind::Muddle).with_source(FigureId(7)),
        );
        assert_eq!(outcome, ApplyOutcome::Refreshed);
        assert_eq!(set.count(ConditionKind::Muddle), 1);
        // refreshed instance has not seen a turn start yet
        assert!(set.end_turn().is_empty());
        assert!(set.has(ConditionKind::Muddle));
    }

    #[test]
    fn test_end_of_next_turn_expiry() {
        let mut set = ConditionSet::new();
        // applied during the bearer's own turn: survives that turn's end
        set.apply(Condition::new(ConditionKind::Strengthen));
        assert!(set.end_turn().is_empty());

        set.start_turn();
        assert!(set.has(ConditionKind::Strengthen));
        assert_eq!(set.end_turn(), vec![ConditionKind::Strengthen]);
        assert!(!set.has(ConditionKind::Strengthen));
    }

    #[test]
    fn test_stun_skips_turn_and_is_removed() {
        let mut set = ConditionSet::new();
        set.apply(Condition::new(ConditionKind::Stun));
        assert!(set.check_move(FigureId(1)).is_err());
        let start = set.start_turn();
        assert!(start.skip_turn);
        assert!(!set.has(ConditionKind::Stun));
    }

    #[test]
    fn test_heal_clears_damage_over_time() {
        let mut set = ConditionSet::new();
        set.apply(Condition::new(ConditionKind::Poison));
        set.apply(Condition::new(ConditionKind::Poison));
        set.apply(Condition::new(ConditionKind::Wound));
        set.apply(Condition::new(ConditionKind::Muddle));

        let heal = set.on_heal();
        assert!(heal.blocks_healing);
        assert_eq!(heal.cleared, vec![ConditionKind::Poison, ConditionKind::Wound]);
        assert!(!set.has(ConditionKind::Poison));
        assert!(!set.has(ConditionKind::Wound));
        assert!(set.has(ConditionKind::Muddle));
    }

    #[test]
    fn test_brittle_doubles_once() {
        let mut set = ConditionSet::new();
        set.apply(Condition::new(ConditionKind::Brittle));
        assert_eq!(set.on_damage(0), 0);
        assert_eq!(set.on_damage(3), 6);
        assert_eq!(set.on_damage(3), 3);
    }

    #[test]
    fn test_gates() {
        let id = FigureId(4);
        let mut set = ConditionSet::new();
        assert!(set.check_move(id).is_ok());
        assert!(set.check_attack(id).is_ok());

        set.apply(Condition::new(ConditionKind::Immobilize));
        set.apply(Condition::new(ConditionKind::Disarm));
        assert!(matches!(set.check_move(id), Err(RulesError::IllegalAction { .. })));
        assert!(matches!(set.check_attack(id), Err(RulesError::IllegalAction { .. })));
    }

    #[test]
    fn test_invisibility_and_attack_modifiers() {
        let mut set = ConditionSet::new();
        set.apply(Condition::new(ConditionKind::Invisible));
        assert!(!set.is_targetable(false));
        assert!(set.is_targetable(true));

        set.apply(Condition::new(ConditionKind::Strengthen));
        set.apply(Condition::new(ConditionKind::Muddle));
        assert_eq!(set.attack_modifiers(), (true, true));
    }

    #[test]
    fn test_end_scenario_keeps_permanent() {
        let mut set = ConditionSet::new();
        set.apply(Condition::new(ConditionKind::Poison));
        set.apply(
            Condition::new(ConditionKind::Strengthen).with_duration(DurationPolicy::Permanent),
        );
        set.apply(
            Condition::new(ConditionKind::Muddle).with_duration(DurationPolicy::UntilEndOfScenario),
        );
        set.end_scenario();
        assert_eq!(set.iter().count(), 1);
        assert!(set.has(ConditionKind::Strengthen));
    }
}
