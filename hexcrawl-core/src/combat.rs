//! Attack resolution: modifier draw, shield and pierce, carried conditions
//!
//! `resolve_attack` only draws cards and computes the outcome. Applying the
//! damage, the conditions and any reshuffle is left to the caller, so a
//! refused attack never touches figure state.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::condition::ConditionKind;
use crate::element::Element;
use crate::error::{RulesError, RulesResult};
use crate::figure::Figure;
use crate::modifier::{AttackModifierDeck, CardEffect, ModifierCard};

/// Situational modifiers passed in by the ability being played
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackEffect {
    Advantage,
    Disadvantage,
    Pierce(u32),
    /// Condition carried by the base ability
    Apply(ConditionKind),
    IgnoreInvisibility,
}

/// Everything one attack produced
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttackResult {
    /// After modifiers and shield, floored at 0; Brittle is applied later
    pub final_damage: u32,
    pub drawn_cards: Vec<ModifierCard>,
    pub advantage_applied: bool,
    pub disadvantage_applied: bool,
    pub pierce: u32,
    /// Conditions for the target, base ability first then chain effects
    pub resulting_conditions: Vec<ConditionKind>,
    pub infusions: Vec<Element>,
    pub heal_self: u32,
    pub push: u32,
    pub pull: u32,
}

/// Resolve `attacker` hitting `target` for `base` damage.
///
/// Fails with `IllegalAction` when the attacker is stunned or disarmed,
/// `InvalidTarget` when the target is invisible to it, and `EmptyResource`
/// when the deck has no cards left anywhere.
pub fn resolve_attack<R: Rng>(
    attacker: &Figure,
    target: &Figure,
    deck: &mut AttackModifierDeck,
    base: u32,
    effects: &[AttackEffect],
    rng: &mut R,
) -> RulesResult<AttackResult> {
    attacker.conditions.check_attack(attacker.id)?;

    let ignores_invisibility =
        attacker.profile().ignores_invisibility || effects.contains(&AttackEffect::IgnoreInvisibility);
    if !target.conditions.is_targetable(ignores_invisibility) {
        return Err(RulesError::InvalidTarget(format!("{} is invisible", target.id)));
    }

    let (strengthened, muddled) = attacker.conditions.attack_modifiers();
    let advantage = strengthened || effects.contains(&AttackEffect::Advantage);
    let disadvantage = muddled || effects.contains(&AttackEffect::Disadvantage);

    let base = i32::try_from(base).unwrap_or(i32::MAX);
    let outcome = deck
        .draw_for_attack(advantage, disadvantage, base, rng)
        .ok_or(RulesError::EmptyResource(attacker.id))?;

    let mut result = AttackResult {
        drawn_cards: outcome.drawn,
        advantage_applied: outcome.advantage_applied,
        disadvantage_applied: outcome.disadvantage_applied,
        pierce: attacker.profile().pierce,
        ..AttackResult::default()
    };

    for effect in effects {
        match *effect {
            AttackEffect::Pierce(n) => result.pierce += n,
            AttackEffect::Apply(kind) => push_unique(&mut result.resulting_conditions, kind),
            AttackEffect::Advantage | AttackEffect::Disadvantage | AttackEffect::IgnoreInvisibility => {}
        }
    }
    for effect in outcome.applied.effects() {
        match *effect {
            CardEffect::Condition(kind) => push_unique(&mut result.resulting_conditions, kind),
            CardEffect::Pierce(n) => result.pierce += n,
            CardEffect::Infuse(element) => result.infusions.push(element),
            CardEffect::HealSelf(n) => result.heal_self += n,
            CardEffect::Push(n) => result.push += n,
            CardEffect::Pull(n) => result.pull += n,
        }
    }

    let modified = outcome.applied.apply(base).max(0) as u32;
    let effective_shield = target.total_shield().saturating_sub(result.pierce);
    result.final_damage = modified.saturating_sub(effective_shield);

    tracing::debug!(
        attacker = %attacker.id,
        target = %target.id,
        base,
        modified,
        shield = effective_shield,
        damage = result.final_damage,
        "attack resolved"
    );
    Ok(result)
}

fn push_unique(conditions: &mut Vec<ConditionKind>, kind: ConditionKind) {
    if kind.stacks() || !conditions.contains(&kind) {
        conditions.push(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::figure::{CombatProfile, FigureId};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn hero() -> Figure {
        Figure::character(FigureId(1), "Spellweaver", "spellweaver", 1, 6, CombatProfile::new(2, 3, 3))
    }

    fn guard(shield: u32) -> Figure {
        Figure::monster(FigureId(2), "Bandit Guard", false, 5, CombatProfile::new(2, 2, 0).with_shield(shield))
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    #[test]
    fn test_plain_draw_adds_to_base() {
        let mut deck = AttackModifierDeck::from_draw_order(vec![ModifierCard::plus(1)]);
        let result = resolve_attack(&hero(), &guard(0), &mut deck, 3, &[], &mut rng()).unwrap();
        assert_eq!(result.final_damage, 4);
        assert_eq!(result.drawn_cards, vec![ModifierCard::plus(1)]);
        assert!(!result.advantage_applied);
    }

    #[test]
    fn test_null_zeroes_regardless_of_base() {
        for base in [0, 1, 5, 12] {
            let mut deck = AttackModifierDeck::from_draw_order(vec![ModifierCard::null()]);
            let result = resolve_attack(&hero(), &guard(0), &mut deck, base, &[], &mut rng()).unwrap();
            assert_eq!(result.final_damage, 0);
            assert!(deck.needs_reshuffle());
        }
    }

    #[test]
    fn test_shield_and_pierce() {
        let mut deck = AttackModifierDeck::from_draw_order(vec![ModifierCard::plus(0), ModifierCard::plus(0)]);
        let shielded = resolve_attack(&hero(), &guard(2), &mut deck, 3, &[], &mut rng()).unwrap();
        assert_eq!(shielded.final_damage, 1);

        let pierced = resolve_attack(&hero(), &guard(2), &mut deck, 3, &[AttackEffect::Pierce(5)], &mut rng()).unwrap();
        assert_eq!(pierced.pierce, 5);
        assert_eq!(pierced.final_damage, 3);
    }

    #[test]
    fn test_damage_floors_at_zero() {
        let mut deck = AttackModifierDeck::from_draw_order(vec![ModifierCard::plus(-2)]);
        let result = resolve_attack(&hero(), &guard(3), &mut deck, 1, &[], &mut rng()).unwrap();
        assert_eq!(result.final_damage, 0);
    }

    #[test]
    fn test_huge_base_saturates() {
        let mut deck = AttackModifierDeck::from_draw_order(vec![ModifierCard::double()]);
        let result = resolve_attack(&hero(), &guard(0), &mut deck, u32::MAX, &[], &mut rng()).unwrap();
        assert_eq!(result.final_damage, i32::MAX as u32);
    }

    #[test]
    fn test_unclosable_chain_is_empty_resource() {
        let mut deck = AttackModifierDeck::from_draw_order(vec![ModifierCard::plus(1).rolling()]);
        let err = resolve_attack(&hero(), &guard(0), &mut deck, 2, &[], &mut rng()).unwrap_err();
        assert_eq!(err, RulesError::EmptyResource(FigureId(1)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_strengthen_grants_advantage() {
        let mut attacker = hero();
        attacker.conditions.apply(Condition::new(ConditionKind::Strengthen));
        let mut deck = AttackModifierDeck::from_draw_order(vec![
            ModifierCard::plus(1).rolling(),
            ModifierCard::plus(0),
            ModifierCard::plus(2),
        ]);
        let result = resolve_attack(&attacker, &guard(0), &mut deck, 3, &[], &mut rng()).unwrap();
        assert!(result.advantage_applied);
        assert_eq!(result.drawn_cards.len(), 3);
        assert_eq!(result.final_damage, 5);
    }

    #[test]
    fn test_muddle_and_advantage_cancel() {
        let mut attacker = hero();
        attacker.conditions.apply(Condition::new(ConditionKind::Muddle));
        let mut deck = AttackModifierDeck::from_draw_order(vec![ModifierCard::plus(0), ModifierCard::plus(2)]);
        let result =
            resolve_attack(&attacker, &guard(0), &mut deck, 2, &[AttackEffect::Advantage], &mut rng()).unwrap();
        assert!(!result.advantage_applied);
        assert!(!result.disadvantage_applied);
        assert_eq!(result.drawn_cards.len(), 1);
        assert_eq!(result.final_damage, 2);
    }

    #[test]
    fn test_conditions_collected_from_ability_and_chain() {
        let mut deck = AttackModifierDeck::from_draw_order(vec![
            ModifierCard::plus(0)
                .rolling()
                .with_effect(CardEffect::Condition(ConditionKind::Wound)),
            ModifierCard::plus(1).rolling().with_effect(CardEffect::Infuse(Element::Fire)),
            ModifierCard::plus(0).with_effect(CardEffect::Condition(ConditionKind::Poison)),
        ]);
        let result = resolve_attack(
            &hero(),
            &guard(0),
            &mut deck,
            2,
            &[AttackEffect::Apply(ConditionKind::Immobilize)],
            &mut rng(),
        )
        .unwrap();
        assert_eq!(
            result.resulting_conditions,
            vec![ConditionKind::Immobilize, ConditionKind::Wound, ConditionKind::Poison]
        );
        assert_eq!(result.infusions, vec![Element::Fire]);
        assert_eq!(result.final_damage, 3);
    }

    #[test]
    fn test_disarmed_attacker_refused() {
        let mut attacker = hero();
        attacker.conditions.apply(Condition::new(ConditionKind::Disarm));
        let mut deck = AttackModifierDeck::standard();
        let err = resolve_attack(&attacker, &guard(0), &mut deck, 2, &[], &mut rng()).unwrap_err();
        assert!(matches!(err, RulesError::IllegalAction { .. }));
        // nothing drawn
        assert_eq!(deck.discard_pile().len(), 0);
    }

    #[test]
    fn test_invisible_target() {
        let mut target = guard(0);
        target.conditions.apply(Condition::new(ConditionKind::Invisible));
        let mut deck = AttackModifierDeck::standard();
        let err = resolve_attack(&hero(), &target, &mut deck, 2, &[], &mut rng()).unwrap_err();
        assert!(matches!(err, RulesError::InvalidTarget(_)));

        let ok = resolve_attack(&hero(), &target, &mut deck, 2, &[AttackEffect::IgnoreInvisibility], &mut rng());
        assert!(ok.is_ok());
    }

    #[test]
    fn test_empty_deck_is_fatal() {
        let mut deck = AttackModifierDeck::default();
        let err = resolve_attack(&hero(), &guard(0), &mut deck, 2, &[], &mut rng()).unwrap_err();
        assert_eq!(err, RulesError::EmptyResource(FigureId(1)));
        assert!(err.is_fatal());
    }
}
