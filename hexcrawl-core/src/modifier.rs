//! Attack modifier cards, decks and the chain draw protocol
//!
//! A draw always produces a *chain*: zero or more rolling cards followed by
//! exactly one non-rolling card. Advantage and disadvantage draw two chains
//! and keep one of them, compared on their final card.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::condition::ConditionKind;
use crate::element::Element;
use crate::error::{RulesError, RulesResult};

/// Numeric meaning of a card
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierValue {
    Add(i32),
    Double,
    Null,
}

/// Where a card came from; temporary cards leave the deck once drawn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    #[default]
    Standard,
    Bless,
    Curse,
}

/// Extra effect printed on a card
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardEffect {
    Condition(ConditionKind),
    Pierce(u32),
    Infuse(Element),
    HealSelf(u32),
    Push(u32),
    Pull(u32),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierCard {
    pub value: ModifierValue,
    #[serde(default)]
    pub rolling: bool,
    #[serde(default)]
    pub effects: Vec<CardEffect>,
    #[serde(default)]
    pub kind: CardKind,
}

impl ModifierCard {
    pub fn new(value: ModifierValue) -> Self {
        Self {
            value,
            rolling: false,
            effects: Vec::new(),
            kind: CardKind::Standard,
        }
    }

    pub fn plus(n: i32) -> Self {
        Self::new(ModifierValue::Add(n))
    }

    pub fn double() -> Self {
        Self::new(ModifierValue::Double)
    }

    pub fn null() -> Self {
        Self::new(ModifierValue::Null)
    }

    pub fn bless() -> Self {
        Self {
            kind: CardKind::Bless,
            ..Self::double()
        }
    }

    pub fn curse() -> Self {
        Self {
            kind: CardKind::Curse,
            ..Self::null()
        }
    }

    pub fn rolling(mut self) -> Self {
        self.rolling = true;
        self
    }

    pub fn with_effect(mut self, effect: CardEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Bless and curse cards leave circulation once drawn
    pub fn is_temporary(&self) -> bool {
        matches!(self.kind, CardKind::Bless | CardKind::Curse)
    }

    /// Drawing a standard Null or ×2 flags the deck for reshuffle
    pub fn triggers_reshuffle(&self) -> bool {
        !self.is_temporary() && matches!(self.value, ModifierValue::Null | ModifierValue::Double)
    }

    /// Apply to a running attack total
    pub fn apply(&self, total: i32) -> i32 {
        match self.value {
            ModifierValue::Add(n) => total.saturating_add(n),
            ModifierValue::Double => total.saturating_mul(2),
            ModifierValue::Null => 0,
        }
    }

    /// Ordering score of this card as the end of a chain; Null is the worst
    fn terminal_score(&self, base: i32) -> i64 {
        match self.value {
            ModifierValue::Null => i64::MIN,
            _ => self.apply(base) as i64,
        }
    }
}

impl fmt::Display for ModifierCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.value) {
            (CardKind::Bless, _) => write!(f, "bless")?,
            (CardKind::Curse, _) => write!(f, "curse")?,
            (_, ModifierValue::Add(n)) => write!(f, "{:+}", n)?,
            (_, ModifierValue::Double) => write!(f, "x2")?,
            (_, ModifierValue::Null) => write!(f, "null")?,
        }
        if self.rolling {
            write!(f, " rolling")?;
        }
        for effect in &self.effects {
            write!(f, " {:?}", effect)?;
        }
        Ok(())
    }
}

/// Rolling cards followed by one non-rolling card
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModifierChain {
    cards: Vec<ModifierCard>,
}

impl ModifierChain {
    pub fn cards(&self) -> &[ModifierCard] {
        &self.cards
    }

    /// The non-rolling card that closed the chain
    pub fn terminal(&self) -> &ModifierCard {
        // a chain is never empty
        &self.cards[self.cards.len() - 1]
    }

    pub fn has_rolling(&self) -> bool {
        self.cards.len() > 1
    }

    /// Running total: rolling adds accumulate, Null zeroes everything,
    /// ×2 doubles the total so far
    pub fn apply(&self, base: i32) -> i32 {
        let mut total = base;
        for card in &self.cards {
            if card.value == ModifierValue::Null {
                return 0;
            }
            total = card.apply(total);
        }
        total
    }

    pub fn effects(&self) -> impl Iterator<Item = &CardEffect> + '_ {
        self.cards.iter().flat_map(|c| c.effects.iter())
    }

    /// Order two chains by their final card. `Greater` means `self` is the
    /// better draw.
    pub fn compare(&self, other: &ModifierChain, base: i32) -> Ordering {
        self.terminal()
            .terminal_score(base)
            .cmp(&other.terminal().terminal_score(base))
    }
}

/// Result of drawing for one attack
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawOutcome {
    /// The chain whose effects apply
    pub applied: ModifierChain,
    /// Every card drawn, in draw order, both chains included
    pub drawn: Vec<ModifierCard>,
    pub advantage_applied: bool,
    pub disadvantage_applied: bool,
}

/// Ordered add / remove / replace edits from perks and items
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DeckModification {
    Add { cards: Vec<ModifierCard> },
    Remove { cards: Vec<ModifierCard> },
    Replace { remove: Vec<ModifierCard>, add: Vec<ModifierCard> },
}

/// One figure's attack modifier deck
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackModifierDeck {
    /// Front is the top of the pile
    draw_pile: VecDeque<ModifierCard>,
    discard_pile: Vec<ModifierCard>,
    needs_reshuffle: bool,
}

impl AttackModifierDeck {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// The 20 standard cards in a fixed order (unshuffled)
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(20);
        cards.push(ModifierCard::null());
        cards.push(ModifierCard::double());
        cards.extend(std::iter::repeat(ModifierCard::plus(-1)).take(5));
        cards.push(ModifierCard::plus(-2));
        cards.extend(std::iter::repeat(ModifierCard::plus(0)).take(6));
        cards.extend(std::iter::repeat(ModifierCard::plus(1)).take(5));
        cards.push(ModifierCard::plus(2));
        Self::from_draw_order(cards)
    }

    pub fn standard_shuffled<R: Rng>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle(rng);
        deck
    }

    /// Build a deck whose draw pile is exactly `cards`, first card on top
    pub fn from_draw_order(cards: Vec<ModifierCard>) -> Self {
        Self {
            draw_pile: cards.into(),
            discard_pile: Vec::new(),
            needs_reshuffle: false,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn draw_pile(&self) -> impl Iterator<Item = &ModifierCard> + '_ {
        self.draw_pile.iter()
    }

    pub fn discard_pile(&self) -> &[ModifierCard] {
        &self.discard_pile
    }

    /// Cards across both piles
    pub fn len(&self) -> usize {
        self.draw_pile.len() + self.discard_pile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn needs_reshuffle(&self) -> bool {
        self.needs_reshuffle
    }

    pub fn bless_count(&self) -> usize {
        self.count_kind(CardKind::Bless)
    }

    pub fn curse_count(&self) -> usize {
        self.count_kind(CardKind::Curse)
    }

    fn count_kind(&self, kind: CardKind) -> usize {
        self.draw_pile
            .iter()
            .chain(self.discard_pile.iter())
            .filter(|c| c.kind == kind)
            .count()
    }

    // ========================================================================
    // SHUFFLING
    // ========================================================================

    /// Shuffle the draw pile in place
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.draw_pile.make_contiguous().shuffle(rng);
    }

    /// Gather both piles into a freshly shuffled draw pile
    pub fn reshuffle<R: Rng>(&mut self, rng: &mut R) {
        self.draw_pile.extend(self.discard_pile.drain(..));
        self.shuffle(rng);
        self.needs_reshuffle = false;
        tracing::debug!(cards = self.draw_pile.len(), "modifier deck reshuffled");
    }

    /// Run a pending reshuffle; true if one happened
    pub fn finish_draw<R: Rng>(&mut self, rng: &mut R) -> bool {
        if self.needs_reshuffle {
            self.reshuffle(rng);
            true
        } else {
            false
        }
    }

    // ========================================================================
    // COMPOSITION
    // ========================================================================

    /// Apply a perk/item edit. Either the whole edit applies or nothing does.
    pub fn apply_modification(&mut self, modification: &DeckModification) -> RulesResult<()> {
        let mut next = self.clone();
        match modification {
            DeckModification::Add { cards } => next.add_cards(cards),
            DeckModification::Remove { cards } => next.remove_cards(cards)?,
            DeckModification::Replace { remove, add } => {
                next.remove_cards(remove)?;
                next.add_cards(add);
            }
        }
        *self = next;
        Ok(())
    }

    fn add_cards(&mut self, cards: &[ModifierCard]) {
        self.draw_pile.extend(cards.iter().cloned());
    }

    fn remove_cards(&mut self, cards: &[ModifierCard]) -> RulesResult<()> {
        for card in cards {
            if let Some(idx) = self.draw_pile.iter().position(|c| c == card) {
                self.draw_pile.remove(idx);
            } else if let Some(idx) = self.discard_pile.iter().position(|c| c == card) {
                self.discard_pile.remove(idx);
            } else {
                return Err(RulesError::UnknownCard(card.to_string()));
            }
        }
        Ok(())
    }

    /// Shuffle up to `count` bless cards into the draw pile without exceeding
    /// `cap` in the deck. Returns how many were added.
    pub fn add_bless<R: Rng>(&mut self, count: usize, cap: usize, rng: &mut R) -> usize {
        let room = cap.saturating_sub(self.bless_count());
        self.insert_randomly(ModifierCard::bless(), count.min(room), rng)
    }

    /// Curse counterpart of [`AttackModifierDeck::add_bless`]
    pub fn add_curse<R: Rng>(&mut self, count: usize, cap: usize, rng: &mut R) -> usize {
        let room = cap.saturating_sub(self.curse_count());
        self.insert_randomly(ModifierCard::curse(), count.min(room), rng)
    }

    /// Drop every bless and curse still in the deck
    pub fn clear_temporary(&mut self) {
        self.draw_pile.retain(|c| !c.is_temporary());
        self.discard_pile.retain(|c| !c.is_temporary());
    }

    fn insert_randomly<R: Rng>(&mut self, card: ModifierCard, count: usize, rng: &mut R) -> usize {
        for _ in 0..count {
            let idx = rng.gen_range(0..=self.draw_pile.len());
            self.draw_pile.insert(idx, card.clone());
        }
        count
    }

    // ========================================================================
    // DRAWING
    // ========================================================================

    /// Draw one card. An empty draw pile is refilled from the discard pile
    /// first; None means the deck holds no cards at all.
    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Option<ModifierCard> {
        let card = self.take_card(rng)?;
        self.settle(vec![card.clone()]);
        Some(card)
    }

    /// Draw until a non-rolling card closes the chain. None if the deck has
    /// no non-rolling card left to close it.
    pub fn draw_chain<R: Rng>(&mut self, rng: &mut R) -> Option<ModifierChain> {
        let mut in_hand = Vec::new();
        match self.chain_into(&mut in_hand, rng) {
            Some(chain) => {
                self.settle(in_hand);
                Some(chain)
            }
            None => {
                self.abandon(in_hand);
                None
            }
        }
    }

    /// Draw for one attack.
    ///
    /// Advantage keeps the better of two chains, disadvantage the worse; both
    /// together cancel to a single chain. Ties keep the chain without rolling
    /// cards, then the first one drawn. Cards stay in hand until the whole
    /// draw is done, so a refill partway through only recycles cards from
    /// earlier attacks.
    pub fn draw_for_attack<R: Rng>(
        &mut self,
        advantage: bool,
        disadvantage: bool,
        base: i32,
        rng: &mut R,
    ) -> Option<DrawOutcome> {
        let advantage_applied = advantage && !disadvantage;
        let disadvantage_applied = disadvantage && !advantage;

        let mut in_hand = Vec::new();
        let chains = match self.chain_into(&mut in_hand, rng) {
            Some(first) if !advantage_applied && !disadvantage_applied => Some((first, None)),
            Some(first) => self.chain_into(&mut in_hand, rng).map(|second| (first, Some(second))),
            None => None,
        };
        let Some((first, second)) = chains else {
            self.abandon(in_hand);
            return None;
        };
        let drawn = in_hand.clone();
        self.settle(in_hand);

        let applied = match second {
            None => first,
            Some(second) => {
                let ordering = match first.compare(&second, base) {
                    Ordering::Equal => {
                        // the plainer chain wins ties
                        second.has_rolling().cmp(&first.has_rolling())
                    }
                    other if disadvantage_applied => other.reverse(),
                    other => other,
                };
                if ordering == Ordering::Less {
                    second
                } else {
                    first
                }
            }
        };

        Some(DrawOutcome {
            applied,
            drawn,
            advantage_applied,
            disadvantage_applied,
        })
    }

    fn take_card<R: Rng>(&mut self, rng: &mut R) -> Option<ModifierCard> {
        if self.draw_pile.is_empty() {
            self.reshuffle(rng);
        }
        let card = self.draw_pile.pop_front()?;
        tracing::debug!(card = %card, "drew modifier");
        Some(card)
    }

    /// Draw one chain onto `in_hand`. Cards in hand are in neither pile.
    fn chain_into<R: Rng>(&mut self, in_hand: &mut Vec<ModifierCard>, rng: &mut R) -> Option<ModifierChain> {
        let start = in_hand.len();
        loop {
            if !self.can_close_chain() {
                tracing::warn!(rolling = in_hand.len() - start, "no card left to close modifier chain");
                return None;
            }
            let card = self.take_card(rng)?;
            let rolling = card.rolling;
            in_hand.push(card);
            if !rolling {
                return Some(ModifierChain {
                    cards: in_hand[start..].to_vec(),
                });
            }
        }
    }

    fn can_close_chain(&self) -> bool {
        self.draw_pile.iter().chain(self.discard_pile.iter()).any(|c| !c.rolling)
    }

    /// Finish a draw: flag the reshuffle and discard everything but bless and
    /// curse
    fn settle(&mut self, in_hand: Vec<ModifierCard>) {
        for card in in_hand {
            if card.triggers_reshuffle() {
                self.needs_reshuffle = true;
            }
            if !card.is_temporary() {
                self.discard_pile.push(card);
            }
        }
    }

    /// Put a failed draw back on top of the draw pile in drawn order
    fn abandon(&mut self, in_hand: Vec<ModifierCard>) {
        for card in in_hand.into_iter().rev() {
            self.draw_pile.push_front(card);
        }
    }
}
