//! Elemental infusions: six independent Strong / Waning / Inert cells

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Fire,
    Ice,
    Air,
    Earth,
    Light,
    Dark,
}

impl Element {
    pub const ALL: [Element; 6] = [
        Element::Fire,
        Element::Ice,
        Element::Air,
        Element::Earth,
        Element::Light,
        Element::Dark,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementState {
    #[default]
    Inert,
    Waning,
    Strong,
}

impl ElementState {
    /// One step down; Inert stays Inert
    fn waned(self) -> Self {
        match self {
            ElementState::Strong => ElementState::Waning,
            ElementState::Waning | ElementState::Inert => ElementState::Inert,
        }
    }
}

/// Per-scenario element board
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementTracker {
    cells: [ElementState; 6],
}

impl ElementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, element: Element) -> ElementState {
        self.cells[element.index()]
    }

    /// Set to Strong regardless of prior state
    pub fn infuse(&mut self, element: Element) {
        self.cells[element.index()] = ElementState::Strong;
    }

    /// Spend an element. Succeeds only from Strong or Waning.
    pub fn consume(&mut self, element: Element) -> bool {
        let cell = &mut self.cells[element.index()];
        match *cell {
            ElementState::Strong | ElementState::Waning => {
                *cell = ElementState::Inert;
                true
            }
            ElementState::Inert => false,
        }
    }

    /// End-of-round decay for every element
    pub fn wane_all(&mut self) {
        for cell in &mut self.cells {
            *cell = cell.waned();
        }
    }

    pub fn reset(&mut self) {
        self.cells = [ElementState::Inert; 6];
    }

    /// Elements that can currently be consumed
    pub fn available(&self) -> impl Iterator<Item = Element> + '_ {
        Element::ALL
            .into_iter()
            .filter(|&e| self.state(e) != ElementState::Inert)
    }
}
