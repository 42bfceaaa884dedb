//! Turn order within a round

use serde::{Deserialize, Serialize};

use crate::figure::{FigureId, FigureType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeEntry {
    pub figure: FigureId,
    pub figure_type: FigureType,
    /// Lower acts earlier
    pub initiative: u32,
    /// Initiative printed on the leading card; breaks ties between
    /// characters
    #[serde(default)]
    pub leading_card: u32,
}

impl InitiativeEntry {
    pub fn new(figure: FigureId, figure_type: FigureType, initiative: u32) -> Self {
        Self {
            figure,
            figure_type,
            initiative,
            leading_card: initiative,
        }
    }

    pub fn with_leading_card(mut self, leading_card: u32) -> Self {
        self.leading_card = leading_card;
        self
    }

    fn sort_key(&self) -> (u32, FigureType, u32, FigureId) {
        (self.initiative, self.figure_type, self.leading_card, self.figure)
    }
}

/// Acting order for one round
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeOrder {
    entries: Vec<InitiativeEntry>,
    cursor: usize,
}

impl InitiativeOrder {
    /// Ascending initiative; ties go to characters before monsters, then
    /// the lower leading card, then the lower figure id
    pub fn new(mut entries: Vec<InitiativeEntry>) -> Self {
        entries.sort_by_key(InitiativeEntry::sort_key);
        Self { entries, cursor: 0 }
    }

    pub fn entries(&self) -> &[InitiativeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn initiative_of(&self, figure: FigureId) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.figure == figure)
            .map(|e| e.initiative)
    }

    /// Figure whose turn comes next, without advancing
    pub fn peek(&self) -> Option<FigureId> {
        self.entries.get(self.cursor).map(|e| e.figure)
    }

    /// Hand out the next figure in order
    pub fn advance(&mut self) -> Option<FigureId> {
        let next = self.peek()?;
        self.cursor += 1;
        Some(next)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.entries.len()
    }

    /// Drop a figure (killed or exhausted) from the order
    pub fn remove(&mut self, figure: FigureId) {
        if let Some(idx) = self.entries.iter().position(|e| e.figure == figure) {
            self.entries.remove(idx);
            if idx < self.cursor {
                self.cursor -= 1;
            }
        }
    }
}
