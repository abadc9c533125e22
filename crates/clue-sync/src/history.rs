use clue_core::model::card::Card;
use clue_core::model::clue::Clue;

/// A clue the backend accepted, with the cards its reply touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub generation: u64,
    pub clue: Clue,
    pub updated: Vec<Card>,
}

/// Ordered log of accepted clues for the current game.
#[derive(Debug, Clone, Default)]
pub struct ClueHistory {
    entries: Vec<HistoryEntry>,
}

impl ClueHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }
}
