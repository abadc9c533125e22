//! Ordered player list and the card quota derived from its length.
//!
//! Players are positional: index `i` is stable until the roster shrinks
//! below it. Resizing truncates from the end or appends, never renumbers.
//! Display names live here and nowhere else; every view that needs a name
//! asks the roster at render time.

use crate::model::card::DEALT_CARDS;
use crate::model::choice::Choice;
use thiserror::Error;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;
pub const DEFAULT_PLAYERS: usize = 6;

/// Label shown for the case-file sentinel owner.
pub const CASE_FILE_LABEL: &str = "(solution)";

/// Splits the 18 dealt cards as evenly as possible: `18 div n` each, the
/// first `18 mod n` players taking one extra.
pub fn card_quota(player_count: usize) -> Vec<u8> {
    if player_count == 0 {
        return Vec::new();
    }
    let base = DEALT_CARDS / player_count;
    let remainder = DEALT_CARDS % player_count;
    (0..player_count)
        .map(|i| {
            let count = if i < remainder { base + 1 } else { base };
            count as u8
        })
        .collect()
}

pub fn default_name(index: usize) -> String {
    format!("Player {}", index + 1)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("player count {0} is outside 2..=6")]
    InvalidPlayerCount(usize),
    #[error("no player at index {index} (roster has {player_count})")]
    InvalidPlayer { index: usize, player_count: usize },
    #[error("card count {0} exceeds the 18 dealt cards")]
    InvalidCardCount(u8),
    #[error("player name must not be empty")]
    EmptyName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    names: Vec<String>,
    card_counts: Vec<u8>,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            names: (0..DEFAULT_PLAYERS).map(default_name).collect(),
            card_counts: card_quota(DEFAULT_PLAYERS),
        }
    }
}

impl Roster {
    pub fn new(player_count: usize) -> Result<Self, RosterError> {
        check_player_count(player_count)?;
        Ok(Self {
            names: (0..player_count).map(default_name).collect(),
            card_counts: card_quota(player_count),
        })
    }

    pub fn player_count(&self) -> usize {
        self.names.len()
    }

    /// Owner index that stands for the case file.
    pub fn case_file_index(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn card_counts(&self) -> &[u8] {
        &self.card_counts
    }

    pub fn card_count(&self, index: usize) -> Option<u8> {
        self.card_counts.get(index).copied()
    }

    /// True when `index` names a seated player or the case file.
    pub fn is_valid_owner(&self, index: usize) -> bool {
        index <= self.case_file_index()
    }

    /// Name for an owner index, resolving the case-file sentinel.
    pub fn owner_label(&self, index: usize) -> Option<&str> {
        if index == self.case_file_index() {
            Some(CASE_FILE_LABEL)
        } else {
            self.name(index)
        }
    }

    /// Changes the number of seats, keeping names below `min(old, new)` and
    /// synthesising defaults for appended seats. Card counts are recomputed
    /// from the quota, discarding any per-player overrides.
    pub fn resize(&mut self, player_count: usize) -> Result<(), RosterError> {
        check_player_count(player_count)?;
        let current = self.names.len();
        if player_count < current {
            self.names.truncate(player_count);
        } else {
            self.names.extend((current..player_count).map(default_name));
        }
        self.card_counts = card_quota(player_count);
        Ok(())
    }

    pub fn rename(&mut self, index: usize, name: &str) -> Result<(), RosterError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RosterError::EmptyName);
        }
        let player_count = self.player_count();
        let slot = self
            .names
            .get_mut(index)
            .ok_or(RosterError::InvalidPlayer {
                index,
                player_count,
            })?;
        *slot = trimmed.to_string();
        Ok(())
    }

    pub fn set_card_count(&mut self, index: usize, count: u8) -> Result<(), RosterError> {
        if count as usize > DEALT_CARDS {
            return Err(RosterError::InvalidCardCount(count));
        }
        let player_count = self.player_count();
        let slot = self
            .card_counts
            .get_mut(index)
            .ok_or(RosterError::InvalidPlayer {
                index,
                player_count,
            })?;
        *slot = count;
        Ok(())
    }

    pub fn total_cards(&self) -> usize {
        self.card_counts.iter().map(|&c| c as usize).sum()
    }

    pub fn check_player(&self, index: usize) -> Result<(), RosterError> {
        if index < self.player_count() {
            Ok(())
        } else {
            Err(RosterError::InvalidPlayer {
                index,
                player_count: self.player_count(),
            })
        }
    }

    /// Seated players, used for "made by" selectors.
    pub fn player_choices(&self) -> Vec<Choice> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| Choice::new(name.clone(), i.to_string()))
            .collect()
    }

    /// Players followed by the case file, for "owned by" selectors.
    pub fn owner_choices(&self) -> Vec<Choice> {
        let mut choices = self.player_choices();
        choices.push(Choice::new(
            "Solution (case file)",
            self.case_file_index().to_string(),
        ));
        choices
    }

    /// "None" followed by players, for "refuted by" selectors.
    pub fn refuter_choices(&self) -> Vec<Choice> {
        let mut choices = vec![Choice::new("None", "-1")];
        choices.extend(self.player_choices());
        choices
    }
}

fn check_player_count(player_count: usize) -> Result<(), RosterError> {
    if (MIN_PLAYERS..=MAX_PLAYERS).contains(&player_count) {
        Ok(())
    } else {
        Err(RosterError::InvalidPlayerCount(player_count))
    }
}
