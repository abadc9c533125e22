//! User-reported facts, validated against the roster before they are sent.

use crate::model::card::Card;
use crate::model::category::Category;
use crate::model::roster::Roster;
use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who a card was reported to belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerChoice {
    Player(usize),
    CaseFile,
    Nobody,
}

/// The card shown when a suggestion was refuted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefutingCard {
    /// Nobody showed a card.
    None,
    /// A card was shown, but not to us.
    Unknown,
    Shown(Card),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Suggestion {
    pub suggester: usize,
    pub suspect: Card,
    pub weapon: Card,
    pub room: Card,
    pub refuter: Option<usize>,
    pub refuting_card: RefutingCard,
}

impl Suggestion {
    pub fn cards(&self) -> [Card; 3] {
        [self.suspect, self.weapon, self.room]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Clue {
    Ownership { card: Card, owner: OwnerChoice },
    Suggestion(Suggestion),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClueError {
    #[error("player index {index} is not seated (roster has {player_count})")]
    UnknownPlayer { index: usize, player_count: usize },
    #[error("{card} is not a {expected}")]
    WrongCategory { card: Card, expected: Category },
    #[error("a player cannot refute their own suggestion")]
    SelfRefutation,
    #[error("a refuting card was given without a refuting player")]
    CardWithoutRefuter,
    #[error("{0} was not one of the suggested cards")]
    CardNotSuggested(Card),
}

impl Clue {
    pub fn validate(&self, roster: &Roster) -> Result<(), ClueError> {
        match self {
            Clue::Ownership { owner, .. } => match owner {
                OwnerChoice::Player(index) => check_seat(*index, roster),
                OwnerChoice::CaseFile | OwnerChoice::Nobody => Ok(()),
            },
            Clue::Suggestion(suggestion) => suggestion.validate(roster),
        }
    }

    /// Render with the roster's current names.
    pub fn describe(&self, roster: &Roster) -> String {
        match self {
            Clue::Ownership { card, owner } => match owner {
                OwnerChoice::Player(index) => {
                    format!("{} owns {card}", player_name(roster, *index))
                }
                OwnerChoice::CaseFile => format!("{card} is in the case file"),
                OwnerChoice::Nobody => format!("{card} has no known owner"),
            },
            Clue::Suggestion(s) => {
                let mut text = format!(
                    "{} suggested {}, {}, {}",
                    player_name(roster, s.suggester),
                    s.suspect,
                    s.weapon,
                    s.room
                );
                match s.refuter {
                    Some(index) => {
                        text.push_str(&format!("; refuted by {}", player_name(roster, index)));
                    }
                    None => text.push_str("; not refuted"),
                }
                if let RefutingCard::Shown(card) = s.refuting_card {
                    text.push_str(&format!(" with {card}"));
                }
                text
            }
        }
    }
}

impl Suggestion {
    fn validate(&self, roster: &Roster) -> Result<(), ClueError> {
        check_seat(self.suggester, roster)?;
        for (card, expected) in [
            (self.suspect, Category::Suspect),
            (self.weapon, Category::Weapon),
            (self.room, Category::Room),
        ] {
            if card.category() != expected {
                return Err(ClueError::WrongCategory { card, expected });
            }
        }
        match self.refuter {
            Some(index) => {
                check_seat(index, roster)?;
                if index == self.suggester {
                    return Err(ClueError::SelfRefutation);
                }
            }
            None => {
                if matches!(self.refuting_card, RefutingCard::Shown(_)) {
                    return Err(ClueError::CardWithoutRefuter);
                }
            }
        }
        if let RefutingCard::Shown(card) = self.refuting_card
            && !self.cards().contains(&card)
        {
            return Err(ClueError::CardNotSuggested(card));
        }
        Ok(())
    }
}

fn check_seat(index: usize, roster: &Roster) -> Result<(), ClueError> {
    if index < roster.player_count() {
        Ok(())
    } else {
        Err(ClueError::UnknownPlayer {
            index,
            player_count: roster.player_count(),
        })
    }
}

fn player_name(roster: &Roster, index: usize) -> &str {
    roster.name(index).unwrap_or("?")
}

impl fmt::Display for OwnerChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerChoice::Player(index) => write!(f, "player {index}"),
            OwnerChoice::CaseFile => f.write_str("case file"),
            OwnerChoice::Nobody => f.write_str("nobody"),
        }
    }
}
