use crate::model::category::Category;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the 21 printed cards. Variant names double as the stable internal
/// identifiers the backend speaks; display labels are separate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Card {
    ProfessorPlum = 0,
    ColonelMustard = 1,
    MrGreen = 2,
    MissScarlet = 3,
    MsWhite = 4,
    MrsPeacock = 5,
    Knife = 6,
    Candlestick = 7,
    Revolver = 8,
    LeadPipe = 9,
    Rope = 10,
    Wrench = 11,
    Hall = 12,
    Conservatory = 13,
    DiningRoom = 14,
    Kitchen = 15,
    Study = 16,
    Library = 17,
    Ballroom = 18,
    Lounge = 19,
    BilliardRoom = 20,
}

pub const CARD_COUNT: usize = 21;

/// Cards dealt to players once the case file has taken one of each category.
pub const DEALT_CARDS: usize = CARD_COUNT - 3;

impl Card {
    pub const ALL: [Card; CARD_COUNT] = [
        Card::ProfessorPlum,
        Card::ColonelMustard,
        Card::MrGreen,
        Card::MissScarlet,
        Card::MsWhite,
        Card::MrsPeacock,
        Card::Knife,
        Card::Candlestick,
        Card::Revolver,
        Card::LeadPipe,
        Card::Rope,
        Card::Wrench,
        Card::Hall,
        Card::Conservatory,
        Card::DiningRoom,
        Card::Kitchen,
        Card::Study,
        Card::Library,
        Card::Ballroom,
        Card::Lounge,
        Card::BilliardRoom,
    ];

    pub const fn from_index(index: usize) -> Option<Self> {
        if index < CARD_COUNT {
            Some(Card::ALL[index])
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn category(self) -> Category {
        match self as u8 {
            0..=5 => Category::Suspect,
            6..=11 => Category::Weapon,
            _ => Category::Room,
        }
    }

    pub const fn id(self) -> &'static str {
        match self {
            Card::ProfessorPlum => "ProfessorPlum",
            Card::ColonelMustard => "ColonelMustard",
            Card::MrGreen => "MrGreen",
            Card::MissScarlet => "MissScarlet",
            Card::MsWhite => "MsWhite",
            Card::MrsPeacock => "MrsPeacock",
            Card::Knife => "Knife",
            Card::Candlestick => "Candlestick",
            Card::Revolver => "Revolver",
            Card::LeadPipe => "LeadPipe",
            Card::Rope => "Rope",
            Card::Wrench => "Wrench",
            Card::Hall => "Hall",
            Card::Conservatory => "Conservatory",
            Card::DiningRoom => "DiningRoom",
            Card::Kitchen => "Kitchen",
            Card::Study => "Study",
            Card::Library => "Library",
            Card::Ballroom => "Ballroom",
            Card::Lounge => "Lounge",
            Card::BilliardRoom => "BilliardRoom",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Card::ProfessorPlum => "Professor Plum",
            Card::ColonelMustard => "Colonel Mustard",
            Card::MrGreen => "Mr. Green",
            Card::MissScarlet => "Miss Scarlet",
            Card::MsWhite => "Ms. White",
            Card::MrsPeacock => "Mrs. Peacock",
            Card::LeadPipe => "Lead Pipe",
            Card::DiningRoom => "Dining Room",
            Card::BilliardRoom => "Billiard Room",
            other => other.id(),
        }
    }

    /// Exact match on the internal identifier, as sent by the backend.
    pub fn from_id(id: &str) -> Option<Self> {
        Card::ALL.iter().copied().find(|card| card.id() == id)
    }

    /// Lenient lookup for typed input: identifier or label, ignoring case,
    /// spaces and dots ("lead pipe", "mr. green", "MRGREEN").
    pub fn lookup(input: &str) -> Option<Self> {
        if let Some(card) = Card::from_id(input) {
            return Some(card);
        }
        let wanted = squash(input);
        if wanted.is_empty() {
            return None;
        }
        Card::ALL
            .iter()
            .copied()
            .find(|card| squash(card.id()) == wanted || squash(card.label()) == wanted)
    }

    pub fn in_category(category: Category) -> impl Iterator<Item = Card> {
        Card::ALL
            .into_iter()
            .filter(move |card| card.category() == category)
    }
}

fn squash(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .flat_map(char::to_lowercase)
        .collect()
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown card '{0}'")]
pub struct UnknownCard(pub String);

impl FromStr for Card {
    type Err = UnknownCard;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Card::lookup(s).ok_or_else(|| UnknownCard(s.to_string()))
    }
}
