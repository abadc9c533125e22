use crate::knowledge::{BeliefState, BeliefView, KnowledgeStore};
use crate::model::card::Card;
use crate::model::roster::Roster;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSnapshot {
    pub name: String,
    pub cards: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardSnapshot {
    pub card: Card,
    pub label: String,
    pub state: BeliefState,
    pub candidates: Vec<usize>,
    pub caption: String,
}

/// Read-only export of the roster and every card's belief.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeSnapshot {
    pub players: Vec<PlayerSnapshot>,
    pub cards: Vec<CardSnapshot>,
    pub revision: u64,
}

impl KnowledgeSnapshot {
    pub fn capture(store: &KnowledgeStore, roster: &Roster) -> Self {
        let view = BeliefView::new(store, roster);
        let players = roster
            .names()
            .iter()
            .zip(roster.card_counts())
            .map(|(name, &cards)| PlayerSnapshot {
                name: name.clone(),
                cards,
            })
            .collect();
        let cards = store
            .iter()
            .map(|(card, belief)| CardSnapshot {
                card,
                label: card.label().to_string(),
                state: belief.state(),
                candidates: belief.candidates().to_vec(),
                caption: view.caption(belief),
            })
            .collect();
        KnowledgeSnapshot {
            players,
            cards,
            revision: store.revision(),
        }
    }

    pub fn to_json(store: &KnowledgeStore, roster: &Roster) -> serde_json::Result<String> {
        let snapshot = Self::capture(store, roster);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
