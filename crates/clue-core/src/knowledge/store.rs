//! Per-card belief storage. The backend is the single source of truth:
//! updates overwrite a card's belief wholesale and nothing is inferred
//! locally.

use super::belief::{BeliefState, OwnershipBelief};
use crate::model::card::{CARD_COUNT, Card};
use std::array;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KnowledgeError {
    #[error("unknown card identifier '{0}'")]
    NotFound(String),
    #[error("owner index {owner} for {card} is out of range (player count {player_count})")]
    InvalidOwner {
        card: Card,
        owner: usize,
        player_count: usize,
    },
    #[error("{0} is reported owned by a player but no owner was given")]
    EmptyOwnerSet(Card),
}

/// One validated replacement for a card's belief.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardUpdate {
    pub card: Card,
    pub state: BeliefState,
    pub owners: Vec<usize>,
}

impl CardUpdate {
    pub fn new(card: Card, state: BeliefState, owners: Vec<usize>) -> Self {
        Self { card, state, owners }
    }

    /// Checks owner indices against the seated player count; the index
    /// equal to `player_count` is the case file.
    pub fn check(&self, player_count: usize) -> Result<(), KnowledgeError> {
        if let Some(&owner) = self.owners.iter().find(|&&owner| owner > player_count) {
            return Err(KnowledgeError::InvalidOwner {
                card: self.card,
                owner,
                player_count,
            });
        }
        if self.state == BeliefState::OwnedByPlayer && self.owners.is_empty() {
            return Err(KnowledgeError::EmptyOwnerSet(self.card));
        }
        Ok(())
    }

    fn into_belief(self) -> OwnershipBelief {
        let candidates = match self.state {
            BeliefState::OwnedByCaseFile => Vec::new(),
            _ => {
                let mut seen = Vec::with_capacity(self.owners.len());
                for owner in self.owners {
                    if !seen.contains(&owner) {
                        seen.push(owner);
                    }
                }
                seen
            }
        };
        OwnershipBelief::from_parts(self.state, candidates)
    }
}

#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    beliefs: [OwnershipBelief; CARD_COUNT],
    revision: u64,
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self {
            beliefs: array::from_fn(|_| OwnershipBelief::unknown()),
            revision: 0,
        }
    }

    /// Lookup by the backend's card identifier.
    pub fn get(&self, card_id: &str) -> Result<&OwnershipBelief, KnowledgeError> {
        let card = Card::from_id(card_id).ok_or_else(|| KnowledgeError::NotFound(card_id.to_string()))?;
        Ok(self.belief(card))
    }

    pub fn belief(&self, card: Card) -> &OwnershipBelief {
        &self.beliefs[card.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Card, &OwnershipBelief)> {
        Card::ALL.iter().copied().zip(self.beliefs.iter())
    }

    /// Bumped once per applied batch or reset; views redraw when it moves.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces a single card's belief.
    pub fn apply_update(
        &mut self,
        card_id: &str,
        state: BeliefState,
        owners: &[usize],
        player_count: usize,
    ) -> Result<(), KnowledgeError> {
        let card = Card::from_id(card_id).ok_or_else(|| KnowledgeError::NotFound(card_id.to_string()))?;
        let update = CardUpdate::new(card, state, owners.to_vec());
        self.apply_batch(vec![update], player_count).map(|_| ())
    }

    /// Validates every update, then applies all of them. On error nothing is
    /// applied. Returns the number of updates written.
    pub fn apply_batch(
        &mut self,
        updates: Vec<CardUpdate>,
        player_count: usize,
    ) -> Result<usize, KnowledgeError> {
        for update in &updates {
            update.check(player_count)?;
        }
        let count = updates.len();
        for update in updates {
            let index = update.card.index();
            self.beliefs[index] = update.into_belief();
        }
        self.revision += 1;
        Ok(count)
    }

    pub fn reset_all(&mut self) {
        for belief in self.beliefs.iter_mut() {
            *belief = OwnershipBelief::unknown();
        }
        self.revision += 1;
    }

    pub fn known_count(&self) -> usize {
        self.beliefs
            .iter()
            .filter(|b| b.state() != BeliefState::Unknown)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unknown_everywhere() {
        let store = KnowledgeStore::new();
        assert_eq!(store.iter().count(), 21);
        assert!(store.iter().all(|(_, b)| !b.has_evidence()));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn get_rejects_unknown_identifiers() {
        let store = KnowledgeStore::new();
        assert!(store.get("Knife").is_ok());
        assert_eq!(
            store.get("Poison"),
            Err(KnowledgeError::NotFound("Poison".into()))
        );
    }

    #[test]
    fn update_then_reset() {
        let mut store = KnowledgeStore::new();
        store
            .apply_update("Knife", BeliefState::OwnedByPlayer, &[2], 6)
            .unwrap();
        let knife = store.get("Knife").unwrap();
        assert_eq!(knife.state(), BeliefState::OwnedByPlayer);
        assert_eq!(knife.candidates(), &[2]);

        store.reset_all();
        let knife = store.get("Knife").unwrap();
        assert_eq!(knife.state(), BeliefState::Unknown);
        assert!(knife.candidates().is_empty());
    }

    #[test]
    fn applying_same_batch_twice_is_idempotent() {
        let batch = vec![
            CardUpdate::new(Card::Knife, BeliefState::OwnedByPlayer, vec![2]),
            CardUpdate::new(Card::Hall, BeliefState::Unknown, vec![0, 1]),
        ];
        let mut once = KnowledgeStore::new();
        once.apply_batch(batch.clone(), 6).unwrap();
        let mut twice = KnowledgeStore::new();
        twice.apply_batch(batch.clone(), 6).unwrap();
        twice.apply_batch(batch, 6).unwrap();
        for card in Card::ALL {
            assert_eq!(once.belief(card), twice.belief(card));
        }
    }

    #[test]
    fn out_of_range_owner_leaves_prior_belief() {
        let mut store = KnowledgeStore::new();
        store
            .apply_update("Rope", BeliefState::OwnedByPlayer, &[1], 6)
            .unwrap();
        let err = store
            .apply_update("Rope", BeliefState::OwnedByPlayer, &[7], 6)
            .unwrap_err();
        assert_eq!(
            err,
            KnowledgeError::InvalidOwner {
                card: Card::Rope,
                owner: 7,
                player_count: 6
            }
        );
        assert_eq!(store.belief(Card::Rope).candidates(), &[1]);
    }

    #[test]
    fn case_file_sentinel_is_a_valid_owner() {
        let mut store = KnowledgeStore::new();
        store
            .apply_update("Study", BeliefState::Unknown, &[0, 6], 6)
            .unwrap();
        assert_eq!(store.belief(Card::Study).candidates(), &[0, 6]);
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let mut store = KnowledgeStore::new();
        let batch = vec![
            CardUpdate::new(Card::Knife, BeliefState::OwnedByPlayer, vec![2]),
            CardUpdate::new(Card::Rope, BeliefState::OwnedByPlayer, vec![]),
        ];
        assert_eq!(
            store.apply_batch(batch, 6),
            Err(KnowledgeError::EmptyOwnerSet(Card::Rope))
        );
        assert!(!store.belief(Card::Knife).has_evidence());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn case_file_state_drops_candidates_and_duplicates_collapse() {
        let mut store = KnowledgeStore::new();
        let batch = vec![
            CardUpdate::new(Card::Lounge, BeliefState::OwnedByCaseFile, vec![6]),
            CardUpdate::new(Card::Wrench, BeliefState::Unknown, vec![3, 1, 3]),
        ];
        assert_eq!(store.apply_batch(batch, 6), Ok(2));
        assert!(store.belief(Card::Lounge).candidates().is_empty());
        assert_eq!(store.belief(Card::Wrench).candidates(), &[3, 1]);
        assert_eq!(store.known_count(), 1);
    }
}
