use super::belief::{BeliefState, OwnershipBelief};
use super::store::KnowledgeStore;
use crate::model::card::Card;
use crate::model::category::Category;
use crate::model::roster::Roster;

/// Renders beliefs using the roster's names at the moment of rendering.
///
/// Nothing here caches a name, so a rename shows up on the next render.
#[derive(Debug, Clone, Copy)]
pub struct BeliefView<'a> {
    store: &'a KnowledgeStore,
    roster: &'a Roster,
}

impl<'a> BeliefView<'a> {
    pub fn new(store: &'a KnowledgeStore, roster: &'a Roster) -> Self {
        Self { store, roster }
    }

    /// Short caption: "Unknown", "Owned by A or B" or "Solution!".
    pub fn caption(&self, belief: &OwnershipBelief) -> String {
        match belief.state() {
            BeliefState::Unknown if belief.candidates().is_empty() => "Unknown".to_string(),
            BeliefState::Unknown | BeliefState::OwnedByPlayer => {
                format!("Owned by {}", self.owned_by(belief.candidates()))
            }
            BeliefState::OwnedByCaseFile => "Solution!".to_string(),
        }
    }

    pub fn card_caption(&self, card: Card) -> String {
        self.caption(self.store.belief(card))
    }

    /// One line per card grouped under category headings.
    pub fn lines(&self) -> Vec<String> {
        let width = Card::ALL.iter().map(|c| c.label().len()).max().unwrap_or(0);
        let mut lines = Vec::with_capacity(Card::ALL.len() + Category::ALL.len());
        for category in Category::ALL {
            lines.push(format!("{}:", category.plural()));
            for card in Card::in_category(category) {
                lines.push(format!(
                    "  {:<width$}  {}",
                    card.label(),
                    self.card_caption(card),
                    width = width
                ));
            }
        }
        lines
    }

    fn owned_by(&self, owners: &[usize]) -> String {
        if owners.is_empty() {
            return "???".to_string();
        }
        owners
            .iter()
            .map(|&index| self.roster.owner_label(index).unwrap_or("?"))
            .collect::<Vec<_>>()
            .join(" or ")
    }
}
