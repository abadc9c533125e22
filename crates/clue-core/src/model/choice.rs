//! Label/value pairs feeding selection widgets.

use crate::model::card::Card;
use crate::model::category::Category;
use serde::Serialize;

/// Value submitted for the "None/Unknown" entry of card selectors.
pub const NONE_CARD_VALUE: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub label: String,
    pub value: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Cards of one category (or all cards when `category` is `None`), optionally
/// led by a "None/Unknown" entry.
pub fn card_choices(category: Option<Category>, include_none: bool) -> Vec<Choice> {
    let mut choices = Vec::with_capacity(22);
    if include_none {
        choices.push(Choice::new("None/Unknown", NONE_CARD_VALUE));
    }
    choices.extend(
        Card::ALL
            .iter()
            .filter(|card| category.is_none_or(|c| card.category() == c))
            .map(|card| Choice::new(card.label(), card.id())),
    );
    choices
}
