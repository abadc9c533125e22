//! Request composition. Key names and sentinel values are fixed by the
//! existing backend script and must not change.

use crate::session::SessionToken;
use clue_core::model::card::Card;
use clue_core::model::choice::NONE_CARD_VALUE;
use clue_core::model::clue::{OwnerChoice, RefutingCard, Suggestion};
use clue_core::model::roster::Roster;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::fmt::Write as _;

/// Characters left bare in `application/x-www-form-urlencoded` output.
const FORM_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*');

/// Wire value for "no player" in owner and refuter fields.
pub const NO_PLAYER: &str = "-1";

/// Wire value for "a card was shown but we did not see which".
pub const UNKNOWN_CARD_VALUE: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    New,
    WhoOwns,
    Suggestion,
}

impl Action {
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::New => "new",
            Action::WhoOwns => "whoOwns",
            Action::Suggestion => "suggestion",
        }
    }
}

/// Ordered key/value parameters for one backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    action: Action,
    params: Vec<(String, String)>,
}

impl FormRequest {
    fn new(action: Action) -> Self {
        Self {
            action,
            params: vec![("action".to_string(), action.as_str().to_string())],
        }
    }

    fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.push((key.into(), value.into()));
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `key=value&key2=value2`, percent-encoded.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (i, (key, value)) in self.params.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            let _ = write!(
                out,
                "{}={}",
                utf8_percent_encode(key, FORM_VALUE),
                utf8_percent_encode(value, FORM_VALUE)
            );
        }
        out
    }
}

/// `action=new&players=<n>&numCards<i>=<count>`
pub fn new_game_request(roster: &Roster) -> FormRequest {
    let mut request = FormRequest::new(Action::New);
    request.push("players", roster.player_count().to_string());
    for (i, count) in roster.card_counts().iter().enumerate() {
        request.push(format!("numCards{i}"), count.to_string());
    }
    request
}

/// `action=whoOwns&sess=<token>&owner=<index|-1>&card=<id>`
pub fn ownership_request(
    token: &SessionToken,
    card: Card,
    owner: OwnerChoice,
    roster: &Roster,
) -> FormRequest {
    let mut request = FormRequest::new(Action::WhoOwns);
    request.push("sess", token.as_str());
    request.push("owner", owner_value(owner, roster));
    request.push("card", card.id());
    request
}

/// `action=suggestion&sess=..&suggestingPlayer=..&card1..3=..&refutingPlayer=..&refutingCard=..`
pub fn suggestion_request(token: &SessionToken, suggestion: &Suggestion) -> FormRequest {
    let mut request = FormRequest::new(Action::Suggestion);
    request.push("sess", token.as_str());
    request.push("suggestingPlayer", suggestion.suggester.to_string());
    request.push("card1", suggestion.suspect.id());
    request.push("card2", suggestion.weapon.id());
    request.push("card3", suggestion.room.id());
    request.push(
        "refutingPlayer",
        suggestion
            .refuter
            .map_or_else(|| NO_PLAYER.to_string(), |index| index.to_string()),
    );
    request.push("refutingCard", refuting_card_value(suggestion.refuting_card));
    request
}

fn owner_value(owner: OwnerChoice, roster: &Roster) -> String {
    match owner {
        OwnerChoice::Player(index) => index.to_string(),
        OwnerChoice::CaseFile => roster.case_file_index().to_string(),
        OwnerChoice::Nobody => NO_PLAYER.to_string(),
    }
}

fn refuting_card_value(card: RefutingCard) -> &'static str {
    match card {
        RefutingCard::None => NONE_CARD_VALUE,
        RefutingCard::Unknown => UNKNOWN_CARD_VALUE,
        RefutingCard::Shown(card) => card.id(),
    }
}
