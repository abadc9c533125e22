//! Reply decoding for the JSON, multi-owner reply schema.
//!
//! ```text
//! {"errorStatus": 0, "errorText": "", "session": "...",
//!  "newInfo": [{"card": "Knife", "status": 1, "owner": [2]}]}
//! ```

use crate::error::{ProtocolError, SyncError};
use crate::session::SessionToken;
use clue_core::knowledge::{BeliefState, CardUpdate, KnowledgeError};
use clue_core::model::card::Card;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct WireReply {
    #[serde(rename = "errorStatus")]
    error_status: Option<i64>,
    #[serde(rename = "errorText", default)]
    error_text: Option<String>,
    #[serde(default)]
    session: Option<String>,
    #[serde(rename = "newInfo", default)]
    new_info: Vec<WireCardInfo>,
}

#[derive(Debug, Deserialize)]
struct WireCardInfo {
    card: String,
    status: i64,
    owner: Vec<i64>,
}

/// A decoded, fully validated clue reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClueReply {
    pub session: SessionToken,
    pub updates: Vec<CardUpdate>,
}

/// Decodes the reply to `action=new`.
pub fn decode_new_game(body: &str) -> Result<SessionToken, SyncError> {
    let reply = parse(body)?;
    session_of(reply.session)
}

/// Decodes the reply to `whoOwns`/`suggestion`, validating every update
/// against `player_count` before anything is returned.
pub fn decode_clue_reply(body: &str, player_count: usize) -> Result<ClueReply, SyncError> {
    let reply = parse(body)?;
    let updates = reply
        .new_info
        .into_iter()
        .map(|info| to_update(info, player_count))
        .collect::<Result<Vec<_>, _>>()?;
    let session = session_of(reply.session)?;
    Ok(ClueReply { session, updates })
}

fn parse(body: &str) -> Result<WireReply, SyncError> {
    let reply: WireReply =
        serde_json::from_str(body).map_err(|err| ProtocolError::Malformed(err.to_string()))?;
    let status = reply
        .error_status
        .ok_or(ProtocolError::MissingField("errorStatus"))?;
    if status != 0 {
        return Err(SyncError::Backend {
            status,
            message: reply.error_text.unwrap_or_default(),
        });
    }
    Ok(reply)
}

fn session_of(session: Option<String>) -> Result<SessionToken, SyncError> {
    match session {
        Some(token) if !token.is_empty() => Ok(SessionToken::new(token)),
        _ => Err(ProtocolError::MissingField("session").into()),
    }
}

fn to_update(info: WireCardInfo, player_count: usize) -> Result<CardUpdate, ProtocolError> {
    let card = Card::from_id(&info.card).ok_or_else(|| KnowledgeError::NotFound(info.card.clone()))?;
    let state = BeliefState::from_code(info.status).ok_or_else(|| ProtocolError::UnknownStatus {
        card: info.card.clone(),
        status: info.status,
    })?;
    let owners = info
        .owner
        .iter()
        .map(|&owner| {
            usize::try_from(owner).map_err(|_| ProtocolError::NegativeOwner {
                card: info.card.clone(),
                owner,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let update = CardUpdate::new(card, state, owners);
    update.check(player_count)?;
    Ok(update)
}
