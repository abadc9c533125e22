use crate::error::SyncError;
use crate::protocol::{self, FormRequest};
use crate::reply;
use clue_core::model::roster::Roster;
use core::fmt;

/// Opaque backend session identifier. Never merged, only replaced.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens encode server-side game state; keep them out of logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken(len={})", self.0.len())
    }
}

/// Owns the token of the current game.
#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    token: Option<SessionToken>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active token, or `None` before the first successful new game.
    pub fn current_token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    pub fn require_token(&self) -> Result<&SessionToken, SyncError> {
        self.token.as_ref().ok_or(SyncError::NoSession)
    }

    pub fn has_session(&self) -> bool {
        self.token.is_some()
    }

    /// Request that starts a session for the roster's player and card counts.
    pub fn start_request(&self, roster: &Roster) -> FormRequest {
        protocol::new_game_request(roster)
    }

    /// Stores the token from a new-game reply. On any error the previous
    /// token is left in place.
    pub fn accept_new_game(&mut self, body: &str) -> Result<&SessionToken, SyncError> {
        let token = reply::decode_new_game(body)?;
        Ok(self.token.insert(token))
    }

    /// Replaces the token with the rotated one carried by a clue reply.
    pub fn rotate(&mut self, token: SessionToken) {
        self.token = Some(token);
    }
}
