use clue_core::knowledge::KnowledgeError;
use clue_core::model::clue::ClueError;
use clue_core::model::roster::RosterError;
use thiserror::Error;

/// The request never produced a usable reply body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("unable to contact backend: {0}")]
    Unreachable(String),
    #[error("backend returned HTTP status {0}")]
    Status(u16),
}

/// The reply parsed (or failed to) in a way that breaks the data model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("reply is not valid JSON: {0}")]
    Malformed(String),
    #[error("reply is missing field '{0}'")]
    MissingField(&'static str),
    #[error("card '{card}' has unknown status code {status}")]
    UnknownStatus { card: String, status: i64 },
    #[error("card '{card}' has negative owner index {owner}")]
    NegativeOwner { card: String, owner: i64 },
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("backend error {status}: {message}")]
    Backend { status: i64, message: String },
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("no active session; start a new game first")]
    NoSession,
    #[error("a new game is still being set up")]
    NewGamePending,
    #[error("starting a new game discards recorded clues and must be confirmed")]
    ConfirmationRequired,
    #[error("players and card counts are locked until a new game is started")]
    RosterLocked,
    #[error("invalid clue: {0}")]
    InvalidClue(#[from] ClueError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error("no outstanding request with generation {0}")]
    UnknownRequest(u64),
}

/// Coarse classification for views deciding how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Backend,
    Protocol,
    /// Rejected locally before anything was sent.
    Precondition,
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Transport(_) => ErrorKind::Transport,
            SyncError::Backend { .. } => ErrorKind::Backend,
            SyncError::Protocol(_) => ErrorKind::Protocol,
            SyncError::NoSession
            | SyncError::NewGamePending
            | SyncError::ConfirmationRequired
            | SyncError::RosterLocked
            | SyncError::InvalidClue(_)
            | SyncError::Roster(_)
            | SyncError::UnknownRequest(_) => ErrorKind::Precondition,
        }
    }
}
