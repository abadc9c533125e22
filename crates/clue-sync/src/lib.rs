//! Synchronisation between the client's knowledge state and the clue
//! backend script.
//!
//! The controller turns user actions into form-encoded requests and applies
//! the backend's replies. It never performs I/O itself: callers hand the
//! returned [`PendingRequest`](controller::PendingRequest) to a
//! [`Transport`](transport::Transport) (or any asynchronous equivalent) and
//! feed the raw reply back through
//! [`SyncController::complete`](controller::SyncController::complete).

pub mod controller;
pub mod error;
pub mod history;
pub mod protocol;
pub mod reply;
pub mod session;
pub mod transport;

pub use controller::{PendingRequest, ReplyOutcome, RequestTicket, SyncController, SyncState};
pub use error::{ErrorKind, ProtocolError, SyncError, TransportError};
pub use history::{ClueHistory, HistoryEntry};
pub use protocol::{Action, FormRequest};
pub use session::{SessionManager, SessionToken};
pub use transport::{Method, Transport};
