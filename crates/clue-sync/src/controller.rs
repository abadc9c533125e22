//! Orchestrates the backend protocol.
//!
//! ```text
//! Idle -> AwaitingNewGame -> Ready <-> AwaitingClueSubmit
//!   any failed reply -> Error -> (acknowledged) Ready | Idle
//! ```
//!
//! Every request gets a generation number from a single monotonically
//! increasing counter. Starting a new game supersedes everything issued
//! before it: replies to older requests are discarded when they arrive, so
//! a slow reply can never clobber a newer session token or write beliefs
//! from the previous game. Replies to clue requests are applied in the
//! order they are received.

use crate::error::{ErrorKind, ProtocolError, SyncError, TransportError};
use crate::history::{ClueHistory, HistoryEntry};
use crate::protocol::{self, Action, FormRequest};
use crate::reply;
use crate::session::SessionManager;
use crate::transport::Transport;
use clue_core::game::snapshot::KnowledgeSnapshot;
use clue_core::knowledge::{BeliefView, KnowledgeStore};
use clue_core::model::card::{Card, DEALT_CARDS};
use clue_core::model::clue::{Clue, OwnerChoice, Suggestion};
use clue_core::model::roster::Roster;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{Level, debug, event, warn};

const TARGET: &str = "clue_sync::controller";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    AwaitingNewGame,
    Ready,
    AwaitingClueSubmit,
    Error,
}

/// Identifies one issued request; hand it back to
/// [`SyncController::complete`] with the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket {
    generation: u64,
}

impl RequestTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

/// A request ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub ticket: RequestTicket,
    pub request: FormRequest,
}

/// What a completed reply did to the local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// A new session was stored and all beliefs were reset.
    SessionStarted,
    /// A clue reply was applied as one batch.
    CluesApplied {
        updated: Vec<Card>,
        /// True for the first accepted clue of a game: roster size and card
        /// counts are locked from here on.
        roster_locked: bool,
    },
    /// The reply belonged to a request superseded by a later new game and
    /// was dropped unread.
    Superseded { generation: u64 },
}

#[derive(Debug, Clone)]
enum InFlight {
    NewGame,
    Clue(Clue),
}

pub struct SyncController {
    session: SessionManager,
    roster: Roster,
    store: KnowledgeStore,
    history: ClueHistory,
    next_generation: u64,
    in_flight: BTreeMap<u64, InFlight>,
    superseded: BTreeSet<u64>,
    roster_locked: bool,
    failed: bool,
}

impl SyncController {
    pub fn new(roster: Roster) -> Self {
        Self {
            session: SessionManager::new(),
            roster,
            store: KnowledgeStore::new(),
            history: ClueHistory::new(),
            next_generation: 1,
            in_flight: BTreeMap::new(),
            superseded: BTreeSet::new(),
            roster_locked: false,
            failed: false,
        }
    }

    pub fn state(&self) -> SyncState {
        if self.failed {
            return SyncState::Error;
        }
        if self
            .in_flight
            .values()
            .any(|kind| matches!(kind, InFlight::NewGame))
        {
            SyncState::AwaitingNewGame
        } else if !self.in_flight.is_empty() {
            SyncState::AwaitingClueSubmit
        } else if self.session.has_session() {
            SyncState::Ready
        } else {
            SyncState::Idle
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn history(&self) -> &ClueHistory {
        &self.history
    }

    pub fn view(&self) -> BeliefView<'_> {
        BeliefView::new(&self.store, &self.roster)
    }

    pub fn snapshot(&self) -> KnowledgeSnapshot {
        KnowledgeSnapshot::capture(&self.store, &self.roster)
    }

    /// Player count and card counts can no longer change once the backend
    /// has accepted a clue for this game.
    pub fn is_roster_locked(&self) -> bool {
        self.roster_locked
    }

    /// Starting a new game now would discard recorded clues.
    pub fn needs_confirmation(&self) -> bool {
        self.roster_locked || !self.history.is_empty()
    }

    pub fn outstanding(&self) -> usize {
        self.in_flight.len()
    }

    /// Leaves the `Error` state after the failure has been shown.
    pub fn acknowledge_error(&mut self) {
        self.failed = false;
    }

    /// Names are display-only and may change at any time.
    pub fn rename_player(&mut self, index: usize, name: &str) -> Result<(), SyncError> {
        self.roster.rename(index, name)?;
        debug!(target: TARGET, index, "player renamed");
        Ok(())
    }

    /// Resizes the roster and starts a new game against the new counts.
    pub fn resize_roster(&mut self, player_count: usize) -> Result<PendingRequest, SyncError> {
        self.ensure_unlocked()?;
        self.roster.resize(player_count)?;
        event!(
            target: TARGET,
            Level::INFO,
            player_count,
            cards = ?self.roster.card_counts(),
            "roster resized"
        );
        Ok(self.issue_new_game())
    }

    /// Overrides one player's card count and starts a new game against it.
    pub fn set_card_count(&mut self, index: usize, count: u8) -> Result<PendingRequest, SyncError> {
        self.ensure_unlocked()?;
        self.roster.set_card_count(index, count)?;
        if self.roster.total_cards() != DEALT_CARDS {
            warn!(
                target: TARGET,
                total = self.roster.total_cards(),
                "card counts no longer add up to the dealt cards"
            );
        }
        Ok(self.issue_new_game())
    }

    /// Starts a new game. When clues have been recorded the caller must
    /// pass `confirmed = true` after asking the user.
    pub fn begin_new_game(&mut self, confirmed: bool) -> Result<PendingRequest, SyncError> {
        if self.needs_confirmation() && !confirmed {
            return Err(SyncError::ConfirmationRequired);
        }
        Ok(self.issue_new_game())
    }

    pub fn begin_ownership(
        &mut self,
        card: Card,
        owner: OwnerChoice,
    ) -> Result<PendingRequest, SyncError> {
        self.begin_clue(Clue::Ownership { card, owner })
    }

    pub fn begin_suggestion(&mut self, suggestion: Suggestion) -> Result<PendingRequest, SyncError> {
        self.begin_clue(Clue::Suggestion(suggestion))
    }

    pub fn begin_clue(&mut self, clue: Clue) -> Result<PendingRequest, SyncError> {
        if self
            .in_flight
            .values()
            .any(|kind| matches!(kind, InFlight::NewGame))
        {
            return Err(SyncError::NewGamePending);
        }
        let token = self.session.require_token()?;
        clue.validate(&self.roster)?;
        let request = match &clue {
            Clue::Ownership { card, owner } => {
                protocol::ownership_request(token, *card, *owner, &self.roster)
            }
            Clue::Suggestion(suggestion) => protocol::suggestion_request(token, suggestion),
        };
        self.failed = false;
        Ok(self.register(InFlight::Clue(clue), request))
    }

    /// Applies the transport's result for `ticket`.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        raw: Result<String, TransportError>,
    ) -> Result<ReplyOutcome, SyncError> {
        let generation = ticket.generation;
        if self.superseded.remove(&generation) {
            event!(
                target: TARGET,
                Level::DEBUG,
                generation,
                "discarding reply superseded by a newer game"
            );
            return Ok(ReplyOutcome::Superseded { generation });
        }
        let Some(kind) = self.in_flight.remove(&generation) else {
            return Err(SyncError::UnknownRequest(generation));
        };

        let result = match kind {
            InFlight::NewGame => self.finish_new_game(raw),
            InFlight::Clue(clue) => self.finish_clue(generation, clue, raw),
        };
        if let Err(err) = &result
            && err.kind() != ErrorKind::Precondition
        {
            self.failed = true;
            event!(
                target: TARGET,
                Level::WARN,
                generation,
                kind = ?err.kind(),
                error = %err,
                "request failed"
            );
        }
        result
    }

    /// Sends `pending` through a blocking transport and applies the reply.
    pub fn dispatch<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        pending: PendingRequest,
    ) -> Result<ReplyOutcome, SyncError> {
        let raw = transport.send(&pending.request);
        self.complete(pending.ticket, raw)
    }

    fn ensure_unlocked(&self) -> Result<(), SyncError> {
        if self.roster_locked {
            Err(SyncError::RosterLocked)
        } else {
            Ok(())
        }
    }

    fn issue_new_game(&mut self) -> PendingRequest {
        self.failed = false;
        let stale: Vec<u64> = self.in_flight.keys().copied().collect();
        for generation in stale {
            self.in_flight.remove(&generation);
            self.superseded.insert(generation);
        }
        let request = self.session.start_request(&self.roster);
        self.register(InFlight::NewGame, request)
    }

    fn register(&mut self, kind: InFlight, request: FormRequest) -> PendingRequest {
        let generation = self.next_generation;
        self.next_generation += 1;
        let action = request.action();
        self.in_flight.insert(generation, kind);
        event!(
            target: TARGET,
            Level::DEBUG,
            generation,
            action = action.as_str(),
            outstanding = self.in_flight.len(),
            "request issued"
        );
        PendingRequest {
            ticket: RequestTicket { generation },
            request,
        }
    }

    fn finish_new_game(&mut self, raw: Result<String, TransportError>) -> Result<ReplyOutcome, SyncError> {
        let body = raw?;
        let token_len = self.session.accept_new_game(&body)?.as_str().len();
        self.store.reset_all();
        self.history.clear();
        self.roster_locked = false;
        event!(
            target: TARGET,
            Level::INFO,
            players = self.roster.player_count(),
            token_len,
            "new game started"
        );
        Ok(ReplyOutcome::SessionStarted)
    }

    fn finish_clue(
        &mut self,
        generation: u64,
        clue: Clue,
        raw: Result<String, TransportError>,
    ) -> Result<ReplyOutcome, SyncError> {
        let body = raw?;
        let player_count = self.roster.player_count();
        let reply = reply::decode_clue_reply(&body, player_count)?;
        let updated: Vec<Card> = reply.updates.iter().map(|u| u.card).collect();
        self.store
            .apply_batch(reply.updates, player_count)
            .map_err(ProtocolError::from)?;
        self.session.rotate(reply.session);

        let newly_locked = !self.roster_locked;
        self.roster_locked = true;
        let action = action_of(&clue);
        self.history.push(HistoryEntry {
            generation,
            clue,
            updated: updated.clone(),
        });
        event!(
            target: TARGET,
            Level::INFO,
            generation,
            action = action.as_str(),
            updated = updated.len(),
            newly_locked,
            "clue reply applied"
        );
        Ok(ReplyOutcome::CluesApplied {
            updated,
            roster_locked: newly_locked,
        })
    }
}

fn action_of(clue: &Clue) -> Action {
    match clue {
        Clue::Ownership { .. } => Action::WhoOwns,
        Clue::Suggestion(_) => Action::Suggestion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clue_core::knowledge::BeliefState;
    use clue_core::model::clue::RefutingCard;

    fn ok_new(token: &str) -> Result<String, TransportError> {
        Ok(format!(
            r#"{{"errorStatus": 0, "errorText": "", "session": "{token}"}}"#
        ))
    }

    fn ok_info(token: &str, info: &str) -> Result<String, TransportError> {
        Ok(format!(
            r#"{{"errorStatus": 0, "errorText": "", "session": "{token}", "newInfo": [{info}]}}"#
        ))
    }

    fn started(players: usize) -> SyncController {
        let mut controller = SyncController::new(Roster::new(players).unwrap());
        let pending = controller.begin_new_game(false).unwrap();
        controller.complete(pending.ticket, ok_new("s0")).unwrap();
        controller
    }

    #[test]
    fn first_load_walks_idle_to_ready() {
        let mut controller = SyncController::new(Roster::default());
        assert_eq!(controller.state(), SyncState::Idle);
        let pending = controller.begin_new_game(false).unwrap();
        assert_eq!(pending.request.action(), Action::New);
        assert_eq!(controller.state(), SyncState::AwaitingNewGame);
        let outcome = controller.complete(pending.ticket, ok_new("s1")).unwrap();
        assert_eq!(outcome, ReplyOutcome::SessionStarted);
        assert_eq!(controller.state(), SyncState::Ready);
        assert_eq!(
            controller.session().current_token().map(|t| t.as_str()),
            Some("s1")
        );
    }

    #[test]
    fn clue_without_session_is_rejected_locally() {
        let mut controller = SyncController::new(Roster::default());
        let err = controller
            .begin_ownership(Card::Rope, OwnerChoice::Nobody)
            .unwrap_err();
        assert_eq!(err, SyncError::NoSession);
        assert_eq!(controller.outstanding(), 0);
        assert_eq!(controller.state(), SyncState::Idle);
    }

    #[test]
    fn clue_while_new_game_in_flight_is_rejected() {
        let mut controller = started(6);
        let _pending = controller.begin_new_game(false).unwrap();
        assert_eq!(
            controller.begin_ownership(Card::Rope, OwnerChoice::Player(1)),
            Err(SyncError::NewGamePending)
        );
    }

    #[test]
    fn ownership_reply_applies_batch_rotates_token_and_locks() {
        let mut controller = started(6);
        let pending = controller
            .begin_ownership(Card::Knife, OwnerChoice::Player(2))
            .unwrap();
        assert_eq!(pending.request.get("sess"), Some("s0"));
        assert_eq!(controller.state(), SyncState::AwaitingClueSubmit);

        let outcome = controller
            .complete(
                pending.ticket,
                ok_info("s1", r#"{"card": "Knife", "status": 1, "owner": [2]}"#),
            )
            .unwrap();
        assert_eq!(
            outcome,
            ReplyOutcome::CluesApplied {
                updated: vec![Card::Knife],
                roster_locked: true
            }
        );
        let knife = controller.store().belief(Card::Knife);
        assert_eq!(knife.state(), BeliefState::OwnedByPlayer);
        assert_eq!(knife.candidates(), &[2]);
        assert_eq!(
            controller.session().current_token().map(|t| t.as_str()),
            Some("s1")
        );
        assert!(controller.is_roster_locked());
        assert_eq!(controller.history().len(), 1);
        assert_eq!(controller.state(), SyncState::Ready);
    }

    #[test]
    fn second_clue_does_not_report_lock_again() {
        let mut controller = started(3);
        for expected_lock in [true, false] {
            let pending = controller
                .begin_ownership(Card::Hall, OwnerChoice::CaseFile)
                .unwrap();
            let outcome = controller
                .complete(
                    pending.ticket,
                    ok_info("s", r#"{"card": "Hall", "status": 2, "owner": []}"#),
                )
                .unwrap();
            assert!(matches!(
                outcome,
                ReplyOutcome::CluesApplied { roster_locked, .. } if roster_locked == expected_lock
            ));
        }
    }

    #[test]
    fn locked_roster_rejects_resize_until_new_game() {
        let mut controller = started(6);
        let pending = controller
            .begin_ownership(Card::Rope, OwnerChoice::Player(0))
            .unwrap();
        controller
            .complete(
                pending.ticket,
                ok_info("s1", r#"{"card": "Rope", "status": 1, "owner": [0]}"#),
            )
            .unwrap();

        assert_eq!(controller.resize_roster(4), Err(SyncError::RosterLocked));
        assert_eq!(controller.set_card_count(0, 4), Err(SyncError::RosterLocked));
        assert_eq!(controller.roster().player_count(), 6);

        assert_eq!(
            controller.begin_new_game(false),
            Err(SyncError::ConfirmationRequired)
        );
        let pending = controller.begin_new_game(true).unwrap();
        assert!(controller.is_roster_locked());
        controller.complete(pending.ticket, ok_new("s2")).unwrap();
        assert!(!controller.is_roster_locked());
        assert!(controller.history().is_empty());
        assert!(!controller.store().belief(Card::Rope).has_evidence());

        let pending = controller.resize_roster(4).unwrap();
        assert_eq!(pending.request.get("players"), Some("4"));
        assert_eq!(controller.roster().card_counts(), &[5, 5, 4, 4]);
    }

    #[test]
    fn stale_new_game_reply_does_not_clobber_newer_token() {
        let mut controller = SyncController::new(Roster::default());
        let first = controller.begin_new_game(false).unwrap();
        let second = controller.begin_new_game(false).unwrap();
        assert!(second.ticket.generation() > first.ticket.generation());

        assert_eq!(
            controller.complete(second.ticket, ok_new("B")).unwrap(),
            ReplyOutcome::SessionStarted
        );
        assert_eq!(
            controller.complete(first.ticket, ok_new("A")).unwrap(),
            ReplyOutcome::Superseded {
                generation: first.ticket.generation()
            }
        );
        assert_eq!(
            controller.session().current_token().map(|t| t.as_str()),
            Some("B")
        );
        assert_eq!(controller.state(), SyncState::Ready);
    }

    #[test]
    fn clue_reply_from_previous_game_is_discarded() {
        let mut controller = started(6);
        let clue = controller
            .begin_ownership(Card::Knife, OwnerChoice::Player(1))
            .unwrap();
        let new_game = controller.begin_new_game(true).unwrap();
        controller.complete(new_game.ticket, ok_new("fresh")).unwrap();
        let outcome = controller
            .complete(
                clue.ticket,
                ok_info("old", r#"{"card": "Knife", "status": 1, "owner": [1]}"#),
            )
            .unwrap();
        assert!(matches!(outcome, ReplyOutcome::Superseded { .. }));
        assert!(!controller.store().belief(Card::Knife).has_evidence());
        assert_eq!(
            controller.session().current_token().map(|t| t.as_str()),
            Some("fresh")
        );
    }

    #[test]
    fn protocol_error_keeps_prior_state_and_enters_error() {
        let mut controller = started(6);
        let pending = controller
            .begin_ownership(Card::Rope, OwnerChoice::Player(1))
            .unwrap();
        let err = controller
            .complete(
                pending.ticket,
                ok_info(
                    "s9",
                    r#"{"card": "Knife", "status": 1, "owner": [2]},
                       {"card": "Rope", "status": 1, "owner": [7]}"#,
                ),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(!controller.store().belief(Card::Knife).has_evidence());
        assert_eq!(
            controller.session().current_token().map(|t| t.as_str()),
            Some("s0")
        );
        assert!(!controller.is_roster_locked());
        assert_eq!(controller.state(), SyncState::Error);
        controller.acknowledge_error();
        assert_eq!(controller.state(), SyncState::Ready);
    }

    #[test]
    fn transport_failure_on_first_game_returns_to_idle() {
        let mut controller = SyncController::new(Roster::default());
        let pending = controller.begin_new_game(false).unwrap();
        let err = controller
            .complete(
                pending.ticket,
                Err(TransportError::Unreachable("connection refused".into())),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(controller.state(), SyncState::Error);
        controller.acknowledge_error();
        assert_eq!(controller.state(), SyncState::Idle);
    }

    #[test]
    fn backend_error_on_new_game_keeps_old_session() {
        let mut controller = started(6);
        let pending = controller.begin_new_game(false).unwrap();
        let err = controller
            .complete(
                pending.ticket,
                Ok(r#"{"errorStatus": 1, "errorText": "bad players"}"#.to_string()),
            )
            .unwrap_err();
        assert_eq!(
            err,
            SyncError::Backend {
                status: 1,
                message: "bad players".into()
            }
        );
        assert_eq!(
            controller.session().current_token().map(|t| t.as_str()),
            Some("s0")
        );
    }

    #[test]
    fn completing_twice_is_an_unknown_request() {
        let mut controller = SyncController::new(Roster::default());
        let pending = controller.begin_new_game(false).unwrap();
        controller.complete(pending.ticket, ok_new("s")).unwrap();
        assert_eq!(
            controller.complete(pending.ticket, ok_new("s")),
            Err(SyncError::UnknownRequest(pending.ticket.generation()))
        );
    }

    #[test]
    fn invalid_suggestion_never_leaves_the_client() {
        let mut controller = started(3);
        let suggestion = Suggestion {
            suggester: 0,
            suspect: Card::Knife,
            weapon: Card::Rope,
            room: Card::Hall,
            refuter: None,
            refuting_card: RefutingCard::None,
        };
        assert!(matches!(
            controller.begin_suggestion(suggestion),
            Err(SyncError::InvalidClue(_))
        ));
        assert_eq!(controller.outstanding(), 0);
    }

    #[test]
    fn replies_apply_in_arrival_order() {
        let mut controller = started(6);
        let a = controller
            .begin_ownership(Card::Knife, OwnerChoice::Player(1))
            .unwrap();
        let b = controller
            .begin_ownership(Card::Knife, OwnerChoice::Player(2))
            .unwrap();
        controller
            .complete(b.ticket, ok_info("sb", r#"{"card": "Knife", "status": 1, "owner": [2]}"#))
            .unwrap();
        controller
            .complete(a.ticket, ok_info("sa", r#"{"card": "Knife", "status": 1, "owner": [1]}"#))
            .unwrap();
        assert_eq!(controller.store().belief(Card::Knife).candidates(), &[1]);
        assert_eq!(
            controller.session().current_token().map(|t| t.as_str()),
            Some("sa")
        );
        let order: Vec<u64> = controller
            .history()
            .entries()
            .iter()
            .map(|e| e.generation)
            .collect();
        assert_eq!(order, vec![b.ticket.generation(), a.ticket.generation()]);
    }

    #[test]
    fn rename_is_reflected_in_view() {
        let mut controller = started(3);
        let pending = controller
            .begin_ownership(Card::Rope, OwnerChoice::Player(1))
            .unwrap();
        controller
            .complete(pending.ticket, ok_info("s", r#"{"card": "Rope", "status": 1, "owner": [1]}"#))
            .unwrap();
        controller.rename_player(1, "Graham").unwrap();
        assert_eq!(controller.view().card_caption(Card::Rope), "Owned by Graham");
    }
}
