use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum BeliefState {
    #[default]
    Unknown = 0,
    OwnedByPlayer = 1,
    OwnedByCaseFile = 2,
}

impl BeliefState {
    /// Maps the status code carried in backend replies.
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(BeliefState::Unknown),
            1 => Some(BeliefState::OwnedByPlayer),
            2 => Some(BeliefState::OwnedByCaseFile),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for BeliefState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BeliefState::Unknown => "unknown",
            BeliefState::OwnedByPlayer => "owned by player",
            BeliefState::OwnedByCaseFile => "in case file",
        };
        f.write_str(label)
    }
}

/// What the client currently believes about one card's owner.
///
/// An `Unknown` belief with no candidates means "no information"; an
/// `Unknown` belief with candidates is a narrowed but ambiguous set. The
/// two render differently. Candidates are ignored for `OwnedByCaseFile`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OwnershipBelief {
    state: BeliefState,
    candidates: Vec<usize>,
}

impl OwnershipBelief {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(state: BeliefState, candidates: Vec<usize>) -> Self {
        Self { state, candidates }
    }

    pub fn state(&self) -> BeliefState {
        self.state
    }

    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    pub fn has_evidence(&self) -> bool {
        self.state != BeliefState::Unknown || !self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_roundtrip() {
        for state in [
            BeliefState::Unknown,
            BeliefState::OwnedByPlayer,
            BeliefState::OwnedByCaseFile,
        ] {
            assert_eq!(BeliefState::from_code(state.code() as i64), Some(state));
        }
        assert_eq!(BeliefState::from_code(3), None);
        assert_eq!(BeliefState::from_code(-1), None);
    }

    #[test]
    fn fresh_belief_has_no_evidence() {
        let belief = OwnershipBelief::unknown();
        assert_eq!(belief.state(), BeliefState::Unknown);
        assert!(belief.candidates().is_empty());
        assert!(!belief.has_evidence());

        let narrowed = OwnershipBelief::from_parts(BeliefState::Unknown, vec![1, 2]);
        assert!(narrowed.has_evidence());
    }
}
