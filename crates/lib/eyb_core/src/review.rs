//! Application review state machine.
//!
//! A recruiter first sees an application censored. Crossing the censorship
//! boundary requires an explicit uncensor request; once uncensored, the
//! application moves between `Uncensored` and `Candidate` (shortlisted).
//!
//! ```text
//! Censored ──RequestUncensor──▶ Uncensored ──Shortlist──▶ Candidate
//!    │                              ▲  ▲                      │
//!  Reject                           │  └──────Unshortlist─────┘
//!    ▼                              │
//! Viewed ───RequestUncensor─────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Review stage of a submitted application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationState {
    /// Initial stage; the recruiter only sees the censored CV.
    Censored,
    /// Seen censored and set aside.
    #[serde(rename = "CensoredButLookedAt")]
    Viewed,
    /// The recruiter asked for the real CV.
    Uncensored,
    /// Shortlisted after full disclosure.
    Candidate,
}

impl ApplicationState {
    pub const ALL: [ApplicationState; 4] = [
        ApplicationState::Censored,
        ApplicationState::Viewed,
        ApplicationState::Uncensored,
        ApplicationState::Candidate,
    ];

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationState::Censored => "Censored",
            ApplicationState::Viewed => "CensoredButLookedAt",
            ApplicationState::Uncensored => "Uncensored",
            ApplicationState::Candidate => "Candidate",
        }
    }

    /// Whether the recruiter may see the original CV in this state.
    pub fn discloses_original(&self) -> bool {
        matches!(
            self,
            ApplicationState::Uncensored | ApplicationState::Candidate
        )
    }

    /// Apply an explicit recruiter action.
    pub fn apply(self, action: ReviewAction) -> Result<ApplicationState, ReviewError> {
        use ApplicationState::*;
        use ReviewAction::*;

        match (self, action) {
            (Censored | Viewed, RequestUncensor) => Ok(Uncensored),
            (Censored, Reject) => Ok(Viewed),
            (Uncensored, Shortlist) => Ok(Candidate),
            (Candidate, Unshortlist) => Ok(Uncensored),
            (from, action) => Err(ReviewError::InvalidTransition { from, action }),
        }
    }
}

impl fmt::Display for ApplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationState {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ReviewError::UnknownState(s.to_string()))
    }
}

/// What the recruiter did to an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    /// Ask to see the original CV.
    RequestUncensor,
    /// Pass on a censored CV without uncensoring it.
    Reject,
    /// Promote an uncensored application to candidate.
    Shortlist,
    /// Demote a candidate back to uncensored.
    Unshortlist,
}

impl ReviewAction {
    /// Map the legacy `requestRealCv` flag to an action.
    ///
    /// The flag only matters while the application is still `Censored`;
    /// past that point the current state alone decides the action.
    pub fn from_request(state: ApplicationState, request_real_cv: bool) -> ReviewAction {
        match state {
            ApplicationState::Censored if request_real_cv => ReviewAction::RequestUncensor,
            ApplicationState::Censored => ReviewAction::Reject,
            ApplicationState::Viewed => ReviewAction::RequestUncensor,
            ApplicationState::Uncensored => ReviewAction::Shortlist,
            ApplicationState::Candidate => ReviewAction::Unshortlist,
        }
    }
}

impl FromStr for ReviewAction {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "request_uncensor" => Ok(ReviewAction::RequestUncensor),
            "reject" => Ok(ReviewAction::Reject),
            "shortlist" => Ok(ReviewAction::Shortlist),
            "unshortlist" => Ok(ReviewAction::Unshortlist),
            other => Err(ReviewError::UnknownAction(other.to_string())),
        }
    }
}

/// Next state for the legacy `requestRealCv` contract. Total over all inputs.
pub fn next_state(state: ApplicationState, request_real_cv: bool) -> ApplicationState {
    // `from_request` only yields actions that are legal in `state`.
    state
        .apply(ReviewAction::from_request(state, request_real_cv))
        .unwrap_or(state)
}

/// Review state machine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("Cannot {action:?} an application in state {from}")]
    InvalidTransition {
        from: ApplicationState,
        action: ReviewAction,
    },

    #[error("Unknown application state '{0}'")]
    UnknownState(String),

    #[error("Unknown review action '{0}'")]
    UnknownAction(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationState::*;

    #[test]
    fn transition_table_is_exhaustive() {
        let table = [
            (Censored, true, Uncensored),
            (Censored, false, Viewed),
            (Viewed, true, Uncensored),
            (Viewed, false, Uncensored),
            (Uncensored, true, Candidate),
            (Uncensored, false, Candidate),
            (Candidate, true, Uncensored),
            (Candidate, false, Uncensored),
        ];
        for (from, flag, expected) in table {
            assert_eq!(
                next_state(from, flag),
                expected,
                "{from} with requestRealCv={flag}"
            );
        }
        // Every state × flag pair is listed exactly once.
        assert_eq!(table.len(), ApplicationState::ALL.len() * 2);
    }

    #[test]
    fn transitions_are_deterministic() {
        for state in ApplicationState::ALL {
            for flag in [true, false] {
                assert_eq!(next_state(state, flag), next_state(state, flag));
            }
        }
    }

    #[test]
    fn only_uncensor_request_crosses_censorship_boundary() {
        for state in [Censored, Viewed] {
            for action in [
                ReviewAction::RequestUncensor,
                ReviewAction::Reject,
                ReviewAction::Shortlist,
                ReviewAction::Unshortlist,
            ] {
                if let Ok(next) = state.apply(action) {
                    if next.discloses_original() {
                        assert_eq!(action, ReviewAction::RequestUncensor);
                    }
                }
            }
        }
    }

    #[test]
    fn illegal_actions_are_rejected() {
        assert_eq!(
            Candidate.apply(ReviewAction::Shortlist),
            Err(ReviewError::InvalidTransition {
                from: Candidate,
                action: ReviewAction::Shortlist
            })
        );
        assert!(Viewed.apply(ReviewAction::Reject).is_err());
        assert!(Uncensored.apply(ReviewAction::RequestUncensor).is_err());
        assert!(Censored.apply(ReviewAction::Unshortlist).is_err());
    }

    #[test]
    fn state_storage_names_round_trip() {
        for state in ApplicationState::ALL {
            assert_eq!(state.as_str().parse::<ApplicationState>(), Ok(state));
        }
        assert_eq!(Viewed.as_str(), "CensoredButLookedAt");
        assert!("Archived".parse::<ApplicationState>().is_err());
    }

    #[test]
    fn serde_uses_storage_names() {
        assert_eq!(
            serde_json::to_string(&Viewed).unwrap(),
            "\"CensoredButLookedAt\""
        );
        assert_eq!(
            serde_json::from_str::<ReviewAction>("\"request_uncensor\"").unwrap(),
            ReviewAction::RequestUncensor
        );
    }

    #[test]
    fn action_names_parse() {
        assert_eq!(
            "shortlist".parse::<ReviewAction>(),
            Ok(ReviewAction::Shortlist)
        );
        assert_eq!(
            "unshortlist".parse::<ReviewAction>(),
            Ok(ReviewAction::Unshortlist)
        );
        assert!("promote".parse::<ReviewAction>().is_err());
    }
}
