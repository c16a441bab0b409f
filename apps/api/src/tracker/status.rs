//! The application status state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle states of an application record. Stored as snake_case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    Interview,
    SecondInterview,
    FinalInterview,
    Accepted,
    Rejected,
    Withdrawn,
    OfferAccepted,
    OfferDeclined,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Interview => "interview",
            Self::SecondInterview => "second_interview",
            Self::FinalInterview => "final_interview",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
            Self::OfferAccepted => "offer_accepted",
            Self::OfferDeclined => "offer_declined",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "applied" => Some(Self::Applied),
            "interview" => Some(Self::Interview),
            "second_interview" => Some(Self::SecondInterview),
            "final_interview" => Some(Self::FinalInterview),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            "withdrawn" => Some(Self::Withdrawn),
            "offer_accepted" => Some(Self::OfferAccepted),
            "offer_declined" => Some(Self::OfferDeclined),
            _ => None,
        }
    }

    /// The standard transition table. Terminal states return an empty
    /// slice.
    pub fn next_transitions(&self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Applied => &[Interview, Rejected, Withdrawn],
            Interview => &[SecondInterview, Rejected, Accepted],
            SecondInterview => &[FinalInterview, Rejected, Accepted],
            FinalInterview => &[Accepted, Rejected],
            Accepted => &[OfferAccepted, OfferDeclined],
            Rejected | Withdrawn | OfferAccepted | OfferDeclined => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next_transitions().is_empty()
    }

    /// True when `to` is in the standard table for this state. Non-standard
    /// transitions are still permitted for manual corrections, but flagged.
    pub fn can_transition(&self, to: ApplicationStatus) -> bool {
        self.next_transitions().contains(&to)
    }

    /// True for any state at or past the first interview.
    pub fn is_interview_or_later(&self) -> bool {
        matches!(
            self,
            Self::Interview
                | Self::SecondInterview
                | Self::FinalInterview
                | Self::Accepted
                | Self::OfferAccepted
        )
    }

    /// True for the states counted as hiring successes.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Accepted | Self::OfferAccepted)
    }

    pub fn all() -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        &[
            Applied,
            Interview,
            SecondInterview,
            FinalInterview,
            Accepted,
            Rejected,
            Withdrawn,
            OfferAccepted,
            OfferDeclined,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn test_terminal_states_have_no_outgoing_transitions() {
        for s in [Rejected, Withdrawn, OfferAccepted, OfferDeclined] {
            assert!(s.is_terminal());
            assert!(s.next_transitions().is_empty());
        }
    }

    #[test]
    fn test_standard_transition_table() {
        assert!(Applied.can_transition(Interview));
        assert!(Applied.can_transition(Rejected));
        assert!(Applied.can_transition(Withdrawn));
        assert!(!Applied.can_transition(Accepted));

        assert!(Interview.can_transition(SecondInterview));
        assert!(Interview.can_transition(Accepted));
        assert!(!Interview.can_transition(FinalInterview));

        assert!(SecondInterview.can_transition(FinalInterview));
        assert!(FinalInterview.can_transition(Accepted));
        assert!(Accepted.can_transition(OfferAccepted));
        assert!(Accepted.can_transition(OfferDeclined));
    }

    #[test]
    fn test_no_transition_into_applied() {
        for s in ApplicationStatus::all() {
            assert!(
                !s.can_transition(Applied),
                "{s:?} should not transition back to applied"
            );
        }
    }

    #[test]
    fn test_round_trip_str() {
        for s in ApplicationStatus::all() {
            assert_eq!(ApplicationStatus::parse(s.as_str()), Some(*s));
        }
        assert_eq!(ApplicationStatus::parse("ghosted"), None);
    }

    #[test]
    fn test_interview_or_later_classification() {
        assert!(Interview.is_interview_or_later());
        assert!(OfferAccepted.is_interview_or_later());
        assert!(!Applied.is_interview_or_later());
        assert!(!Rejected.is_interview_or_later());
    }
}
