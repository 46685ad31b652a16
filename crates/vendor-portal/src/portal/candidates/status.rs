use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Lifecycle state of a candidate within one assessment.
///
/// `Invited` is the initial state; `Shortlisted` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    #[default]
    Invited,
    Interview,
    Shortlisted,
    Rejected,
}

/// Raised by [`CandidateStatus::parse`] for labels outside the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown candidate status '{0}'")]
pub struct UnknownStatus(pub String);

impl CandidateStatus {
    pub const ALL: [CandidateStatus; 4] = [
        CandidateStatus::Invited,
        CandidateStatus::Interview,
        CandidateStatus::Shortlisted,
        CandidateStatus::Rejected,
    ];

    /// Wire label, lower-case.
    pub const fn label(self) -> &'static str {
        match self {
            CandidateStatus::Invited => "invited",
            CandidateStatus::Interview => "interview",
            CandidateStatus::Shortlisted => "shortlisted",
            CandidateStatus::Rejected => "rejected",
        }
    }

    /// Strict parse. Accepts the legacy `interviewed` label, ignores case and
    /// surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, UnknownStatus> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "invited" => Ok(CandidateStatus::Invited),
            "interview" | "interviewed" => Ok(CandidateStatus::Interview),
            "shortlisted" => Ok(CandidateStatus::Shortlisted),
            "rejected" => Ok(CandidateStatus::Rejected),
            _ => Err(UnknownStatus(raw.to_string())),
        }
    }

    /// Lenient read used for data coming back from storage or the server.
    ///
    /// Missing, empty or unrecognized values fall back to `Invited`; a
    /// non-empty unrecognized value is logged so the coercion is visible.
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return CandidateStatus::Invited;
        };
        if raw.trim().is_empty() {
            return CandidateStatus::Invited;
        }
        match Self::parse(raw) {
            Ok(status) => status,
            Err(UnknownStatus(value)) => {
                warn!(status = %value, "unrecognized candidate status, treating as invited");
                CandidateStatus::Invited
            }
        }
    }

    /// Step of the three-step progress indicator (0, 1 or 2).
    pub const fn progress_index(self) -> u8 {
        match self {
            CandidateStatus::Invited => 0,
            CandidateStatus::Interview => 1,
            CandidateStatus::Shortlisted | CandidateStatus::Rejected => 2,
        }
    }

    /// Label for the last step of the progress indicator.
    pub const fn terminal_label(self) -> &'static str {
        match self {
            CandidateStatus::Shortlisted => "Shortlisted",
            CandidateStatus::Rejected => "Rejected",
            CandidateStatus::Invited | CandidateStatus::Interview => "Feedback",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            CandidateStatus::Shortlisted | CandidateStatus::Rejected
        )
    }

    pub const fn can_transition_to(self, next: CandidateStatus) -> bool {
        matches!(
            (self, next),
            (CandidateStatus::Invited, CandidateStatus::Interview)
                | (CandidateStatus::Interview, CandidateStatus::Shortlisted)
                | (CandidateStatus::Interview, CandidateStatus::Rejected)
        )
    }

    /// States reachable from `self` in one transition.
    pub fn next_states(self) -> Vec<CandidateStatus> {
        Self::ALL
            .into_iter()
            .filter(|next| self.can_transition_to(*next))
            .collect()
    }

    /// Labels for the three progress steps as rendered for this status.
    pub const fn step_labels(self) -> [&'static str; 3] {
        ["Invited", "Interview", self.terminal_label()]
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for CandidateStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for CandidateStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(CandidateStatus::normalize(raw.as_deref()))
    }
}
