use std::fmt;

use serde::{Deserialize, Serialize};

use super::status::CandidateStatus;

/// Identifier wrapper for assessments (a UUID rendered as text on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

impl AssessmentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable candidate identity (`candidate_uuid`), distinct from display fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl CandidateId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Company account operating the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorProfile {
    pub id: u64,
    pub company_name: String,
    pub email: String,
}

/// Candidate as linked to one assessment, including its lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Legacy numeric identifier kept for display compatibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub candidate_uuid: CandidateId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub resume_path: Option<String>,
    #[serde(default)]
    pub status: CandidateStatus,
}

impl Candidate {
    /// Upper-cased first letter of the name, `U` for unnamed candidates.
    pub fn initial(&self) -> char {
        self.name
            .trim()
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

/// Assessment metadata as returned by the portal. Candidates are carried
/// separately by the detail view and inline by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub assessment_id: AssessmentId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub work_experience: Option<String>,
    #[serde(default)]
    pub vendor_id: u64,
    #[serde(default = "default_assessment_status")]
    pub status: String,
    #[serde(default)]
    pub required_candidates: u32,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

fn default_assessment_status() -> String {
    "draft".to_string()
}

impl Assessment {
    /// Number of candidates added so far, always derived from the collection.
    pub fn added_count(&self) -> usize {
        self.candidates.len()
    }
}

/// Payload for creating a candidate and linking it to an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCandidate {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
}

/// Payload for creating an assessment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAssessment {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub work_experience: Option<String>,
    #[serde(default)]
    pub required_candidates: Option<u32>,
}

/// Payload for vendor registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterVendor {
    pub company_name: String,
    pub email: String,
    pub password: String,
}

/// A single user-initiated status change, alive for one round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransitionRequest {
    pub assessment_id: Option<AssessmentId>,
    pub candidate_id: CandidateId,
    /// Status currently displayed for the candidate.
    pub current: CandidateStatus,
    pub requested: CandidateStatus,
}
