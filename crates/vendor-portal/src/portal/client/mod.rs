//! Typed access to the vendor portal REST contract.
//!
//! [`PortalApi`] is the seam the lifecycle core talks to; [`HttpPortalClient`]
//! is the reqwest implementation and tests substitute in-memory fakes.

mod http;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FailureKind;
use crate::portal::candidates::{
    Assessment, AssessmentId, Candidate, CandidateId, CandidateStatus, NewAssessment,
    NewCandidate, RegisterVendor, VendorProfile,
};

pub use http::HttpPortalClient;

/// Failure talking to the portal backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("portal unreachable: {0}")]
    Transport(String),
    #[error("portal rejected the request ({status}): {}", .detail.as_deref().unwrap_or("Request failed"))]
    ServerRejected { status: u16, detail: Option<String> },
    #[error("portal returned an unreadable response: {0}")]
    MalformedResponse(String),
    #[error("portal client misconfigured: {0}")]
    Configuration(String),
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Transport(_) => FailureKind::Transport,
            ApiError::ServerRejected { .. } => FailureKind::ServerRejected,
            ApiError::MalformedResponse(_) => FailureKind::MalformedResponse,
            ApiError::Configuration(_) => FailureKind::Configuration,
        }
    }

    /// Message suitable for an inline error in a view.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::ServerRejected {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Error body shape used by the backend (`{"detail": "..."}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

/// Generic acknowledgement body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub vendor: VendorProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub ok: bool,
    pub vendor_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub vendor: VendorProfile,
    #[serde(default)]
    pub assessments: Vec<Assessment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentDetail {
    pub assessment: Assessment,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAssessment {
    pub assessment: Assessment,
}

/// Add-candidate reply: either the created candidate or the refreshed list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddCandidateResponse {
    #[serde(default)]
    pub candidate: Option<Candidate>,
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

impl AddCandidateResponse {
    /// The candidate this call created; the last entry when a list came back.
    pub fn created(self) -> Option<Candidate> {
        match (self.candidate, self.candidates) {
            (Some(candidate), _) => Some(candidate),
            (None, Some(mut list)) => list.pop(),
            (None, None) => None,
        }
    }
}

/// Status-update reply: an ack with the stored status and/or the updated candidate.
///
/// Unlike listed candidates, the status in this reply is read strictly: a
/// label outside the lifecycle fails to decode instead of falling back to
/// `invited`, so it can never be shown as a confirmed transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StatusUpdateWire")]
pub struct StatusUpdateResponse {
    pub status: Option<CandidateStatus>,
    pub candidate: Option<Candidate>,
}

#[derive(Deserialize)]
struct StatusUpdateWire {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    candidate: Option<Value>,
}

fn strict_status(raw: Option<&str>) -> Result<Option<CandidateStatus>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(label) => CandidateStatus::parse(label)
            .map(Some)
            .map_err(|err| format!("status reply carried {err}")),
    }
}

impl TryFrom<StatusUpdateWire> for StatusUpdateResponse {
    type Error = String;

    fn try_from(wire: StatusUpdateWire) -> Result<Self, Self::Error> {
        let status = strict_status(wire.status.as_deref())?;

        let candidate = match wire.candidate {
            Some(value) => {
                let reported = strict_status(value.get("status").and_then(Value::as_str))?;
                let mut candidate: Candidate =
                    serde_json::from_value(value).map_err(|err| err.to_string())?;
                // A candidate without a status says nothing about the
                // transition; keep it only if the ack named the status.
                match reported.or(status) {
                    Some(confirmed) => {
                        candidate.status = confirmed;
                        Some(candidate)
                    }
                    None => None,
                }
            }
            None => None,
        };

        Ok(Self { status, candidate })
    }
}

impl StatusUpdateResponse {
    /// Status the server says it stored, preferring the full candidate record.
    pub fn confirmed_status(&self) -> Option<CandidateStatus> {
        self.candidate
            .as_ref()
            .map(|candidate| candidate.status)
            .or(self.status)
    }
}

/// Decode a 2xx body; anything unreadable is a [`ApiError::MalformedResponse`].
pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::MalformedResponse(err.to_string()))
}

/// The consumed portal contract.
#[async_trait]
pub trait PortalApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    async fn register(&self, vendor: &RegisterVendor) -> Result<RegisterResponse, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;

    async fn dashboard(&self) -> Result<Dashboard, ApiError>;

    async fn create_assessment(&self, assessment: &NewAssessment) -> Result<Assessment, ApiError>;

    async fn assessment(&self, assessment_id: &AssessmentId)
        -> Result<AssessmentDetail, ApiError>;

    async fn add_candidate(
        &self,
        assessment_id: &AssessmentId,
        candidate: &NewCandidate,
    ) -> Result<AddCandidateResponse, ApiError>;

    async fn update_candidate_status(
        &self,
        assessment_id: &AssessmentId,
        candidate_id: &CandidateId,
        status: CandidateStatus,
    ) -> Result<StatusUpdateResponse, ApiError>;

    async fn change_password(&self, old_password: &str, new_password: &str)
        -> Result<(), ApiError>;
}
