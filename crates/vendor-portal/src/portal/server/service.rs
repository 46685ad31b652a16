use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::credentials::{hash_password, new_session_token, verify_password};
use super::repository::{
    stored_label, AssessmentRecord, CandidateUpsert, NewVendorRecord, PortalRepository,
    RepositoryError, SessionRecord, VendorRecord,
};
use crate::portal::candidates::{
    is_valid_email, Assessment, AssessmentId, Candidate, CandidateId, CandidateStatus,
    RegisterVendor, UnknownStatus, VendorProfile,
};

/// Default lifetime of a login session.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 24 * 60;

/// Vendor-facing operations behind the HTTP routes: accounts, sessions,
/// assessments, candidate links and their lifecycle status.
pub struct VendorPortalService<R> {
    repository: Arc<R>,
    session_ttl: chrono::Duration,
}

/// Successful login: the session token and the vendor it belongs to.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub token: String,
    pub vendor: VendorProfile,
}

/// Assessment with its linked candidates in link order.
#[derive(Debug, Clone)]
pub struct AssessmentWithCandidates {
    pub assessment: Assessment,
    pub candidates: Vec<Candidate>,
}

/// Result of a status update: the stored label and the refreshed candidate.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub stored: &'static str,
    pub candidate: Candidate,
}

/// Add-candidate body. Every field is optional so missing ones surface as a
/// 400 with a readable detail instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
}

/// Create-assessment body after lenient field parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssessmentDraft {
    pub title: String,
    pub description: Option<String>,
    pub skills: Option<String>,
    pub duration: u32,
    pub work_experience: Option<String>,
    pub required_candidates: u32,
}

impl AssessmentDraft {
    /// Accepts numbers or numeric strings for `duration` and
    /// `required_candidates`; anything unparsable falls back to 0 and
    /// negatives clamp to 0. `experience` is an alias of `work_experience`.
    pub fn from_payload(payload: &Value) -> Result<Self, PortalServiceError> {
        let title = text_field(payload, "title")
            .ok_or_else(|| PortalServiceError::InvalidInput("Title is required".to_string()))?;

        Ok(Self {
            title,
            description: text_field(payload, "description"),
            skills: text_field(payload, "skills"),
            duration: count_field(payload, "duration"),
            work_experience: text_field(payload, "experience")
                .or_else(|| text_field(payload, "work_experience")),
            required_candidates: count_field(payload, "required_candidates"),
        })
    }
}

fn text_field(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn count_field(payload: &Value, key: &str) -> u32 {
    let parsed = match payload.get(key) {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(value) if value.is_finite() && value > 0.0 => {
            value.trunc().min(f64::from(u32::MAX)) as u32
        }
        _ => 0,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

impl<R> VendorPortalService<R>
where
    R: PortalRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_session_ttl(
            repository,
            chrono::Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
        )
    }

    pub fn with_session_ttl(repository: Arc<R>, session_ttl: chrono::Duration) -> Self {
        Self {
            repository,
            session_ttl,
        }
    }

    pub fn register(&self, request: RegisterVendor) -> Result<VendorProfile, PortalServiceError> {
        let company_name = request.company_name.trim().to_string();
        let email = request.email.trim().to_lowercase();
        if company_name.is_empty() {
            return Err(PortalServiceError::InvalidInput(
                "Company name is required".to_string(),
            ));
        }
        if !is_valid_email(&email) {
            return Err(PortalServiceError::InvalidInput(
                "Enter a valid email".to_string(),
            ));
        }
        if request.password.is_empty() {
            return Err(PortalServiceError::InvalidInput(
                "Password is required".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)
            .map_err(|err| PortalServiceError::PasswordHashing(err.to_string()))?;
        let vendor = self
            .repository
            .insert_vendor(NewVendorRecord {
                company_name,
                email,
                password_hash,
            })
            .map_err(|err| match err {
                RepositoryError::Conflict => PortalServiceError::VendorExists,
                other => other.into(),
            })?;

        info!(vendor_id = vendor.id, "vendor registered");
        Ok(vendor.profile())
    }

    pub fn login(&self, email: &str, password: &str) -> Result<LoginSession, PortalServiceError> {
        let vendor = self
            .repository
            .vendor_by_email(email.trim())?
            .filter(|vendor| verify_password(password, &vendor.password_hash));
        let Some(vendor) = vendor else {
            warn!("vendor login rejected");
            return Err(PortalServiceError::InvalidCredentials);
        };

        let token = new_session_token();
        self.repository.insert_session(SessionRecord {
            token: token.clone(),
            vendor_id: vendor.id,
            expires_at: Utc::now() + self.session_ttl,
        })?;

        info!(vendor_id = vendor.id, "vendor logged in");
        Ok(LoginSession {
            token,
            vendor: vendor.profile(),
        })
    }

    /// Drops the session if there is one; logging out twice is not an error.
    pub fn logout(&self, token: Option<&str>) -> Result<(), PortalServiceError> {
        if let Some(token) = token {
            self.repository.remove_session(token)?;
        }
        Ok(())
    }

    /// Resolve the vendor behind a session token.
    pub fn authenticate(&self, token: Option<&str>) -> Result<VendorRecord, PortalServiceError> {
        let token = token
            .filter(|token| !token.is_empty())
            .ok_or(PortalServiceError::NotAuthenticated)?;

        let session = self
            .repository
            .session(token)?
            .ok_or(PortalServiceError::SessionInvalid)?;
        if session.is_expired(Utc::now()) {
            self.repository.remove_session(token)?;
            return Err(PortalServiceError::SessionInvalid);
        }

        self.repository
            .vendor(session.vendor_id)?
            .ok_or(PortalServiceError::VendorNotFound)
    }

    /// Every assessment of the vendor with its linked candidates inline.
    pub fn dashboard(
        &self,
        vendor: &VendorRecord,
    ) -> Result<Vec<Assessment>, PortalServiceError> {
        self.repository
            .assessments_for_vendor(vendor.id)?
            .into_iter()
            .map(|record| -> Result<Assessment, PortalServiceError> {
                let candidates = self.candidates_of(&record.assessment_id)?;
                Ok(record.to_assessment(candidates))
            })
            .collect()
    }

    pub fn create_assessment(
        &self,
        vendor: &VendorRecord,
        draft: AssessmentDraft,
    ) -> Result<Assessment, PortalServiceError> {
        let record = self.repository.insert_assessment(AssessmentRecord {
            assessment_id: AssessmentId::new(uuid::Uuid::new_v4().to_string()),
            title: draft.title,
            description: draft.description,
            skills: draft.skills,
            duration: draft.duration,
            work_experience: draft.work_experience,
            vendor_id: vendor.id,
            status: "draft".to_string(),
            required_candidates: draft.required_candidates,
            created_at: Utc::now(),
        })?;

        info!(
            vendor_id = vendor.id,
            assessment = %record.assessment_id,
            required = record.required_candidates,
            "assessment created"
        );
        Ok(record.to_assessment(Vec::new()))
    }

    /// Assessment detail; assessments of other vendors read as missing.
    pub fn assessment_detail(
        &self,
        vendor: &VendorRecord,
        assessment_id: &AssessmentId,
    ) -> Result<AssessmentWithCandidates, PortalServiceError> {
        let record = self
            .repository
            .assessment(assessment_id)?
            .filter(|record| record.vendor_id == vendor.id)
            .ok_or(PortalServiceError::AssessmentNotFound)?;

        Ok(AssessmentWithCandidates {
            assessment: record.to_assessment(Vec::new()),
            candidates: self.candidates_of(assessment_id)?,
        })
    }

    /// Create the candidate (or reuse the one with the same email) and link
    /// it to the vendor's assessment. Repeating the call is harmless.
    pub fn add_candidate(
        &self,
        vendor: &VendorRecord,
        assessment_id: &AssessmentId,
        submission: CandidateSubmission,
    ) -> Result<Candidate, PortalServiceError> {
        let (Some(name), Some(email)) = (non_blank(submission.name), non_blank(submission.email))
        else {
            return Err(PortalServiceError::InvalidInput(
                "Name and email are required".to_string(),
            ));
        };
        if uuid::Uuid::parse_str(assessment_id.as_str()).is_err() {
            return Err(PortalServiceError::InvalidInput(
                "Invalid assessment ID format".to_string(),
            ));
        }
        self.repository
            .assessment(assessment_id)?
            .filter(|record| record.vendor_id == vendor.id)
            .ok_or(PortalServiceError::AssessmentNotOwned)?;

        let candidate = self.repository.upsert_candidate(CandidateUpsert {
            name,
            email,
            phone: non_blank(submission.phone),
            resume_path: non_blank(submission.resume_url),
        })?;
        let link = self
            .repository
            .link_candidate(assessment_id, &candidate.candidate_uuid)?;

        info!(
            assessment = %assessment_id,
            candidate = %candidate.candidate_uuid,
            "candidate linked"
        );
        Ok(link.candidate_view(&candidate))
    }

    /// Move a linked candidate along its lifecycle. Re-applying the current
    /// status succeeds without a write.
    pub fn update_status(
        &self,
        vendor: &VendorRecord,
        assessment_id: &AssessmentId,
        candidate_id: &CandidateId,
        raw_status: Option<&str>,
    ) -> Result<StatusChange, PortalServiceError> {
        let requested = CandidateStatus::parse(raw_status.unwrap_or_default())?;

        let link = self
            .repository
            .link(assessment_id, candidate_id)?
            .ok_or(PortalServiceError::CandidateNotLinked)?;
        let assessment = self
            .repository
            .assessment(assessment_id)?
            .ok_or(PortalServiceError::CandidateNotLinked)?;
        if assessment.vendor_id != vendor.id {
            return Err(PortalServiceError::Forbidden);
        }

        let current = link.status();
        let link = if current == requested {
            link
        } else if current.can_transition_to(requested) {
            self.repository.update_link_status(
                assessment_id,
                candidate_id,
                stored_label(requested),
            )?
        } else {
            return Err(PortalServiceError::IllegalTransition {
                from: current,
                to: requested,
            });
        };

        let candidate = self
            .candidates_of(assessment_id)?
            .into_iter()
            .find(|candidate| &candidate.candidate_uuid == candidate_id)
            .ok_or(PortalServiceError::CandidateNotLinked)?;

        info!(
            assessment = %assessment_id,
            candidate = %candidate_id,
            from = %current,
            to = %requested,
            "candidate status updated"
        );
        Ok(StatusChange {
            stored: stored_label(link.status()),
            candidate,
        })
    }

    pub fn change_password(
        &self,
        vendor: &VendorRecord,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), PortalServiceError> {
        if !verify_password(old_password, &vendor.password_hash) {
            return Err(PortalServiceError::IncorrectPassword);
        }
        if new_password.is_empty() {
            return Err(PortalServiceError::InvalidInput(
                "New password is required".to_string(),
            ));
        }
        let hashed = hash_password(new_password)
            .map_err(|err| PortalServiceError::PasswordHashing(err.to_string()))?;
        self.repository
            .update_password(vendor.id, hashed)?;
        info!(vendor_id = vendor.id, "vendor password changed");
        Ok(())
    }

    fn candidates_of(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<Vec<Candidate>, PortalServiceError> {
        Ok(self
            .repository
            .linked_candidates(assessment_id)?
            .iter()
            .map(|(link, candidate)| link.candidate_view(candidate))
            .collect())
    }
}

/// Error raised by the portal service. Display strings are the `detail`
/// messages returned to clients.
#[derive(Debug, thiserror::Error)]
pub enum PortalServiceError {
    #[error("Vendor already exists")]
    VendorExists,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Session expired or invalid")]
    SessionInvalid,
    #[error("Vendor not found")]
    VendorNotFound,
    #[error("{0}")]
    InvalidInput(String),
    #[error("Assessment not found")]
    AssessmentNotFound,
    #[error("Assessment not found or unauthorized")]
    AssessmentNotOwned,
    #[error("Invalid status. Allowed values: {}", allowed_statuses())]
    InvalidStatus(#[from] UnknownStatus),
    #[error("Candidate not linked to this assessment")]
    CandidateNotLinked,
    #[error("Not permitted")]
    Forbidden,
    #[error("Cannot move candidate from {from} to {to}")]
    IllegalTransition {
        from: CandidateStatus,
        to: CandidateStatus,
    },
    #[error("Current password incorrect")]
    IncorrectPassword,
    #[error("Password could not be stored: {0}")]
    PasswordHashing(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PortalServiceError {
    /// HTTP status the backend answers with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PortalServiceError::VendorExists
            | PortalServiceError::InvalidInput(_)
            | PortalServiceError::InvalidStatus(_)
            | PortalServiceError::IncorrectPassword => StatusCode::BAD_REQUEST,
            PortalServiceError::InvalidCredentials
            | PortalServiceError::NotAuthenticated
            | PortalServiceError::SessionInvalid => StatusCode::UNAUTHORIZED,
            PortalServiceError::Forbidden => StatusCode::FORBIDDEN,
            PortalServiceError::VendorNotFound
            | PortalServiceError::AssessmentNotFound
            | PortalServiceError::AssessmentNotOwned
            | PortalServiceError::CandidateNotLinked => StatusCode::NOT_FOUND,
            PortalServiceError::IllegalTransition { .. } => StatusCode::CONFLICT,
            PortalServiceError::PasswordHashing(_) | PortalServiceError::Repository(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn allowed_statuses() -> String {
    CandidateStatus::ALL
        .iter()
        .map(|status| status.label())
        .collect::<Vec<_>>()
        .join(", ")
}
