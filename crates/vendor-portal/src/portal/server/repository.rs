use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::portal::candidates::{
    Assessment, AssessmentId, Candidate, CandidateId, CandidateStatus, VendorProfile,
};

/// Vendor account as stored, including its password digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorRecord {
    pub id: u64,
    pub company_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl VendorRecord {
    pub fn profile(&self) -> VendorProfile {
        VendorProfile {
            id: self.id,
            company_name: self.company_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Vendor fields supplied at registration; the repository assigns the id.
#[derive(Debug, Clone)]
pub struct NewVendorRecord {
    pub company_name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token: String,
    pub vendor_id: u64,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub assessment_id: AssessmentId,
    pub title: String,
    pub description: Option<String>,
    pub skills: Option<String>,
    pub duration: u32,
    pub work_experience: Option<String>,
    pub vendor_id: u64,
    pub status: String,
    pub required_candidates: u32,
    pub created_at: DateTime<Utc>,
}

impl AssessmentRecord {
    pub fn to_assessment(&self, candidates: Vec<Candidate>) -> Assessment {
        Assessment {
            assessment_id: self.assessment_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            skills: self.skills.clone(),
            duration: self.duration,
            work_experience: self.work_experience.clone(),
            vendor_id: self.vendor_id,
            status: self.status.clone(),
            required_candidates: self.required_candidates,
            candidates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub id: u64,
    pub candidate_uuid: CandidateId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Candidate fields for an upsert keyed by email.
#[derive(Debug, Clone)]
pub struct CandidateUpsert {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_path: Option<String>,
}

/// Assessment/candidate association carrying the stored status label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub assessment_id: AssessmentId,
    pub candidate_uuid: CandidateId,
    pub status: String,
    pub invited_at: DateTime<Utc>,
}

impl LinkRecord {
    pub fn status(&self) -> CandidateStatus {
        CandidateStatus::normalize(Some(&self.status))
    }

    pub fn candidate_view(&self, candidate: &CandidateRecord) -> Candidate {
        Candidate {
            id: Some(candidate.id),
            candidate_uuid: candidate.candidate_uuid.clone(),
            name: candidate.name.clone(),
            email: candidate.email.clone(),
            phone: candidate.phone.clone(),
            resume_path: candidate.resume_path.clone(),
            status: self.status(),
        }
    }
}

/// Label persisted for a status. `Interview` keeps the legacy `interviewed`
/// spelling that existing rows already use.
pub fn stored_label(status: CandidateStatus) -> &'static str {
    match status {
        CandidateStatus::Interview => "interviewed",
        other => other.label(),
    }
}

/// Storage abstraction so the portal service can be exercised in isolation.
pub trait PortalRepository: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] when the email is taken.
    fn insert_vendor(&self, vendor: NewVendorRecord) -> Result<VendorRecord, RepositoryError>;
    fn vendor(&self, id: u64) -> Result<Option<VendorRecord>, RepositoryError>;
    fn vendor_by_email(&self, email: &str) -> Result<Option<VendorRecord>, RepositoryError>;
    fn update_password(&self, vendor_id: u64, password_hash: String)
        -> Result<(), RepositoryError>;

    fn insert_session(&self, session: SessionRecord) -> Result<(), RepositoryError>;
    fn session(&self, token: &str) -> Result<Option<SessionRecord>, RepositoryError>;
    fn remove_session(&self, token: &str) -> Result<(), RepositoryError>;

    fn insert_assessment(
        &self,
        assessment: AssessmentRecord,
    ) -> Result<AssessmentRecord, RepositoryError>;
    fn assessment(&self, id: &AssessmentId) -> Result<Option<AssessmentRecord>, RepositoryError>;
    fn assessments_for_vendor(
        &self,
        vendor_id: u64,
    ) -> Result<Vec<AssessmentRecord>, RepositoryError>;

    /// Create the candidate or refresh the contact fields of the existing one.
    fn upsert_candidate(&self, candidate: CandidateUpsert)
        -> Result<CandidateRecord, RepositoryError>;
    /// Link a candidate to an assessment; an existing link is returned as is.
    fn link_candidate(
        &self,
        assessment_id: &AssessmentId,
        candidate_uuid: &CandidateId,
    ) -> Result<LinkRecord, RepositoryError>;
    fn link(
        &self,
        assessment_id: &AssessmentId,
        candidate_uuid: &CandidateId,
    ) -> Result<Option<LinkRecord>, RepositoryError>;
    fn update_link_status(
        &self,
        assessment_id: &AssessmentId,
        candidate_uuid: &CandidateId,
        status: &str,
    ) -> Result<LinkRecord, RepositoryError>;
    /// Linked candidates in link order.
    fn linked_candidates(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<Vec<(LinkRecord, CandidateRecord)>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Default)]
struct PortalState {
    vendors: Vec<VendorRecord>,
    sessions: HashMap<String, SessionRecord>,
    assessments: Vec<AssessmentRecord>,
    candidates: Vec<CandidateRecord>,
    links: Vec<LinkRecord>,
}

/// Process-local repository; every call takes the single state lock.
#[derive(Default)]
pub struct InMemoryPortalRepository {
    state: Mutex<PortalState>,
}

impl InMemoryPortalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(
        &self,
        apply: impl FnOnce(&mut PortalState) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("portal state lock poisoned".to_string()))?;
        apply(&mut state)
    }
}

impl PortalRepository for InMemoryPortalRepository {
    fn insert_vendor(&self, vendor: NewVendorRecord) -> Result<VendorRecord, RepositoryError> {
        self.with_state(|state| {
            if state
                .vendors
                .iter()
                .any(|existing| existing.email.eq_ignore_ascii_case(&vendor.email))
            {
                return Err(RepositoryError::Conflict);
            }
            let record = VendorRecord {
                id: state.vendors.len() as u64 + 1,
                company_name: vendor.company_name,
                email: vendor.email,
                password_hash: vendor.password_hash,
                created_at: Utc::now(),
            };
            state.vendors.push(record.clone());
            Ok(record)
        })
    }

    fn vendor(&self, id: u64) -> Result<Option<VendorRecord>, RepositoryError> {
        self.with_state(|state| Ok(state.vendors.iter().find(|v| v.id == id).cloned()))
    }

    fn vendor_by_email(&self, email: &str) -> Result<Option<VendorRecord>, RepositoryError> {
        self.with_state(|state| {
            Ok(state
                .vendors
                .iter()
                .find(|v| v.email.eq_ignore_ascii_case(email))
                .cloned())
        })
    }

    fn update_password(
        &self,
        vendor_id: u64,
        password_hash: String,
    ) -> Result<(), RepositoryError> {
        self.with_state(|state| {
            let vendor = state
                .vendors
                .iter_mut()
                .find(|v| v.id == vendor_id)
                .ok_or(RepositoryError::NotFound)?;
            vendor.password_hash = password_hash;
            Ok(())
        })
    }

    fn insert_session(&self, session: SessionRecord) -> Result<(), RepositoryError> {
        let now = Utc::now();
        self.with_state(|state| {
            state.sessions.retain(|_, existing| !existing.is_expired(now));
            state.sessions.insert(session.token.clone(), session);
            Ok(())
        })
    }

    fn session(&self, token: &str) -> Result<Option<SessionRecord>, RepositoryError> {
        self.with_state(|state| Ok(state.sessions.get(token).cloned()))
    }

    fn remove_session(&self, token: &str) -> Result<(), RepositoryError> {
        self.with_state(|state| {
            state.sessions.remove(token);
            Ok(())
        })
    }

    fn insert_assessment(
        &self,
        assessment: AssessmentRecord,
    ) -> Result<AssessmentRecord, RepositoryError> {
        self.with_state(|state| {
            if state
                .assessments
                .iter()
                .any(|a| a.assessment_id == assessment.assessment_id)
            {
                return Err(RepositoryError::Conflict);
            }
            state.assessments.push(assessment.clone());
            Ok(assessment)
        })
    }

    fn assessment(&self, id: &AssessmentId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        self.with_state(|state| {
            Ok(state
                .assessments
                .iter()
                .find(|a| &a.assessment_id == id)
                .cloned())
        })
    }

    fn assessments_for_vendor(
        &self,
        vendor_id: u64,
    ) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        self.with_state(|state| {
            Ok(state
                .assessments
                .iter()
                .filter(|a| a.vendor_id == vendor_id)
                .cloned()
                .collect())
        })
    }

    fn upsert_candidate(
        &self,
        candidate: CandidateUpsert,
    ) -> Result<CandidateRecord, RepositoryError> {
        self.with_state(|state| {
            if let Some(existing) = state
                .candidates
                .iter_mut()
                .find(|c| c.email == candidate.email)
            {
                if candidate.phone.is_some() {
                    existing.phone = candidate.phone;
                }
                if candidate.resume_path.is_some() {
                    existing.resume_path = candidate.resume_path;
                }
                return Ok(existing.clone());
            }

            let record = CandidateRecord {
                id: state.candidates.len() as u64 + 1,
                candidate_uuid: CandidateId::new(uuid::Uuid::new_v4().to_string()),
                name: candidate.name,
                email: candidate.email,
                phone: candidate.phone,
                resume_path: candidate.resume_path,
                created_at: Utc::now(),
            };
            state.candidates.push(record.clone());
            Ok(record)
        })
    }

    fn link_candidate(
        &self,
        assessment_id: &AssessmentId,
        candidate_uuid: &CandidateId,
    ) -> Result<LinkRecord, RepositoryError> {
        self.with_state(|state| {
            if let Some(existing) = state.links.iter().find(|link| {
                &link.assessment_id == assessment_id && &link.candidate_uuid == candidate_uuid
            }) {
                return Ok(existing.clone());
            }
            let link = LinkRecord {
                assessment_id: assessment_id.clone(),
                candidate_uuid: candidate_uuid.clone(),
                status: stored_label(CandidateStatus::Invited).to_string(),
                invited_at: Utc::now(),
            };
            state.links.push(link.clone());
            Ok(link)
        })
    }

    fn link(
        &self,
        assessment_id: &AssessmentId,
        candidate_uuid: &CandidateId,
    ) -> Result<Option<LinkRecord>, RepositoryError> {
        self.with_state(|state| {
            Ok(state
                .links
                .iter()
                .find(|link| {
                    &link.assessment_id == assessment_id && &link.candidate_uuid == candidate_uuid
                })
                .cloned())
        })
    }

    fn update_link_status(
        &self,
        assessment_id: &AssessmentId,
        candidate_uuid: &CandidateId,
        status: &str,
    ) -> Result<LinkRecord, RepositoryError> {
        self.with_state(|state| {
            let link = state
                .links
                .iter_mut()
                .find(|link| {
                    &link.assessment_id == assessment_id && &link.candidate_uuid == candidate_uuid
                })
                .ok_or(RepositoryError::NotFound)?;
            link.status = status.to_string();
            Ok(link.clone())
        })
    }

    fn linked_candidates(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<Vec<(LinkRecord, CandidateRecord)>, RepositoryError> {
        self.with_state(|state| {
            Ok(state
                .links
                .iter()
                .filter(|link| &link.assessment_id == assessment_id)
                .filter_map(|link| {
                    state
                        .candidates
                        .iter()
                        .find(|c| c.candidate_uuid == link.candidate_uuid)
                        .map(|candidate| (link.clone(), candidate.clone()))
                })
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(email: &str, phone: Option<&str>) -> CandidateUpsert {
        CandidateUpsert {
            name: "Ada".to_string(),
            email: email.to_string(),
            phone: phone.map(str::to_string),
            resume_path: None,
        }
    }

    #[test]
    fn stored_label_keeps_legacy_interview_spelling() {
        assert_eq!(stored_label(CandidateStatus::Interview), "interviewed");
        assert_eq!(stored_label(CandidateStatus::Rejected), "rejected");
    }

    #[test]
    fn candidate_upsert_is_keyed_by_email() {
        let repo = InMemoryPortalRepository::new();
        let first = repo
            .upsert_candidate(upsert("ada@example.com", None))
            .expect("insert");
        let second = repo
            .upsert_candidate(upsert("ada@example.com", Some("+1 555 0100")))
            .expect("update");

        assert_eq!(first.candidate_uuid, second.candidate_uuid);
        assert_eq!(second.phone.as_deref(), Some("+1 555 0100"));
    }

    #[test]
    fn linking_twice_keeps_the_original_link() {
        let repo = InMemoryPortalRepository::new();
        let assessment = AssessmentId::new("a-1");
        let candidate = repo
            .upsert_candidate(upsert("ada@example.com", None))
            .expect("insert");

        repo.link_candidate(&assessment, &candidate.candidate_uuid)
            .expect("link");
        repo.update_link_status(&assessment, &candidate.candidate_uuid, "interviewed")
            .expect("status");
        let relinked = repo
            .link_candidate(&assessment, &candidate.candidate_uuid)
            .expect("relink");

        assert_eq!(relinked.status(), CandidateStatus::Interview);
        assert_eq!(
            repo.linked_candidates(&assessment).expect("list").len(),
            1
        );
    }

    #[test]
    fn new_sessions_prune_expired_ones() {
        let repo = InMemoryPortalRepository::new();
        let now = Utc::now();
        repo.insert_session(SessionRecord {
            token: "stale".to_string(),
            vendor_id: 1,
            expires_at: now - chrono::Duration::minutes(5),
        })
        .expect("insert stale");
        repo.insert_session(SessionRecord {
            token: "fresh".to_string(),
            vendor_id: 1,
            expires_at: now + chrono::Duration::minutes(5),
        })
        .expect("insert fresh");

        assert_eq!(repo.session("stale").expect("lookup"), None);
        assert!(repo.session("fresh").expect("lookup").is_some());
    }

    #[test]
    fn duplicate_vendor_email_conflicts() {
        let repo = InMemoryPortalRepository::new();
        let vendor = NewVendorRecord {
            company_name: "Acme".to_string(),
            email: "ops@acme.test".to_string(),
            password_hash: "x".to_string(),
        };
        repo.insert_vendor(vendor.clone()).expect("first insert");
        let duplicate = NewVendorRecord {
            email: "OPS@acme.test".to_string(),
            ..vendor
        };
        assert!(matches!(
            repo.insert_vendor(duplicate),
            Err(RepositoryError::Conflict)
        ));
    }
}
