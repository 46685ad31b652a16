use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use serde_json::Value;

use crate::portal::candidates::{AssessmentId, CandidateId, RegisterVendor};
use crate::portal::server::repository::{
    AssessmentRecord, CandidateRecord, CandidateUpsert, LinkRecord, NewVendorRecord,
    PortalRepository, RepositoryError, SessionRecord, VendorRecord,
};
use crate::portal::server::{
    portal_router, AssessmentDraft, CandidateSubmission, InMemoryPortalRepository,
    VendorPortalService,
};

pub(super) const PASSWORD: &str = "correct horse battery";

pub(super) fn build_service() -> Arc<VendorPortalService<InMemoryPortalRepository>> {
    Arc::new(VendorPortalService::new(Arc::new(
        InMemoryPortalRepository::new(),
    )))
}

pub(super) fn registration(email: &str) -> RegisterVendor {
    RegisterVendor {
        company_name: "Acme Staffing".to_string(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
    }
}

/// Registers and authenticates a vendor, returning its record and session token.
pub(super) fn signed_in(
    service: &VendorPortalService<InMemoryPortalRepository>,
    email: &str,
) -> (VendorRecord, String) {
    service.register(registration(email)).expect("registers");
    let session = service.login(email, PASSWORD).expect("logs in");
    let vendor = service
        .authenticate(Some(&session.token))
        .expect("session valid");
    (vendor, session.token)
}

pub(super) fn draft(required: u32) -> AssessmentDraft {
    AssessmentDraft {
        title: "Backend Engineer".to_string(),
        required_candidates: required,
        duration: 60,
        ..AssessmentDraft::default()
    }
}

pub(super) fn submission(name: &str, email: &str) -> CandidateSubmission {
    CandidateSubmission {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        phone: None,
        resume_url: Some(format!("https://storage.test/resumes/{name}.pdf")),
    }
}

pub(super) fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("access_token={token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("serializes")))
        .expect("request builds")
}

pub(super) fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("access_token={token}"));
    }
    builder.body(Body::empty()).expect("request builds")
}

pub(super) async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

pub(super) fn router_with_service(
    service: Arc<VendorPortalService<InMemoryPortalRepository>>,
) -> Router {
    portal_router(service)
}

/// Repository whose every call fails, for 500 paths.
pub(super) struct UnavailableRepository;

fn unavailable<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl PortalRepository for UnavailableRepository {
    fn insert_vendor(&self, _vendor: NewVendorRecord) -> Result<VendorRecord, RepositoryError> {
        unavailable()
    }

    fn vendor(&self, _id: u64) -> Result<Option<VendorRecord>, RepositoryError> {
        unavailable()
    }

    fn vendor_by_email(&self, _email: &str) -> Result<Option<VendorRecord>, RepositoryError> {
        unavailable()
    }

    fn update_password(
        &self,
        _vendor_id: u64,
        _password_hash: String,
    ) -> Result<(), RepositoryError> {
        unavailable()
    }

    fn insert_session(&self, _session: SessionRecord) -> Result<(), RepositoryError> {
        unavailable()
    }

    fn session(&self, _token: &str) -> Result<Option<SessionRecord>, RepositoryError> {
        unavailable()
    }

    fn remove_session(&self, _token: &str) -> Result<(), RepositoryError> {
        unavailable()
    }

    fn insert_assessment(
        &self,
        _assessment: AssessmentRecord,
    ) -> Result<AssessmentRecord, RepositoryError> {
        unavailable()
    }

    fn assessment(&self, _id: &AssessmentId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        unavailable()
    }

    fn assessments_for_vendor(
        &self,
        _vendor_id: u64,
    ) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        unavailable()
    }

    fn upsert_candidate(
        &self,
        _candidate: CandidateUpsert,
    ) -> Result<CandidateRecord, RepositoryError> {
        unavailable()
    }

    fn link_candidate(
        &self,
        _assessment_id: &AssessmentId,
        _candidate_uuid: &CandidateId,
    ) -> Result<LinkRecord, RepositoryError> {
        unavailable()
    }

    fn link(
        &self,
        _assessment_id: &AssessmentId,
        _candidate_uuid: &CandidateId,
    ) -> Result<Option<LinkRecord>, RepositoryError> {
        unavailable()
    }

    fn update_link_status(
        &self,
        _assessment_id: &AssessmentId,
        _candidate_uuid: &CandidateId,
        _status: &str,
    ) -> Result<LinkRecord, RepositoryError> {
        unavailable()
    }

    fn linked_candidates(
        &self,
        _assessment_id: &AssessmentId,
    ) -> Result<Vec<(LinkRecord, CandidateRecord)>, RepositoryError> {
        unavailable()
    }
}
