use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::portal::candidates::{
    Assessment, AssessmentId, Candidate, CandidateId, CandidateRowInput, CandidateStatus,
    NewAssessment, NewCandidate, RegisterVendor,
};
use crate::portal::client::{
    AddCandidateResponse, ApiError, AssessmentDetail, Dashboard, LoginResponse, PortalApi,
    RegisterResponse, StatusUpdateResponse,
};
use crate::portal::storage::{ProgressSink, ResumeFile, ResumeStorage, StorageError, UploadProgress};

pub(super) fn assessment_id() -> AssessmentId {
    AssessmentId::new("5d0c7c1e-5f7b-4a39-9d55-1b8f3c2a9e10")
}

pub(super) fn candidate(uuid: &str, name: &str, status: CandidateStatus) -> Candidate {
    Candidate {
        id: None,
        candidate_uuid: CandidateId::new(uuid),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: None,
        resume_path: None,
        status,
    }
}

pub(super) fn assessment(required: u32) -> Assessment {
    Assessment {
        assessment_id: assessment_id(),
        title: "Backend Engineer".to_string(),
        description: Some("Rust services".to_string()),
        skills: Some("rust, sql".to_string()),
        duration: 60,
        work_experience: Some("3-5 years".to_string()),
        vendor_id: 7,
        status: "draft".to_string(),
        required_candidates: required,
        candidates: Vec::new(),
    }
}

pub(super) fn detail(required: u32, candidates: Vec<Candidate>) -> AssessmentDetail {
    AssessmentDetail {
        assessment: assessment(required),
        candidates,
    }
}

pub(super) fn resume(size: usize) -> ResumeFile {
    ResumeFile::new("resume.pdf", vec![0u8; size])
}

pub(super) fn row(name: &str, email: &str) -> CandidateRowInput {
    CandidateRowInput {
        name: name.to_string(),
        email: email.to_string(),
        phone: Some("+1 555 0100".to_string()),
        resume: Some(resume(100 * 1024)),
    }
}

/// Portal fake recording every call that would hit the network.
#[derive(Default)]
pub(super) struct FakePortal {
    pub(super) status_calls: Mutex<Vec<(AssessmentId, CandidateId, CandidateStatus)>>,
    pub(super) add_calls: Mutex<Vec<NewCandidate>>,
    status_responses: Mutex<VecDeque<Result<StatusUpdateResponse, ApiError>>>,
    add_failures: Mutex<Vec<(String, ApiError)>>,
    gate: Option<Arc<Notify>>,
}

impl FakePortal {
    pub(super) fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub(super) fn respond_to_status(&self, response: Result<StatusUpdateResponse, ApiError>) {
        self.status_responses
            .lock()
            .expect("lock")
            .push_back(response);
    }

    pub(super) fn fail_add_for(&self, email: &str, error: ApiError) {
        self.add_failures
            .lock()
            .expect("lock")
            .push((email.to_string(), error));
    }

    pub(super) fn status_call_count(&self) -> usize {
        self.status_calls.lock().expect("lock").len()
    }

    pub(super) fn added_emails(&self) -> Vec<String> {
        self.add_calls
            .lock()
            .expect("lock")
            .iter()
            .map(|payload| payload.email.clone())
            .collect()
    }
}

fn unused() -> ApiError {
    ApiError::Configuration("not exercised by this fake".to_string())
}

#[async_trait]
impl PortalApi for FakePortal {
    async fn login(&self, _email: &str, _password: &str) -> Result<LoginResponse, ApiError> {
        Err(unused())
    }

    async fn register(&self, _vendor: &RegisterVendor) -> Result<RegisterResponse, ApiError> {
        Err(unused())
    }

    async fn logout(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn dashboard(&self) -> Result<Dashboard, ApiError> {
        Err(unused())
    }

    async fn create_assessment(&self, _assessment: &NewAssessment) -> Result<Assessment, ApiError> {
        Err(unused())
    }

    async fn assessment(
        &self,
        _assessment_id: &AssessmentId,
    ) -> Result<AssessmentDetail, ApiError> {
        Err(unused())
    }

    async fn add_candidate(
        &self,
        _assessment_id: &AssessmentId,
        payload: &NewCandidate,
    ) -> Result<AddCandidateResponse, ApiError> {
        let position = {
            let mut calls = self.add_calls.lock().expect("lock");
            calls.push(payload.clone());
            calls.len()
        };

        let failure = self
            .add_failures
            .lock()
            .expect("lock")
            .iter()
            .find(|(email, _)| email == &payload.email)
            .map(|(_, error)| error.clone());
        if let Some(error) = failure {
            return Err(error);
        }

        Ok(AddCandidateResponse {
            candidate: Some(Candidate {
                id: Some(position as u64),
                candidate_uuid: CandidateId::new(format!("cand-{position}")),
                name: payload.name.clone(),
                email: payload.email.clone(),
                phone: payload.phone.clone(),
                resume_path: payload.resume_url.clone(),
                status: CandidateStatus::Invited,
            }),
            candidates: None,
        })
    }

    async fn update_candidate_status(
        &self,
        assessment_id: &AssessmentId,
        candidate_id: &CandidateId,
        status: CandidateStatus,
    ) -> Result<StatusUpdateResponse, ApiError> {
        self.status_calls.lock().expect("lock").push((
            assessment_id.clone(),
            candidate_id.clone(),
            status,
        ));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let scripted = self.status_responses.lock().expect("lock").pop_front();
        scripted.unwrap_or(Ok(StatusUpdateResponse {
            status: Some(status),
            candidate: None,
        }))
    }

    async fn change_password(
        &self,
        _old_password: &str,
        _new_password: &str,
    ) -> Result<(), ApiError> {
        Err(unused())
    }
}

/// Storage fake returning deterministic URLs and reporting two progress ticks.
#[derive(Default)]
pub(super) struct FakeStorage {
    pub(super) uploads: Mutex<Vec<String>>,
    fail_on_call: Option<usize>,
}

impl FakeStorage {
    pub(super) fn failing_on(call: usize) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_on_call: Some(call),
        }
    }

    pub(super) fn upload_count(&self) -> usize {
        self.uploads.lock().expect("lock").len()
    }
}

#[async_trait]
impl ResumeStorage for FakeStorage {
    async fn upload(
        &self,
        object_path: &str,
        file: &ResumeFile,
        progress: ProgressSink,
    ) -> Result<String, StorageError> {
        let call = {
            let mut uploads = self.uploads.lock().expect("lock");
            uploads.push(object_path.to_string());
            uploads.len()
        };
        if self.fail_on_call == Some(call) {
            return Err(StorageError::Transport("connection reset".to_string()));
        }

        let total = file.size();
        progress(UploadProgress {
            bytes_transferred: total / 2,
            total_bytes: total,
        });
        progress(UploadProgress {
            bytes_transferred: total,
            total_bytes: total,
        });
        Ok(format!("https://storage.test/{object_path}"))
    }
}
