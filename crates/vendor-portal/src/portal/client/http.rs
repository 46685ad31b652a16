use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::{
    decode_body, AddCandidateResponse, ApiError, AssessmentDetail, CreatedAssessment, Dashboard,
    ErrorBody, LoginResponse, PortalApi, RegisterResponse, StatusUpdateResponse,
};
use crate::config::{normalize_base_url, PortalConfig};
use crate::portal::candidates::{
    Assessment, AssessmentId, CandidateId, CandidateStatus, NewAssessment, NewCandidate,
    RegisterVendor,
};

/// Upper bound on error bodies echoed back to callers.
const MAX_ERROR_DETAIL_LENGTH: usize = 200;

/// reqwest-backed portal client. The session cookie issued at login is kept
/// in the client's cookie store and sent with every later call.
#[derive(Debug, Clone)]
pub struct HttpPortalClient {
    client: Client,
    base: Url,
    base_url: String,
}

impl HttpPortalClient {
    pub fn new(config: &PortalConfig) -> Result<Self, ApiError> {
        Self::with_base_url(&config.api_base_url, config.request_timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let invalid = || ApiError::Configuration(format!("'{base_url}' is not an http(s) base URL"));
        let normalized = normalize_base_url(base_url).ok_or_else(invalid)?;
        let base = Url::parse(&normalized).map_err(|_| invalid())?;

        let client = Client::builder()
            .cookie_store(true)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Configuration(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base,
            base_url: normalized,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL extended with `segments`, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::Configuration(format!("'{}' cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<(u16, Vec<u8>, bool), ApiError> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("application/json"))
            .unwrap_or(false);
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        debug!(status = status.as_u16(), bytes = body.len(), "portal response");

        if !status.is_success() {
            return Err(ApiError::ServerRejected {
                status: status.as_u16(),
                detail: error_detail(&body, is_json),
            });
        }

        Ok((status.as_u16(), body.to_vec(), is_json))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let (_, body, _) = self.execute(request).await?;
        decode_body(&body)
    }

    /// For endpoints whose success body carries nothing we need.
    async fn send_ack(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let (_, body, is_json) = self.execute(request).await?;
        if is_json && !body.is_empty() {
            serde_json::from_slice::<serde_json::Value>(&body)
                .map_err(|err| ApiError::MalformedResponse(err.to_string()))?;
        }
        Ok(())
    }
}

fn error_detail(body: &[u8], is_json: bool) -> Option<String> {
    if is_json {
        if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
            return parsed.detail;
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let truncated: String = text.chars().take(MAX_ERROR_DETAIL_LENGTH).collect();
    Some(truncated)
}

#[async_trait]
impl PortalApi for HttpPortalClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = self
            .client
            .post(self.endpoint(&["auth", "vendor", "login"])?)
            .json(&json!({ "email": email, "password": password }));
        self.send(request).await
    }

    async fn register(&self, vendor: &RegisterVendor) -> Result<RegisterResponse, ApiError> {
        let request = self
            .client
            .post(self.endpoint(&["auth", "vendor", "register"])?)
            .json(vendor);
        self.send(request).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let request = self.client.post(self.endpoint(&["auth", "logout"])?);
        self.send_ack(request).await
    }

    async fn dashboard(&self) -> Result<Dashboard, ApiError> {
        let request = self.client.get(self.endpoint(&["vendor", "dashboard"])?);
        self.send(request).await
    }

    async fn create_assessment(&self, assessment: &NewAssessment) -> Result<Assessment, ApiError> {
        let request = self
            .client
            .post(self.endpoint(&["vendor", "create-assessment"])?)
            .json(assessment);
        let created: CreatedAssessment = self.send(request).await?;
        Ok(created.assessment)
    }

    async fn assessment(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<AssessmentDetail, ApiError> {
        let request = self
            .client
            .get(self.endpoint(&["vendor", "assessment", assessment_id.as_str()])?);
        self.send(request).await
    }

    async fn add_candidate(
        &self,
        assessment_id: &AssessmentId,
        candidate: &NewCandidate,
    ) -> Result<AddCandidateResponse, ApiError> {
        let request = self
            .client
            .post(self.endpoint(&[
                "vendor",
                "assessment",
                assessment_id.as_str(),
                "add-candidate",
            ])?)
            .json(candidate);
        self.send(request).await
    }

    async fn update_candidate_status(
        &self,
        assessment_id: &AssessmentId,
        candidate_id: &CandidateId,
        status: CandidateStatus,
    ) -> Result<StatusUpdateResponse, ApiError> {
        let request = self
            .client
            .post(self.endpoint(&[
                "vendor",
                "assessment",
                assessment_id.as_str(),
                "candidate",
                candidate_id.as_str(),
                "status",
            ])?)
            .json(&json!({ "status": status.label() }));
        self.send(request).await
    }

    async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.endpoint(&["vendor", "change-password"])?)
            .json(&json!({ "old_password": old_password, "new_password": new_password }));
        self.send_ack(request).await
    }
}
