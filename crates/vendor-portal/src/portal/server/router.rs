use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use super::repository::{PortalRepository, VendorRecord};
use super::service::{
    AssessmentDraft, CandidateSubmission, PortalServiceError, VendorPortalService,
};
use crate::portal::candidates::{Assessment, AssessmentId, CandidateId, RegisterVendor};

/// Name of the HttpOnly cookie carrying the session token.
pub const SESSION_COOKIE: &str = "access_token";

type SharedService<R> = Arc<VendorPortalService<R>>;

/// Router builder exposing the vendor portal endpoints.
pub fn portal_router<R>(service: SharedService<R>) -> Router
where
    R: PortalRepository + 'static,
{
    Router::new()
        .route("/auth/vendor/register", post(register_handler::<R>))
        .route("/auth/vendor/login", post(login_handler::<R>))
        .route("/auth/logout", post(logout_handler::<R>))
        .route("/vendor/logout", post(logout_handler::<R>))
        .route("/vendor/dashboard", get(dashboard_handler::<R>))
        .route(
            "/vendor/create-assessment",
            post(create_assessment_handler::<R>),
        )
        .route(
            "/vendor/assessment/:assessment_id",
            get(assessment_handler::<R>),
        )
        .route(
            "/vendor/assessment/:assessment_id/add-candidate",
            post(add_candidate_handler::<R>),
        )
        .route(
            "/vendor/assessment/:assessment_id/candidate/:candidate_uuid/status",
            post(status_handler::<R>),
        )
        .route(
            "/vendor/change-password",
            post(change_password_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusPayload {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChangePasswordPayload {
    old_password: String,
    new_password: String,
}

/// Assessment as listed to clients, with the derived candidate count.
#[derive(Debug, Serialize)]
struct AssessmentSummary {
    #[serde(flatten)]
    assessment: Assessment,
    candidates_count: usize,
}

impl AssessmentSummary {
    fn new(assessment: Assessment, candidates_count: usize) -> Self {
        Self {
            assessment,
            candidates_count,
        }
    }
}

/// Session token from the `Cookie` header, if present.
pub(crate) fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/")
}

fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

fn error_response(err: PortalServiceError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = %err, "portal backend failure");
    }
    (status, Json(json!({ "detail": err.to_string() }))).into_response()
}

fn authenticated<R>(
    service: &VendorPortalService<R>,
    headers: &HeaderMap,
) -> Result<VendorRecord, Response>
where
    R: PortalRepository + 'static,
{
    service
        .authenticate(session_token(headers).as_deref())
        .map_err(error_response)
}

pub(crate) async fn register_handler<R>(
    State(service): State<SharedService<R>>,
    Json(request): Json<RegisterVendor>,
) -> Response
where
    R: PortalRepository + 'static,
{
    match service.register(request) {
        Ok(vendor) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "vendor_id": vendor.id })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn login_handler<R>(
    State(service): State<SharedService<R>>,
    Json(payload): Json<LoginPayload>,
) -> Response
where
    R: PortalRepository + 'static,
{
    match service.login(&payload.email, &payload.password) {
        Ok(session) => {
            let body = json!({
                "access_token": session.token,
                "token_type": "bearer",
                "vendor": session.vendor,
            });
            (
                StatusCode::OK,
                [(header::SET_COOKIE, session_cookie(&session.token))],
                Json(body),
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn logout_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
) -> Response
where
    R: PortalRepository + 'static,
{
    if let Err(err) = service.logout(session_token(&headers).as_deref()) {
        error!(error = %err, "failed to drop session on logout");
    }
    (
        StatusCode::OK,
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(json!({ "ok": true, "detail": "Logged out successfully" })),
    )
        .into_response()
}

pub(crate) async fn dashboard_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
) -> Response
where
    R: PortalRepository + 'static,
{
    let vendor = match authenticated(&service, &headers) {
        Ok(vendor) => vendor,
        Err(response) => return response,
    };

    match service.dashboard(&vendor) {
        Ok(assessments) => {
            let assessments: Vec<AssessmentSummary> = assessments
                .into_iter()
                .map(|assessment| {
                    let count = assessment.added_count();
                    AssessmentSummary::new(assessment, count)
                })
                .collect();
            let body = json!({
                "vendor": vendor.profile(),
                "assessments": assessments,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_assessment_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Response
where
    R: PortalRepository + 'static,
{
    let vendor = match authenticated(&service, &headers) {
        Ok(vendor) => vendor,
        Err(response) => return response,
    };

    let created = AssessmentDraft::from_payload(&payload)
        .and_then(|draft| service.create_assessment(&vendor, draft));
    match created {
        Ok(assessment) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "assessment": assessment })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn assessment_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Path(assessment_id): Path<String>,
) -> Response
where
    R: PortalRepository + 'static,
{
    let vendor = match authenticated(&service, &headers) {
        Ok(vendor) => vendor,
        Err(response) => return response,
    };

    match service.assessment_detail(&vendor, &AssessmentId::new(assessment_id)) {
        Ok(detail) => {
            let count = detail.candidates.len();
            let body = json!({
                "ok": true,
                "assessment": AssessmentSummary::new(detail.assessment, count),
                "candidates": detail.candidates,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn add_candidate_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Path(assessment_id): Path<String>,
    Json(submission): Json<CandidateSubmission>,
) -> Response
where
    R: PortalRepository + 'static,
{
    let vendor = match authenticated(&service, &headers) {
        Ok(vendor) => vendor,
        Err(response) => return response,
    };

    match service.add_candidate(&vendor, &AssessmentId::new(assessment_id), submission) {
        Ok(candidate) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "candidate": candidate })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Path((assessment_id, candidate_uuid)): Path<(String, String)>,
    Json(payload): Json<StatusPayload>,
) -> Response
where
    R: PortalRepository + 'static,
{
    let vendor = match authenticated(&service, &headers) {
        Ok(vendor) => vendor,
        Err(response) => return response,
    };

    match service.update_status(
        &vendor,
        &AssessmentId::new(assessment_id),
        &CandidateId::new(candidate_uuid),
        payload.status.as_deref(),
    ) {
        Ok(change) => {
            let body = json!({
                "ok": true,
                "status": change.stored,
                "candidate": change.candidate,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn change_password_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordPayload>,
) -> Response
where
    R: PortalRepository + 'static,
{
    let vendor = match authenticated(&service, &headers) {
        Ok(vendor) => vendor,
        Err(response) => return response,
    };

    match service.change_password(&vendor, &payload.old_password, &payload.new_password) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "detail": "Password updated successfully" })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}
