use crate::infra::{is_valid_object_path, AppState};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use vendor_portal::portal::server::{portal_router, PortalRepository, VendorPortalService};

/// Upload ceiling for the storage stand-in; above the intake maximum so the
/// client-side size check is the one vendors see.
const MAX_UPLOAD_BYTES: usize = 4 * 1024 * 1024;

pub(crate) fn with_portal_routes<R>(service: Arc<VendorPortalService<R>>) -> axum::Router
where
    R: PortalRepository + 'static,
{
    portal_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/storage/*object_path",
            axum::routing::put(upload_resume)
                .get(download_resume)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn upload_resume(
    Extension(state): Extension<AppState>,
    Path(object_path): Path<String>,
    body: Bytes,
) -> Response {
    if !is_valid_object_path(&object_path) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Invalid object path" })),
        )
            .into_response();
    }

    let size = body.len();
    state.resumes.put(&object_path, body.to_vec());
    info!(path = %object_path, bytes = size, "resume stored");

    let url = format!(
        "{}/{}",
        state.storage_base_url.trim_end_matches('/'),
        object_path
    );
    (StatusCode::CREATED, Json(json!({ "url": url }))).into_response()
}

pub(crate) async fn download_resume(
    Extension(state): Extension<AppState>,
    Path(object_path): Path<String>,
) -> Response {
    match state.resumes.get(&object_path) {
        Some(bytes) => {
            let content_type = mime_guess::from_path(&object_path)
                .first_or_octet_stream()
                .to_string();
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Resume not found" })),
        )
            .into_response(),
    }
}
