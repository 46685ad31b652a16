use crate::config::ConfigError;
use crate::portal::candidates::{BoardError, IntakeError, StatusSyncError};
use crate::portal::client::ApiError;
use crate::portal::server::PortalServiceError;
use crate::portal::storage::StorageError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// Coarse classification shared by every failure the lifecycle core reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Rejected locally before anything was sent.
    Validation,
    /// The request never produced an HTTP response.
    Transport,
    /// Non-2xx response.
    ServerRejected,
    /// 2xx response whose body could not be read.
    MalformedResponse,
    /// Missing context or bad settings.
    Configuration,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Validation => "validation",
            FailureKind::Transport => "transport",
            FailureKind::ServerRejected => "server_rejected",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::Configuration => "configuration",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Api(ApiError),
    Storage(StorageError),
    StatusSync(StatusSyncError),
    Intake(IntakeError),
    Board(BoardError),
    Service(PortalServiceError),
}

impl AppError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AppError::Api(err) => err.kind(),
            AppError::Storage(err) => err.kind(),
            AppError::StatusSync(err) => err.kind(),
            AppError::Intake(err) => err.kind(),
            AppError::Board(_) => FailureKind::Validation,
            AppError::Service(_) => FailureKind::ServerRejected,
            AppError::Config(_) | AppError::Telemetry(_) => FailureKind::Configuration,
            AppError::Io(_) | AppError::Server(_) => FailureKind::Transport,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Api(err) => write!(f, "portal error: {}", err),
            AppError::Storage(err) => write!(f, "storage error: {}", err),
            AppError::StatusSync(err) => write!(f, "status update error: {}", err),
            AppError::Intake(err) => write!(f, "candidate intake error: {}", err),
            AppError::Board(err) => write!(f, "assessment error: {}", err),
            AppError::Service(err) => write!(f, "portal service error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Api(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::StatusSync(err) => Some(err),
            AppError::Intake(err) => Some(err),
            AppError::Board(err) => Some(err),
            AppError::Service(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Service(err) => err.status_code(),
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => match self.kind() {
                FailureKind::Validation => StatusCode::BAD_REQUEST,
                FailureKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
                FailureKind::Transport
                | FailureKind::ServerRejected
                | FailureKind::MalformedResponse => StatusCode::BAD_GATEWAY,
            },
        };

        let body = Json(json!({ "detail": self.to_string(), "kind": self.kind() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

impl From<StorageError> for AppError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<StatusSyncError> for AppError {
    fn from(value: StatusSyncError) -> Self {
        Self::StatusSync(value)
    }
}

impl From<IntakeError> for AppError {
    fn from(value: IntakeError) -> Self {
        Self::Intake(value)
    }
}

impl From<BoardError> for AppError {
    fn from(value: BoardError) -> Self {
        Self::Board(value)
    }
}

impl From<PortalServiceError> for AppError {
    fn from(value: PortalServiceError) -> Self {
        Self::Service(value)
    }
}
