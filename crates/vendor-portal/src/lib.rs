pub mod config;
pub mod error;
pub mod portal;
pub mod telemetry;

pub use config::AppConfig;
pub use error::{AppError, FailureKind};
