use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use reqwest::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_STORAGE_BASE_URL: &str = "http://localhost:8000/storage";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_TTL_MINUTES: i64 = 24 * 60;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the portal service and its clients.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub portal: PortalConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let api_base_url = base_url_var("PORTAL_API_BASE_URL", DEFAULT_API_BASE_URL)?;
        let storage_base_url = base_url_var("PORTAL_STORAGE_BASE_URL", DEFAULT_STORAGE_BASE_URL)?;

        let timeout_secs = match env::var("PORTAL_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidNumber {
                    variable: "PORTAL_REQUEST_TIMEOUT_SECS",
                })?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let session_ttl_minutes = match env::var("PORTAL_SESSION_TTL_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .ok_or(ConfigError::InvalidNumber {
                    variable: "PORTAL_SESSION_TTL_MINUTES",
                })?,
            Err(_) => DEFAULT_SESSION_TTL_MINUTES,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            portal: PortalConfig {
                api_base_url,
                storage_base_url,
                request_timeout: Duration::from_secs(timeout_secs),
                session_ttl: chrono::Duration::minutes(session_ttl_minutes),
            },
        })
    }
}

fn base_url_var(variable: &'static str, default: &str) -> Result<String, ConfigError> {
    let raw = env::var(variable).unwrap_or_else(|_| default.to_string());
    normalize_base_url(&raw).ok_or(ConfigError::InvalidUrl { variable, value: raw })
}

/// Parses `raw` as an absolute http(s) URL with a host and returns it without
/// trailing slashes. Queries and fragments are rejected.
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https")
        || parsed.host_str().map_or(true, str::is_empty)
        || parsed.query().is_some()
        || parsed.fragment().is_some()
    {
        return None;
    }
    Some(parsed.as_str().trim_end_matches('/').to_string())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the portal backend and the resume store live, and how long we wait for them.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub api_base_url: String,
    pub storage_base_url: String,
    pub request_timeout: Duration,
    pub session_ttl: chrono::Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            storage_base_url: DEFAULT_STORAGE_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            session_ttl: chrono::Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidUrl { variable: &'static str, value: String },
    InvalidNumber { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidUrl { variable, value } => {
                write!(f, "{variable} must be an http(s) URL (found '{value}')")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
