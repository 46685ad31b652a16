//! Reference vendor portal backend: repository, service and axum routes
//! implementing the REST contract the portal client consumes.

pub mod credentials;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use repository::{
    InMemoryPortalRepository, PortalRepository, RepositoryError, VendorRecord,
};
pub use router::{portal_router, SESSION_COOKIE};
pub use service::{
    AssessmentDraft, CandidateSubmission, PortalServiceError, VendorPortalService,
    DEFAULT_SESSION_TTL_MINUTES,
};
