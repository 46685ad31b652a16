//! Candidate status lifecycle: the status model, the assessment view state it
//! is rendered from, status synchronization with the portal, and batch intake.

pub mod board;
pub mod domain;
pub mod intake;
pub mod status;
pub mod sync;

#[cfg(test)]
mod tests;

pub use board::{BoardError, CandidateBoard, CandidateRow};
pub use domain::{
    Assessment, AssessmentId, Candidate, CandidateId, NewAssessment, NewCandidate,
    RegisterVendor, StatusTransitionRequest, VendorProfile,
};
pub use intake::{
    check_resume_size, is_valid_email, validate_batch, validate_row, BatchHalted,
    CandidateIntake, CandidateRowInput, FieldError, IntakeError, IntakeRejected, RowErrors,
    RowFailure, RowField, RowProgress, MAX_RESUME_BYTES, MIN_RESUME_BYTES,
};
pub use status::{CandidateStatus, UnknownStatus};
pub use sync::{StatusConfirmation, StatusSync, StatusSyncError};
