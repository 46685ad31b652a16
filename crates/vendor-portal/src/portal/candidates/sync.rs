use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use super::domain::{AssessmentId, CandidateId, StatusTransitionRequest};
use super::status::CandidateStatus;
use crate::error::FailureKind;
use crate::portal::client::{ApiError, PortalApi};

/// Server-confirmed outcome of one status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusConfirmation {
    pub assessment_id: AssessmentId,
    pub candidate_id: CandidateId,
    pub requested: CandidateStatus,
    /// Status the server reported back; `None` for a bare acknowledgement,
    /// in which case the view must be refreshed rather than patched.
    pub confirmed: Option<CandidateStatus>,
}

impl StatusConfirmation {
    /// True when the server stored something other than what was asked for.
    pub fn diverged(&self) -> bool {
        matches!(self.confirmed, Some(status) if status != self.requested)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusSyncError {
    #[error("missing assessment context; status update not sent")]
    MissingAssessmentContext,
    #[error("candidate id is required")]
    MissingCandidateId,
    #[error("cannot move candidate from {from} to {to}")]
    IllegalTransition {
        from: CandidateStatus,
        to: CandidateStatus,
    },
    #[error("a status update for candidate {0} is already in flight")]
    AlreadyInFlight(CandidateId),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl StatusSyncError {
    pub fn kind(&self) -> FailureKind {
        match self {
            StatusSyncError::MissingAssessmentContext => FailureKind::Configuration,
            StatusSyncError::MissingCandidateId
            | StatusSyncError::IllegalTransition { .. }
            | StatusSyncError::AlreadyInFlight(_) => FailureKind::Validation,
            StatusSyncError::Api(err) => err.kind(),
        }
    }

    /// The server may have applied the change even though we could not read
    /// its answer; the caller should re-fetch the assessment.
    pub fn requires_refresh(&self) -> bool {
        matches!(self, StatusSyncError::Api(ApiError::MalformedResponse(_)))
    }
}

/// Issues status changes one candidate at a time and reports only what the
/// server confirmed.
pub struct StatusSync<C> {
    client: Arc<C>,
    in_flight: Mutex<HashSet<CandidateId>>,
}

/// Releases the candidate's in-flight slot on every exit path.
struct InFlightSlot<'a> {
    set: &'a Mutex<HashSet<CandidateId>>,
    candidate_id: CandidateId,
}

/// The set holds plain ids, so a panic elsewhere cannot leave it half-updated.
fn lock_set(set: &Mutex<HashSet<CandidateId>>) -> MutexGuard<'_, HashSet<CandidateId>> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        lock_set(self.set).remove(&self.candidate_id);
    }
}

impl<C> StatusSync<C>
where
    C: PortalApi + 'static,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Whether an update for `candidate_id` is currently outstanding; views
    /// use this to disable the candidate's controls.
    pub fn is_in_flight(&self, candidate_id: &CandidateId) -> bool {
        lock_set(&self.in_flight).contains(candidate_id)
    }

    fn claim(&self, candidate_id: &CandidateId) -> Option<InFlightSlot<'_>> {
        let mut guard = lock_set(&self.in_flight);
        if !guard.insert(candidate_id.clone()) {
            return None;
        }
        Some(InFlightSlot {
            set: &self.in_flight,
            candidate_id: candidate_id.clone(),
        })
    }

    /// Send one status change. `on_confirmed` runs once, only after a 2xx
    /// answer the client could read.
    pub async fn update_status<F>(
        &self,
        request: StatusTransitionRequest,
        on_confirmed: F,
    ) -> Result<StatusConfirmation, StatusSyncError>
    where
        F: FnOnce(&StatusConfirmation),
    {
        let StatusTransitionRequest {
            assessment_id,
            candidate_id,
            current,
            requested,
        } = request;

        let assessment_id = match assessment_id {
            Some(id) if !id.is_blank() => id,
            _ => {
                warn!(candidate = %candidate_id, "status update attempted without an assessment id");
                return Err(StatusSyncError::MissingAssessmentContext);
            }
        };
        if candidate_id.is_blank() {
            return Err(StatusSyncError::MissingCandidateId);
        }
        if !current.can_transition_to(requested) {
            return Err(StatusSyncError::IllegalTransition {
                from: current,
                to: requested,
            });
        }

        let _slot = self
            .claim(&candidate_id)
            .ok_or_else(|| StatusSyncError::AlreadyInFlight(candidate_id.clone()))?;

        let response = self
            .client
            .update_candidate_status(&assessment_id, &candidate_id, requested)
            .await
            .map_err(|err| {
                warn!(
                    assessment = %assessment_id,
                    candidate = %candidate_id,
                    error = %err,
                    "status update failed"
                );
                StatusSyncError::from(err)
            })?;

        let confirmation = StatusConfirmation {
            assessment_id,
            candidate_id,
            requested,
            confirmed: response.confirmed_status(),
        };

        if confirmation.diverged() {
            warn!(
                candidate = %confirmation.candidate_id,
                requested = %requested,
                confirmed = ?confirmation.confirmed,
                "server stored a different status than requested"
            );
        }
        info!(
            assessment = %confirmation.assessment_id,
            candidate = %confirmation.candidate_id,
            status = ?confirmation.confirmed,
            "candidate status confirmed"
        );

        on_confirmed(&confirmation);
        Ok(confirmation)
    }
}
