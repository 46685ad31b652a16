use serde::Serialize;

use super::domain::{Assessment, AssessmentId, Candidate, CandidateId, StatusTransitionRequest};
use super::status::CandidateStatus;
use super::sync::StatusConfirmation;
use crate::portal::client::AssessmentDetail;

/// In-memory candidate collection behind one assessment view.
///
/// Candidates keep server arrival order. The collection is only changed with
/// data the server confirmed: a fresh detail response, created candidates, or
/// a [`StatusConfirmation`].
#[derive(Debug, Clone)]
pub struct CandidateBoard {
    assessment: Assessment,
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("candidate {0} is not on this assessment")]
    UnknownCandidate(CandidateId),
}

/// Render-ready row for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRow {
    pub candidate_uuid: CandidateId,
    pub initial: char,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_path: Option<String>,
    pub status: CandidateStatus,
    pub progress_index: u8,
    pub step_labels: [&'static str; 3],
}

impl CandidateBoard {
    pub fn from_detail(detail: AssessmentDetail) -> Self {
        let AssessmentDetail {
            mut assessment,
            candidates,
        } = detail;
        // The detail view carries candidates next to the assessment, the
        // dashboard inline; whichever is non-empty wins.
        let candidates = if candidates.is_empty() {
            std::mem::take(&mut assessment.candidates)
        } else {
            assessment.candidates.clear();
            candidates
        };
        Self {
            assessment,
            candidates,
        }
    }

    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    pub fn assessment_id(&self) -> &AssessmentId {
        &self.assessment.assessment_id
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn candidate(&self, candidate_id: &CandidateId) -> Option<&Candidate> {
        self.candidates
            .iter()
            .find(|candidate| &candidate.candidate_uuid == candidate_id)
    }

    /// Candidates added so far: the live length of the collection.
    pub fn added_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn required_count(&self) -> u32 {
        self.assessment.required_candidates
    }

    pub fn remaining_slots(&self) -> usize {
        (self.required_count() as usize).saturating_sub(self.added_count())
    }

    /// Build a transition request from the status currently displayed.
    pub fn transition_request(
        &self,
        candidate_id: &CandidateId,
        requested: CandidateStatus,
    ) -> Result<StatusTransitionRequest, BoardError> {
        let candidate = self
            .candidate(candidate_id)
            .ok_or_else(|| BoardError::UnknownCandidate(candidate_id.clone()))?;
        let assessment_id = Some(self.assessment.assessment_id.clone())
            .filter(|id| !id.is_blank());

        Ok(StatusTransitionRequest {
            assessment_id,
            candidate_id: candidate.candidate_uuid.clone(),
            current: candidate.status,
            requested,
        })
    }

    /// Patch a candidate with the status the server reported. Returns whether
    /// anything changed; a bare acknowledgement changes nothing.
    pub fn apply_confirmation(&mut self, confirmation: &StatusConfirmation) -> bool {
        if confirmation.assessment_id != self.assessment.assessment_id {
            return false;
        }
        let Some(status) = confirmation.confirmed else {
            return false;
        };
        match self
            .candidates
            .iter_mut()
            .find(|candidate| candidate.candidate_uuid == confirmation.candidate_id)
        {
            Some(candidate) if candidate.status != status => {
                candidate.status = status;
                true
            }
            _ => false,
        }
    }

    /// Merge candidates the server created. An existing entry with the same
    /// `candidate_uuid` is replaced in place; new ones are appended.
    pub fn merge_added(&mut self, added: impl IntoIterator<Item = Candidate>) {
        for candidate in added {
            match self
                .candidates
                .iter_mut()
                .find(|existing| existing.candidate_uuid == candidate.candidate_uuid)
            {
                Some(existing) => *existing = candidate,
                None => self.candidates.push(candidate),
            }
        }
    }

    /// Replace the collection with an authoritative list.
    pub fn replace_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
    }

    /// Replace both the assessment and the collection from a fresh fetch.
    pub fn refresh(&mut self, detail: AssessmentDetail) {
        *self = Self::from_detail(detail);
    }

    pub fn rows(&self) -> Vec<CandidateRow> {
        self.candidates
            .iter()
            .map(|candidate| CandidateRow {
                candidate_uuid: candidate.candidate_uuid.clone(),
                initial: candidate.initial(),
                name: candidate.name.clone(),
                email: candidate.email.clone(),
                phone: candidate.phone.clone(),
                resume_path: candidate.resume_path.clone(),
                status: candidate.status,
                progress_index: candidate.status.progress_index(),
                step_labels: candidate.status.step_labels(),
            })
            .collect()
    }
}
