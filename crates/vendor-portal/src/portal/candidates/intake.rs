use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{info, warn};

use super::domain::{AssessmentId, Candidate, NewCandidate};
use crate::error::FailureKind;
use crate::portal::client::{ApiError, PortalApi};
use crate::portal::storage::{
    resume_object_path, ProgressSink, ResumeFile, ResumeStorage, StorageError, UploadProgress,
};

pub const MIN_RESUME_BYTES: u64 = 50 * 1024;
pub const MAX_RESUME_BYTES: u64 = 2 * 1024 * 1024;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern compiles"))
}

/// Basic `local@domain.tld` shape check.
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(&email.trim().to_lowercase())
}

/// Human-readable size with two decimals (`50.00 KB`, `2.00 MB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["B", "KB", "MB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// One row of the add-candidates form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateRowInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume: Option<ResumeFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowField {
    Name,
    Email,
    Resume,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: RowField,
    pub message: String,
}

impl FieldError {
    fn new(field: RowField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors for one row; `row` is 1-based as shown to the vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowErrors {
    pub row: usize,
    pub errors: Vec<FieldError>,
}

impl RowErrors {
    pub fn message_for(&self, field: RowField) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }
}

impl fmt::Display for RowErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "Candidate {}: {}", self.row, messages.join(", "))
    }
}

/// Size check run when a file is picked, before the whole row is validated.
pub fn check_resume_size(size: u64) -> Result<(), String> {
    if size < MIN_RESUME_BYTES {
        return Err(format!(
            "File too small. Minimum is {}",
            format_bytes(MIN_RESUME_BYTES)
        ));
    }
    if size > MAX_RESUME_BYTES {
        return Err(format!(
            "File too large. Maximum allowed is {}",
            format_bytes(MAX_RESUME_BYTES)
        ));
    }
    Ok(())
}

pub fn validate_row(row: &CandidateRowInput) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if row.name.trim().is_empty() {
        errors.push(FieldError::new(RowField::Name, "Name is required"));
    }

    if row.email.trim().is_empty() {
        errors.push(FieldError::new(RowField::Email, "Email is required"));
    } else if !is_valid_email(&row.email) {
        errors.push(FieldError::new(RowField::Email, "Enter a valid email"));
    }

    match &row.resume {
        None => errors.push(FieldError::new(RowField::Resume, "Resume is required")),
        Some(file) => {
            if let Err(message) = check_resume_size(file.size()) {
                errors.push(FieldError::new(RowField::Resume, message));
            }
        }
    }

    errors
}

/// Every failing row of a batch, reported together.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", summarize(.rows))]
pub struct IntakeRejected {
    pub rows: Vec<RowErrors>,
}

fn summarize(rows: &[RowErrors]) -> String {
    rows.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn validate_batch(rows: &[CandidateRowInput]) -> Result<(), IntakeRejected> {
    let failures: Vec<RowErrors> = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let errors = validate_row(row);
            (!errors.is_empty()).then_some(RowErrors {
                row: index + 1,
                errors,
            })
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(IntakeRejected { rows: failures })
    }
}

/// Why a validated row failed during submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowFailure {
    #[error(transparent)]
    Upload(#[from] StorageError),
    #[error(transparent)]
    Create(#[from] ApiError),
}

impl RowFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            RowFailure::Upload(err) => err.kind(),
            RowFailure::Create(err) => err.kind(),
        }
    }
}

/// Submission stopped at `row`; `created` holds the candidates of the rows
/// before it, which stay created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("candidate {row} could not be added: {source}")]
pub struct BatchHalted {
    pub row: usize,
    pub created: Vec<Candidate>,
    #[source]
    pub source: RowFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("missing assessment context; candidates not submitted")]
    MissingAssessmentContext,
    #[error("{0}")]
    Rejected(#[from] IntakeRejected),
    #[error(transparent)]
    Halted(#[from] BatchHalted),
}

impl IntakeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            IntakeError::MissingAssessmentContext => FailureKind::Configuration,
            IntakeError::Rejected(_) => FailureKind::Validation,
            IntakeError::Halted(halted) => halted.source.kind(),
        }
    }

    /// Candidates created before the failure, if any.
    pub fn created(&self) -> &[Candidate] {
        match self {
            IntakeError::Halted(halted) => &halted.created,
            _ => &[],
        }
    }
}

/// Upload progress for one row (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowProgress {
    pub row: usize,
    pub progress: UploadProgress,
}

/// Validates a batch of candidate rows and submits them one at a time.
pub struct CandidateIntake<C, S> {
    client: Arc<C>,
    storage: Arc<S>,
}

impl<C, S> CandidateIntake<C, S>
where
    C: PortalApi + 'static,
    S: ResumeStorage + 'static,
{
    pub fn new(client: Arc<C>, storage: Arc<S>) -> Self {
        Self { client, storage }
    }

    /// Validate every row, then for each row in order upload the resume and
    /// create the candidate. Row N+1 starts only after row N finished.
    pub async fn submit<P>(
        &self,
        assessment_id: Option<&AssessmentId>,
        rows: &[CandidateRowInput],
        on_progress: P,
    ) -> Result<Vec<Candidate>, IntakeError>
    where
        P: Fn(RowProgress) + Send + Sync + 'static,
    {
        let assessment_id = match assessment_id {
            Some(id) if !id.is_blank() => id,
            _ => return Err(IntakeError::MissingAssessmentContext),
        };

        validate_batch(rows)?;

        let on_progress = Arc::new(on_progress);
        let mut created = Vec::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            let row_number = index + 1;
            match self
                .submit_row(assessment_id, row_number, row, on_progress.clone())
                .await
            {
                Ok(candidate) => created.push(candidate),
                Err(source) => {
                    warn!(
                        assessment = %assessment_id,
                        row = row_number,
                        submitted = created.len(),
                        error = %source,
                        "candidate intake halted"
                    );
                    return Err(IntakeError::Halted(BatchHalted {
                        row: row_number,
                        created,
                        source,
                    }));
                }
            }
        }

        info!(assessment = %assessment_id, count = created.len(), "candidates added");
        Ok(created)
    }

    async fn submit_row<P>(
        &self,
        assessment_id: &AssessmentId,
        row_number: usize,
        row: &CandidateRowInput,
        on_progress: Arc<P>,
    ) -> Result<Candidate, RowFailure>
    where
        P: Fn(RowProgress) + Send + Sync + 'static,
    {
        let resume_url = match &row.resume {
            Some(file) => {
                let path = resume_object_path(assessment_id, &file.file_name);
                let sink: ProgressSink = Arc::new(move |progress: UploadProgress| {
                    (*on_progress)(RowProgress {
                        row: row_number,
                        progress,
                    })
                });
                Some(self.storage.upload(&path, file, sink).await?)
            }
            None => None,
        };

        let payload = NewCandidate {
            name: row.name.trim().to_string(),
            email: row.email.trim().to_string(),
            phone: row
                .phone
                .as_ref()
                .map(|phone| phone.trim().to_string())
                .filter(|phone| !phone.is_empty()),
            resume_url,
        };

        let response = self.client.add_candidate(assessment_id, &payload).await?;
        response.created().ok_or_else(|| {
            RowFailure::Create(ApiError::MalformedResponse(
                "add-candidate response carried no candidate".to_string(),
            ))
        })
    }
}
