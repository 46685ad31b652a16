use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use vendor_portal::portal::candidates::{CandidateRowInput, CandidateStatus};
use vendor_portal::portal::storage::ResumeFile;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) resumes: InMemoryResumeStore,
    /// Public base URL that uploaded resumes are served from.
    pub(crate) storage_base_url: String,
}

/// Development stand-in for object storage, keyed by object path.
#[derive(Default, Clone)]
pub(crate) struct InMemoryResumeStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryResumeStore {
    pub(crate) fn put(&self, path: &str, bytes: Vec<u8>) {
        let mut guard = self.objects.lock().expect("resume store mutex poisoned");
        guard.insert(path.to_string(), bytes);
    }

    pub(crate) fn get(&self, path: &str) -> Option<Vec<u8>> {
        let guard = self.objects.lock().expect("resume store mutex poisoned");
        guard.get(path).cloned()
    }
}

/// Object paths must live under `resumes/` and may not climb out of it.
pub(crate) fn is_valid_object_path(path: &str) -> bool {
    path.starts_with("resumes/")
        && path
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

pub(crate) fn parse_status(raw: &str) -> Result<CandidateStatus, String> {
    CandidateStatus::parse(raw).map_err(|err| err.to_string())
}

/// One line of a candidate manifest CSV (`name,email,phone,resume`).
#[derive(Debug, Deserialize)]
pub(crate) struct ManifestRow {
    pub(crate) name: String,
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) phone: Option<String>,
    /// Resume path, relative to the manifest file.
    #[serde(default)]
    pub(crate) resume: Option<String>,
}

#[derive(Debug)]
pub(crate) enum ManifestError {
    Csv(csv::Error),
    Resume { path: PathBuf, source: std::io::Error },
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestError::Csv(err) => write!(f, "invalid manifest: {err}"),
            ManifestError::Resume { path, source } => {
                write!(f, "failed to read resume {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ManifestError {}

impl From<ManifestError> for std::io::Error {
    fn from(value: ManifestError) -> Self {
        match value {
            ManifestError::Csv(err) => err.into(),
            ManifestError::Resume { path, source } => std::io::Error::new(
                source.kind(),
                format!("failed to read resume {}: {source}", path.display()),
            ),
        }
    }
}

/// Parse manifest rows without touching the filesystem.
pub(crate) fn parse_manifest<R: std::io::Read>(
    reader: R,
) -> Result<Vec<ManifestRow>, ManifestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    reader
        .deserialize()
        .collect::<Result<Vec<ManifestRow>, csv::Error>>()
        .map_err(ManifestError::Csv)
}

/// Turn manifest rows into form rows, loading each resume from disk. Rows
/// without a resume stay empty so validation can report them.
pub(crate) async fn load_rows(
    rows: Vec<ManifestRow>,
    base_dir: &Path,
) -> Result<Vec<CandidateRowInput>, ManifestError> {
    let mut inputs = Vec::with_capacity(rows.len());
    for row in rows {
        let resume = match row.resume.filter(|path| !path.is_empty()) {
            Some(relative) => {
                let path = base_dir.join(&relative);
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|source| ManifestError::Resume {
                        path: path.clone(),
                        source,
                    })?;
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or(relative);
                Some(ResumeFile::new(file_name, bytes))
            }
            None => None,
        };
        inputs.push(CandidateRowInput {
            name: row.name,
            email: row.email,
            phone: row.phone,
            resume,
        });
    }
    Ok(inputs)
}
