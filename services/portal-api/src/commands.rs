use crate::cli::LoginArgs;
use crate::infra::{load_rows, parse_manifest, parse_status};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vendor_portal::config::AppConfig;
use vendor_portal::error::AppError;
use vendor_portal::portal::candidates::{
    AssessmentId, CandidateBoard, CandidateId, CandidateIntake, CandidateRow, CandidateStatus,
    IntakeError, RowProgress, StatusSync,
};
use vendor_portal::portal::client::{HttpPortalClient, PortalApi};
use vendor_portal::portal::storage::HttpResumeStorage;
use vendor_portal::telemetry;

#[derive(Args, Debug)]
pub(crate) struct ShowAssessmentArgs {
    /// Assessment identifier
    #[arg(long)]
    pub(crate) id: String,
    #[command(flatten)]
    pub(crate) login: LoginArgs,
}

#[derive(Args, Debug)]
pub(crate) struct UpdateStatusArgs {
    /// Assessment identifier
    #[arg(long)]
    pub(crate) assessment: String,
    /// Candidate UUID
    #[arg(long)]
    pub(crate) candidate: String,
    /// Requested status (invited, interview, shortlisted, rejected)
    #[arg(long, value_parser = parse_status)]
    pub(crate) status: CandidateStatus,
    #[command(flatten)]
    pub(crate) login: LoginArgs,
}

#[derive(Args, Debug)]
pub(crate) struct AddCandidatesArgs {
    /// Assessment identifier
    #[arg(long)]
    pub(crate) assessment: String,
    /// CSV manifest with `name,email,phone,resume` columns
    #[arg(long)]
    pub(crate) manifest: PathBuf,
    #[command(flatten)]
    pub(crate) login: LoginArgs,
}

async fn connect(login: &LoginArgs) -> Result<(AppConfig, Arc<HttpPortalClient>), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let client = Arc::new(HttpPortalClient::new(&config.portal)?);
    let session = client.login(&login.email, &login.password).await?;
    info!(vendor = %session.vendor.company_name, "signed in");
    Ok((config, client))
}

async fn load_board(
    client: &HttpPortalClient,
    assessment_id: &AssessmentId,
) -> Result<CandidateBoard, AppError> {
    let detail = client.assessment(assessment_id).await?;
    Ok(CandidateBoard::from_detail(detail))
}

pub(crate) async fn run_show_assessment(args: ShowAssessmentArgs) -> Result<(), AppError> {
    let (_, client) = connect(&args.login).await?;
    let board = load_board(&client, &AssessmentId::new(args.id)).await?;
    render_board(&board);
    Ok(())
}

pub(crate) async fn run_update_status(args: UpdateStatusArgs) -> Result<(), AppError> {
    let (_, client) = connect(&args.login).await?;
    let assessment_id = AssessmentId::new(args.assessment);
    let candidate_id = CandidateId::new(args.candidate);
    let mut board = load_board(&client, &assessment_id).await?;

    let request = board.transition_request(&candidate_id, args.status)?;
    let sync = StatusSync::new(client.clone());

    let outcome = sync
        .update_status(request, |confirmation| {
            board.apply_confirmation(confirmation);
        })
        .await;

    match outcome {
        Ok(confirmation) => {
            if confirmation.confirmed.is_none() {
                board = load_board(&client, &assessment_id).await?;
            }
            if let Some(row) = board
                .rows()
                .into_iter()
                .find(|row| row.candidate_uuid == candidate_id)
            {
                println!("Status updated");
                println!("{}", render_row(&row));
            }
            Ok(())
        }
        Err(err) if err.requires_refresh() => {
            warn!(error = %err, "status response unreadable, reloading assessment");
            let board = load_board(&client, &assessment_id).await?;
            render_board(&board);
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) async fn run_add_candidates(args: AddCandidatesArgs) -> Result<(), AppError> {
    let manifest = tokio::fs::read(&args.manifest).await?;
    let rows = parse_manifest(manifest.as_slice()).map_err(std::io::Error::from)?;
    let base_dir = args
        .manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let inputs = load_rows(rows, &base_dir)
        .await
        .map_err(std::io::Error::from)?;

    let (config, client) = connect(&args.login).await?;
    let storage = Arc::new(HttpResumeStorage::new(&config.portal)?);
    let assessment_id = AssessmentId::new(args.assessment);
    let mut board = load_board(&client, &assessment_id).await?;

    if inputs.len() > board.remaining_slots() {
        warn!(
            submitted = inputs.len(),
            remaining = board.remaining_slots(),
            "manifest exceeds the remaining candidate slots"
        );
    }

    let intake = CandidateIntake::new(client.clone(), storage);
    let result = intake
        .submit(Some(&assessment_id), &inputs, |update: RowProgress| {
            debug!(row = update.row, percent = update.progress.percent(), "uploading resume");
            if update.progress.bytes_transferred == update.progress.total_bytes {
                println!("Candidate {}: resume uploaded", update.row);
            }
        })
        .await;

    match result {
        Ok(created) => {
            board.merge_added(created);
            render_board(&board);
            Ok(())
        }
        Err(IntakeError::Rejected(rejected)) => {
            println!("Please fix the following before submitting:");
            for row in &rejected.rows {
                println!("- {row}");
            }
            Err(IntakeError::Rejected(rejected).into())
        }
        Err(err) => {
            if !err.created().is_empty() {
                println!("Added before the failure:");
                for candidate in err.created() {
                    println!("- {} <{}>", candidate.name, candidate.email);
                }
            }
            Err(err.into())
        }
    }
}

fn render_board(board: &CandidateBoard) {
    let assessment = board.assessment();
    println!("{} ({})", assessment.title, assessment.assessment_id);
    println!(
        "Candidates: {}/{} added, {} slots open",
        board.added_count(),
        board.required_count(),
        board.remaining_slots()
    );
    for row in board.rows() {
        println!("{}", render_row(&row));
    }
}

fn render_row(row: &CandidateRow) -> String {
    let steps: Vec<String> = row
        .step_labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            if index as u8 <= row.progress_index {
                format!("[{label}]")
            } else {
                label.to_string()
            }
        })
        .collect();
    format!(
        "  {} {} <{}> {} | {} | {}",
        row.initial,
        row.name,
        row.email,
        row.status,
        steps.join(" > "),
        row.candidate_uuid
    )
}
