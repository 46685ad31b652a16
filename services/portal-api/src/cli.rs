use crate::commands::{
    run_add_candidates, run_show_assessment, run_update_status, AddCandidatesArgs,
    ShowAssessmentArgs, UpdateStatusArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use vendor_portal::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Vendor Portal",
    about = "Run the vendor portal backend or manage assessment candidates from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect assessments
    Assessment {
        #[command(subcommand)]
        command: AssessmentCommand,
    },
    /// Manage candidates linked to an assessment
    Candidate {
        #[command(subcommand)]
        command: CandidateCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AssessmentCommand {
    /// Print an assessment and its candidate board
    Show(ShowAssessmentArgs),
}

#[derive(Subcommand, Debug)]
enum CandidateCommand {
    /// Move a candidate to the next lifecycle status
    Status(UpdateStatusArgs),
    /// Validate and add the candidates listed in a CSV manifest
    Add(AddCandidatesArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

/// Vendor credentials used by the client subcommands.
#[derive(Args, Debug, Clone)]
pub(crate) struct LoginArgs {
    /// Vendor account email
    #[arg(long, env = "PORTAL_VENDOR_EMAIL")]
    pub(crate) email: String,
    /// Vendor account password
    #[arg(long, env = "PORTAL_VENDOR_PASSWORD", hide_env_values = true)]
    pub(crate) password: String,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Assessment {
            command: AssessmentCommand::Show(args),
        } => run_show_assessment(args).await,
        Command::Candidate {
            command: CandidateCommand::Status(args),
        } => run_update_status(args).await,
        Command::Candidate {
            command: CandidateCommand::Add(args),
        } => run_add_candidates(args).await,
    }
}
