use crate::screen::{run_presets, run_screen, PresetsArgs, ScreenArgs};
use crate::server;
use candidate_screening::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Candidate Screening",
    about = "Screen job applicants and run the recruiting dashboard API",
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
    /// Screen a questionnaire CSV export and print the ranked candidates
    Screen(ScreenArgs),
    /// List the screening presets held in the data directory
    Presets(PresetsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Directory holding the JSON collections
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Directory holding spreadsheet CSV exports
    #[arg(long)]
    pub(crate) sheets_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Screen(args) => run_screen(args),
        Command::Presets(args) => run_presets(args),
    }
}
