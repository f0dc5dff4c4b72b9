//! Coursecraft command line
//!
//! Drives the content lifecycle engine against a local SQLite course store:
//! - **Wizard**: load resumable state, save steps, auto-save single fields
//! - **Curriculum**: child mutations read as JSON from a file or stdin
//! - **Publication**: toggle, approve and archive
//! - **Deletion**: eligibility-checked cascading removal
//!
//! Engine operations print one JSON envelope on stdout and exit non-zero
//! when the envelope reports a rejection or refusal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coursecraft_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

use cli::context::CliContext;

#[derive(Parser, Debug)]
#[command(name = "coursecraft", about = "Course authoring lifecycle engine", version)]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Course store path (default: <home>/coursecraft.db)
    #[arg(long, global = true, env = "COURSECRAFT_DB")]
    db: Option<PathBuf>,

    /// Lifecycle thresholds file (default: <home>/config.toml)
    #[arg(long, global = true, env = "COURSECRAFT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    // === Wizard ===
    /// Show the wizard state of a course (or of a new one)
    Wizard(cli::wizard::WizardArgs),

    /// Submit one wizard step
    #[command(name = "save-step")]
    SaveStep(cli::wizard::SaveStepArgs),

    /// Persist a single field without validation
    #[command(name = "auto-save")]
    AutoSave(cli::wizard::AutoSaveArgs),

    // === Curriculum ===
    /// Add, edit, delete or reorder a module, lesson, question, resource or drip rule
    Mutate(cli::content::MutateArgs),

    /// Delete a course, module or lesson with everything it owns
    Delete(cli::content::DeleteArgs),

    // === Publication ===
    /// Flip the published state of a course or module
    Toggle(cli::content::ToggleArgs),

    /// Approve a course awaiting review
    Approve(cli::content::ApproveArgs),

    /// Archive a course
    Archive(cli::content::ArchiveArgs),

    // === Catalog ===
    /// List an instructor's courses
    Courses(cli::catalog::CoursesArgs),

    /// Manage course categories
    Category {
        #[command(subcommand)]
        action: cli::catalog::CategoryAction,
    },

    /// Show resolved paths and effective thresholds
    Config(cli::config::ConfigArgs),
}

/// Run a command; `Ok(false)` means it completed but reported failure.
fn run_command(cli: Cli, ctx: CliContext) -> Result<bool> {
    let command = match cli.command {
        Commands::Config(args) => return cli::config::run(&ctx, args).map(|()| true),
        other => other,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async move {
        match command {
            Commands::Wizard(args) => cli::wizard::run_wizard(&ctx, args).await,
            Commands::SaveStep(args) => cli::wizard::run_save_step(&ctx, args).await,
            Commands::AutoSave(args) => cli::wizard::run_auto_save(&ctx, args).await,
            Commands::Mutate(args) => cli::content::run_mutate(&ctx, args).await,
            Commands::Delete(args) => cli::content::run_delete(&ctx, args).await,
            Commands::Toggle(args) => cli::content::run_toggle(&ctx, args).await,
            Commands::Approve(args) => cli::content::run_approve(&ctx, args).await,
            Commands::Archive(args) => cli::content::run_archive(&ctx, args).await,
            Commands::Courses(args) => cli::catalog::run_courses(&ctx, args).await,
            Commands::Category { action } => cli::catalog::run_category(&ctx, action).await,
            Commands::Config(_) => Ok(true),
        }
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let ctx = CliContext::resolve(cli.db.clone(), cli.config.clone());

    let _log_guard = match init_logging(LogConfig {
        app_name: "coursecraft",
        verbose: cli.verbose,
        log_dir: Some(ctx.logs_dir()),
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: failed to initialize logging: {:#}", err);
            None
        }
    };

    match run_command(cli, ctx) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            match err.downcast_ref::<cli::HelpfulError>() {
                Some(helpful) => eprint!("{}", helpful),
                None => eprintln!("{:?}", err),
            }
            ExitCode::from(2)
        }
    }
}
