//! prepost — split a question catalog into balanced pre/post test sets.

mod commands;

use clap::{Parser, Subcommand};
use prepost_core::error::ValidationError;

/// Exit codes: 0 satisfied, 1 unexpected error, 2 validation failure,
/// 3 constraints unsatisfiable within the search budget.
const EXIT_ERROR: i32 = 1;
const EXIT_INVALID: i32 = 2;

#[derive(Parser)]
#[command(
    name = "prepost",
    version,
    about = "Partition a question catalog into balanced pre/post assessment sets"
)]
struct Cli {
    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the partition engine over a catalog.
    Assign(commands::assign::AssignArgs),
    /// Check a catalog and constraint file without running the engine.
    Validate(commands::validate::ValidateArgs),
    /// Summarize a catalog's concepts, subparts, and answer keys.
    Inspect(commands::inspect::InspectArgs),
    /// Write a starter constraint file.
    Init(commands::init::InitArgs),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Assign(args) => commands::assign::run(args),
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Init(args) => commands::init::run(args),
    };

    let code = match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            if err
                .chain()
                .any(|cause| cause.downcast_ref::<ValidationError>().is_some())
            {
                EXIT_INVALID
            } else {
                EXIT_ERROR
            }
        }
    };
    std::process::exit(code);
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "prepost=info,prepost_core=info,prepost_report=info",
        1 => "prepost=debug,prepost_core=debug,prepost_report=debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
