// wfrun
// Command line front end for validating, ordering, running and testing workflows

mod commands;
mod output;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use commands::{order, run, summary, test, validate};

#[derive(Parser, Debug)]
#[command(name = "wfrun", version, about = "Preview workflow graphs from the command line")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a workflow graph for structural problems
    Validate(validate::ValidateArgs),
    /// Print the resolved execution order
    Order(order::OrderArgs),
    /// Print node and edge counts
    Summary(summary::SummaryArgs),
    /// Run a preview session
    Run(run::RunArgs),
    /// Run a workflow test suite
    Test(test::TestArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate(args) => validate::execute(args),
        Commands::Order(args) => order::execute(args),
        Commands::Summary(args) => summary::execute(args),
        Commands::Run(args) => run::execute(args).await,
        Commands::Test(args) => test::execute(args).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "wfrun=debug,workflow_service=debug,warn"
    } else {
        "wfrun=info,workflow_service=info,warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
