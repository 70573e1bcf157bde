use crate::assess::{print_catalog, run_assessment, AssessArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use maturity_assessment::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Cybersecurity Maturity Assessment",
    about = "Run the maturity self-assessment service or score a questionnaire from the command line",
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
    /// Print the maturity scale and the assessed domains
    Catalog,
    /// Import ratings from CSV, print the summary and write the PDF report
    Assess(AssessArgs),
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

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Catalog => {
            print_catalog();
            Ok(())
        }
        Command::Assess(args) => run_assessment(args),
    }
}
