use crate::demo::{run_demo, run_eligibility, run_validate, DemoArgs, EligibilityArgs, ValidateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use learner_portal::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Learner Portal Enrolment",
    about = "Run the learner portal enrolment service or exercise its rules from the command line",
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
    /// Check whether a learner may start a new application from an exported history CSV
    Eligibility(EligibilityArgs),
    /// Validate a saved application draft (JSON) and print its errors and summary
    Validate(ValidateArgs),
    /// Walk a scripted learner through the application wizard
    Demo(DemoArgs),
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
        Command::Eligibility(args) => run_eligibility(args),
        Command::Validate(args) => run_validate(args),
        Command::Demo(args) => run_demo(args),
    }
}
