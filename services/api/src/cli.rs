use crate::apply::{run_apply, run_fare, ApplyArgs, FareArgs};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use freedom_riders::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Freedom Riders",
    about = "Run the Freedom rider application service or drive it from the command line",
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
    /// Walk a saved application draft through the wizard and submit it
    Apply(ApplyArgs),
    /// Quote a fare between two cities
    Fare(FareArgs),
    /// Walk a sample rider application through every step against an in-memory intake
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
    /// Keep submitted applications in memory instead of posting them to the intake endpoint
    #[arg(long)]
    pub(crate) dry_run: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Apply(args) => run_apply(args).await,
        Command::Fare(args) => run_fare(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
