use crate::demo::{run_capacity, run_demo, run_sweep, CapacityArgs, DemoArgs, SweepArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use minder_compliance::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Childminder Compliance",
    about = "Run DBS compliance sweeps and registration checks for childminder records",
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
    /// Run one compliance sweep over a roster CSV export and print the summary
    Sweep(SweepArgs),
    /// Check proposed child numbers against the adult ratios
    Capacity(CapacityArgs),
    /// Walk through a sample household, sweep, and registration form checks
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
        Command::Sweep(args) => run_sweep(args),
        Command::Capacity(args) => run_capacity(args),
        Command::Demo(args) => run_demo(args),
    }
}
