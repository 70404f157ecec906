use crate::report::{run_client_report, run_portfolio_report, ClientReportArgs, PortfolioReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use paytrack::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "paytrack",
    about = "Serve and inspect client payment dashboards from the command line",
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
    /// Print the portfolio dashboard: totals, distribution and due payments
    Report(PortfolioReportArgs),
    /// Print the financial and trust summary for one client
    Client(ClientReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Directory holding clients.csv, orders.csv and payments.csv
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_portfolio_report(args),
        Command::Client(args) => run_client_report(args),
    }
}
