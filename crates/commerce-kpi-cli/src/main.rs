mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::dashboard::{InspectArgs, SelectionArgs};
use commands::metrics::MetricsArgs;
use config::AppConfig;

/// Year-over-year KPI dashboard for e-commerce sales extracts
#[derive(Parser)]
#[command(
    name = "kpi",
    version,
    about = "Year-over-year KPI dashboard for e-commerce sales extracts",
    long_about = "Loads an orders/items/products/customers/reviews CSV extract and computes \
                  revenue, growth, order value, category and state breakdowns and \
                  delivery-versus-satisfaction KPIs for a period against a comparison period."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Settings file (.json, .yaml or .yml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full KPI bundle for a period against its comparison period
    Dashboard(SelectionArgs),
    /// Compute KPIs from JSON records (--input file or stdin)
    Metrics(MetricsArgs),
    /// Plain-text business summary with trends and insights
    Summary(SelectionArgs),
    /// Order status distribution for a period
    Status(SelectionArgs),
    /// Row counts, date range and data-quality checks for an extract
    Inspect(InspectArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fail(e: Box<dyn std::error::Error>) -> ! {
    eprintln!("{}: {}", "error".red().bold(), e);
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => fail(e),
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Dashboard(args) => commands::dashboard::run_dashboard(args, &config),
        Commands::Metrics(args) => commands::metrics::run_metrics(args),
        Commands::Status(args) => commands::dashboard::run_status(args, &config),
        Commands::Inspect(args) => commands::dashboard::run_inspect(args, &config),
        Commands::Summary(args) => match commands::dashboard::run_summary(args, &config) {
            Ok(text) => {
                println!("{text}");
                return;
            }
            Err(e) => Err(e),
        },
        Commands::Version => {
            println!("kpi {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => fail(e),
    }
}
