use clap::Args;
use serde_json::Value;

use commerce_kpi_core::metrics::{self, DashboardInput};

use crate::input;

/// Arguments for computing KPIs from a JSON request
#[derive(Args)]
pub struct MetricsArgs {
    /// Path to JSON input file (records, current_period, comparison_period, options)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: DashboardInput = input::read_request(args.input.as_deref(), "KPI computation")?;
    let result = metrics::analyze_dashboard(&request)?;
    Ok(serde_json::to_value(result)?)
}
