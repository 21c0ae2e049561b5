use clap::Args;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use commerce_kpi_core::loader::{self, Dataset, LoaderConfig};
use commerce_kpi_core::metrics::status::order_status_distribution;
use commerce_kpi_core::metrics::summary::business_summary;
use commerce_kpi_core::metrics::{compute_metrics, KpiBundle, MetricsOptions};
use commerce_kpi_core::{with_metadata, Period};

use crate::config::AppConfig;

/// Which extract to read and which periods to compare
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Directory holding the CSV extract
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Analysis year (defaults to the most recent year in the data)
    #[arg(long)]
    pub year: Option<i32>,

    /// Comparison year (defaults to the year before the analysis year)
    #[arg(long)]
    pub comparison_year: Option<i32>,

    /// Restrict both periods to these months, e.g. --months 1,2,3
    #[arg(long, value_delimiter = ',', conflicts_with = "quarter")]
    pub months: Vec<u32>,

    /// Restrict both periods to a calendar quarter (1-4)
    #[arg(long)]
    pub quarter: Option<u32>,

    /// Number of categories in the top-categories list
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Keep canceled orders in the loaded extract
    #[arg(long)]
    pub include_canceled: bool,
}

/// Arguments for dataset inspection
#[derive(Args)]
pub struct InspectArgs {
    /// Directory holding the CSV extract
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

fn loader_config(
    data_dir: Option<&PathBuf>,
    include_canceled: bool,
    config: &AppConfig,
) -> LoaderConfig {
    let mut loader = config.loader.clone();
    if let Some(dir) = data_dir {
        loader.data_dir = dir.clone();
    }
    loader.include_canceled |= include_canceled;
    loader
}

/// Resolve the current and comparison periods from flags, config file and
/// the years present in the data, in that order of precedence.
pub fn select_periods(
    args: &SelectionArgs,
    config: &AppConfig,
    available_years: &[i32],
) -> Result<(Period, Period), Box<dyn std::error::Error>> {
    let year = args
        .year
        .or(config.year)
        .or_else(|| available_years.first().copied())
        .ok_or("--year is required: the extract has no dated sales")?;
    let current = match args.quarter {
        Some(q) => Period::quarter(year, q)?,
        None => Period::months(year, &args.months)?,
    };
    let comparison = match args.comparison_year.or(config.comparison_year) {
        Some(comparison_year) => Period {
            year: comparison_year,
            months: current.months.clone(),
        }
        .validate()?,
        None => current.previous_year()?,
    };
    Ok((current, comparison))
}

fn load(loader: &LoaderConfig) -> Result<Dataset, Box<dyn std::error::Error>> {
    let dataset = loader::load_dataset(loader)?;
    info!(
        records = dataset.sales.len(),
        data_dir = %loader.data_dir.display(),
        "extract loaded"
    );
    Ok(dataset)
}

fn build_bundle(
    args: &SelectionArgs,
    config: &AppConfig,
) -> Result<(KpiBundle, Vec<String>, usize), Box<dyn std::error::Error>> {
    let loader = loader_config(args.data_dir.as_ref(), args.include_canceled, config);
    let dataset = load(&loader)?;
    let (current, comparison) = select_periods(args, config, &dataset.summary.years)?;

    let mut options: MetricsOptions = config.metrics.clone();
    if let Some(n) = args.top_n {
        options.top_n = n;
    }

    let bundle = compute_metrics(&dataset.sales, &current, &comparison, &options)?;
    let mut warnings = dataset.warnings;
    warnings.extend(bundle.warnings.iter().cloned());
    Ok((bundle, warnings, dataset.sales.len()))
}

pub fn run_dashboard(
    args: SelectionArgs,
    config: &AppConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let (bundle, warnings, records) = build_bundle(&args, config)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let output = with_metadata(
        "E-commerce KPI Dashboard with Year-over-Year Comparison",
        &serde_json::json!({
            "current_period": bundle.current_period.label(),
            "comparison_period": bundle.comparison_period.label(),
            "records_loaded": records,
            "revenue_basis": "sum of delivered line-item prices, excluding freight",
        }),
        warnings,
        elapsed,
        bundle,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_summary(
    args: SelectionArgs,
    config: &AppConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let (bundle, _, _) = build_bundle(&args, config)?;
    Ok(business_summary(&bundle))
}

pub fn run_status(
    args: SelectionArgs,
    config: &AppConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let loader = loader_config(args.data_dir.as_ref(), args.include_canceled, config);
    let dataset = load(&loader)?;
    let (current, _) = select_periods(&args, config, &dataset.summary.years)?;
    let statuses = order_status_distribution(&dataset.orders, &current)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let output = with_metadata(
        "Order Status Distribution",
        &serde_json::json!({
            "period": current.label(),
            "orders_loaded": dataset.orders.len(),
        }),
        dataset.warnings,
        elapsed,
        serde_json::json!({
            "period": current.label(),
            "statuses": statuses,
        }),
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_inspect(args: InspectArgs, config: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let loader = loader_config(args.data_dir.as_ref(), false, config);
    let dataset = load(&loader)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let output = with_metadata(
        "Dataset Shape and Quality Summary",
        &serde_json::json!({
            "data_dir": loader.data_dir.display().to_string(),
            "status_filter": loader.status_filter.as_ref().map(|s| s.to_string()),
        }),
        dataset.warnings,
        elapsed,
        dataset.summary,
    );
    Ok(serde_json::to_value(output)?)
}
