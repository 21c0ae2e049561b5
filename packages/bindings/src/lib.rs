use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use commerce_kpi_core::metrics::status::order_status_distribution as status_distribution;
use commerce_kpi_core::metrics::summary::business_summary as render_summary;
use commerce_kpi_core::metrics::{self, DashboardInput};
use commerce_kpi_core::{OrderHeader, Period};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Deserialize)]
struct StatusRequest {
    orders: Vec<OrderHeader>,
    period: Period,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Full KPI bundle in the standard output envelope.
#[napi]
pub fn compute_metrics(input_json: String) -> NapiResult<String> {
    let input: DashboardInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = metrics::analyze_dashboard(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Plain-text summary of the same request `computeMetrics` accepts.
#[napi]
pub fn business_summary(input_json: String) -> NapiResult<String> {
    let input: DashboardInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = metrics::analyze_dashboard(&input).map_err(to_napi_error)?;
    Ok(render_summary(&output.result))
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[napi]
pub fn order_status_distribution(input_json: String) -> NapiResult<String> {
    let input: StatusRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let shares = status_distribution(&input.orders, &input.period).map_err(to_napi_error)?;
    serde_json::to_string(&shares).map_err(to_napi_error)
}
