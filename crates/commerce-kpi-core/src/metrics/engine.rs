use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::KpiError;
use crate::metrics::breakdown::{segment_performance, top_n, Segment, SegmentPerformance};
use crate::metrics::revenue::{
    average_monthly_growth, average_order_value, distinct_orders, monthly_revenue, total_revenue,
    MonthlyRevenue,
};
use crate::metrics::satisfaction::{
    average_delivery_days, average_review_score, order_experiences, satisfaction_by_delivery,
    DeliveryBucketSatisfaction,
};
use crate::metrics::KpiDelta;
use crate::period::{validate_pair, Period};
use crate::types::{with_metadata, ComputationOutput, SalesRecord};
use crate::KpiResult;

pub const DEFAULT_TOP_N: usize = 10;

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

/// Tunables for a KPI computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsOptions {
    /// Number of categories kept in `top_categories`
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        MetricsOptions {
            top_n: DEFAULT_TOP_N,
        }
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Every dashboard KPI for a (current, comparison) period pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiBundle {
    pub current_period: Period,
    pub comparison_period: Period,
    /// Delivered line items in each period
    pub current_records: usize,
    pub comparison_records: usize,

    pub total_revenue: KpiDelta,
    /// Mean month-over-month growth, in points
    pub monthly_growth_pct: KpiDelta,
    pub average_order_value: KpiDelta,
    pub total_orders: KpiDelta,
    pub average_review_score: KpiDelta,
    pub average_delivery_days: KpiDelta,

    pub revenue_by_month: Vec<MonthlyRevenue>,
    pub comparison_revenue_by_month: Vec<MonthlyRevenue>,
    /// Every category, ranked; sums to current total revenue
    pub revenue_by_category: Vec<SegmentPerformance>,
    pub top_categories: Vec<SegmentPerformance>,
    /// Every customer state, ranked
    pub revenue_by_state: Vec<SegmentPerformance>,
    pub satisfaction_by_delivery: Vec<DeliveryBucketSatisfaction>,

    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Function 1: compute_metrics
// ---------------------------------------------------------------------------

/// Compute the full KPI bundle for `current_period` against
/// `comparison_period`.
///
/// Only delivered line items are aggregated. Records outside both periods
/// are ignored. An empty current period is not an error: the bundle comes
/// back with zero totals, undefined ratios and a warning.
pub fn compute_metrics(
    records: &[SalesRecord],
    current_period: &Period,
    comparison_period: &Period,
    options: &MetricsOptions,
) -> KpiResult<KpiBundle> {
    let (current_period, comparison_period) = validate_pair(current_period, comparison_period)?;

    if options.top_n == 0 {
        return Err(KpiError::InvalidInput {
            field: "top_n".to_string(),
            reason: "Top category count must be at least 1".to_string(),
        });
    }

    let mut warnings: Vec<String> = Vec::new();

    // --- Partition by period, delivered only ---
    let mut current: Vec<&SalesRecord> = Vec::new();
    let mut comparison: Vec<&SalesRecord> = Vec::new();
    let mut not_delivered = 0usize;

    for r in records {
        let in_current = current_period.contains(&r.purchased_at);
        let in_comparison = !in_current && comparison_period.contains(&r.purchased_at);
        if !in_current && !in_comparison {
            continue;
        }
        if !r.status.is_delivered() {
            not_delivered += 1;
            continue;
        }
        if in_current {
            current.push(r);
        } else {
            comparison.push(r);
        }
    }

    debug!(
        current = %current_period,
        comparison = %comparison_period,
        current_records = current.len(),
        comparison_records = comparison.len(),
        not_delivered,
        "partitioned sales records"
    );

    if not_delivered > 0 {
        warnings.push(format!(
            "{not_delivered} line items without delivered status were excluded"
        ));
    }
    if current.is_empty() {
        warnings.push(format!(
            "No delivered sales in current period {current_period}; KPIs are zero or undefined"
        ));
    }
    if comparison.is_empty() {
        warnings.push(format!(
            "No delivered sales in comparison period {comparison_period}; percentage changes are undefined"
        ));
    }

    // --- Revenue and orders ---
    let revenue_by_month = monthly_revenue(&current)?;
    let comparison_revenue_by_month = monthly_revenue(&comparison)?;

    let total_revenue_kpi =
        KpiDelta::from_values(total_revenue(&current)?, total_revenue(&comparison)?);
    let monthly_growth_pct = KpiDelta::new(
        average_monthly_growth(&revenue_by_month),
        average_monthly_growth(&comparison_revenue_by_month),
    );
    let average_order_value_kpi =
        KpiDelta::new(average_order_value(&current)?, average_order_value(&comparison)?);
    let total_orders = KpiDelta::from_values(
        Decimal::from(distinct_orders(&current) as u64),
        Decimal::from(distinct_orders(&comparison) as u64),
    );

    // --- Breakdowns ---
    let revenue_by_category = segment_performance(&current, &comparison, Segment::Category)?;
    let top_categories = top_n(&revenue_by_category, options.top_n);
    let revenue_by_state = segment_performance(&current, &comparison, Segment::State)?;

    // --- Customer experience ---
    let current_orders = order_experiences(&current);
    let comparison_orders = order_experiences(&comparison);
    let average_review_score_kpi = KpiDelta::new(
        average_review_score(&current_orders),
        average_review_score(&comparison_orders),
    );
    let average_delivery_days_kpi = KpiDelta::new(
        average_delivery_days(&current_orders),
        average_delivery_days(&comparison_orders),
    );
    let satisfaction = satisfaction_by_delivery(&current_orders, &comparison_orders);

    if !current.is_empty() && average_review_score_kpi.current.is_none() {
        warnings.push("No reviewed orders in current period".to_string());
    }

    Ok(KpiBundle {
        current_records: current.len(),
        comparison_records: comparison.len(),
        current_period,
        comparison_period,
        total_revenue: total_revenue_kpi,
        monthly_growth_pct,
        average_order_value: average_order_value_kpi,
        total_orders,
        average_review_score: average_review_score_kpi,
        average_delivery_days: average_delivery_days_kpi,
        revenue_by_month,
        comparison_revenue_by_month,
        revenue_by_category,
        top_categories,
        revenue_by_state,
        satisfaction_by_delivery: satisfaction,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Function 2: analyze_dashboard
// ---------------------------------------------------------------------------

/// Self-contained request for a dashboard computation, as read from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardInput {
    pub records: Vec<SalesRecord>,
    pub current_period: Period,
    /// Defaults to the same months one year earlier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_period: Option<Period>,
    #[serde(default)]
    pub options: MetricsOptions,
}

/// Validate a dashboard request, compute its KPI bundle and wrap it in the
/// standard output envelope.
pub fn analyze_dashboard(input: &DashboardInput) -> KpiResult<ComputationOutput<KpiBundle>> {
    let start = Instant::now();

    if let Some(bad) = input
        .records
        .iter()
        .find(|r| r.review_score.is_some_and(|s| !(1..=5).contains(&s)))
    {
        return Err(KpiError::InvalidInput {
            field: "review_score".to_string(),
            reason: format!(
                "Review score must be between 1 and 5 (order {} has {:?})",
                bad.order_id, bad.review_score
            ),
        });
    }

    let comparison_period = match &input.comparison_period {
        Some(period) => period.clone(),
        None => input.current_period.previous_year()?,
    };

    let bundle = compute_metrics(
        &input.records,
        &input.current_period,
        &comparison_period,
        &input.options,
    )?;
    let warnings = bundle.warnings.clone();

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "E-commerce KPI Dashboard with Year-over-Year Comparison",
        &serde_json::json!({
            "current_period": bundle.current_period.label(),
            "comparison_period": bundle.comparison_period.label(),
            "records": input.records.len(),
            "top_n": input.options.top_n,
            "revenue_basis": "sum of delivered line-item prices, excluding freight",
        }),
        warnings,
        elapsed,
        bundle,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderStatus;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use rust_decimal_macros::dec;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(11, 0, 0)
            .unwrap()
    }

    fn rec(order: &str, y: i32, m: u32, price: Decimal) -> SalesRecord {
        SalesRecord {
            order_id: order.to_string(),
            status: OrderStatus::Delivered,
            purchased_at: ts(y, m, 5),
            delivered_at: Some(ts(y, m, 5) + Duration::days(4)),
            product_id: format!("p-{order}"),
            category: "electronics".to_string(),
            price,
            freight_value: None,
            state: "SP".to_string(),
            review_score: Some(4),
        }
    }

    fn y2023() -> Period {
        Period::year(2023)
    }

    fn y2022() -> Period {
        Period::year(2022)
    }

    #[test]
    fn test_two_month_scenario() {
        let records = vec![rec("o1", 2023, 1, dec!(100)), rec("o2", 2023, 2, dec!(200))];
        let b = compute_metrics(&records, &y2023(), &y2022(), &MetricsOptions::default()).unwrap();
        assert_eq!(b.total_revenue.current, Some(dec!(300)));
        assert_eq!(b.total_revenue.pct_change, None);
        // only February has a baseline
        assert_eq!(b.monthly_growth_pct.current, Some(dec!(100)));
        assert_eq!(b.average_order_value.current, Some(dec!(150)));
        assert_eq!(b.total_orders.current, Some(dec!(2)));
    }

    #[test]
    fn test_empty_current_period_is_zeroed_not_error() {
        let records = vec![rec("o1", 2022, 3, dec!(80))];
        let b = compute_metrics(&records, &y2023(), &y2022(), &MetricsOptions::default()).unwrap();
        assert_eq!(b.total_revenue.current, Some(dec!(0)));
        assert_eq!(b.total_revenue.pct_change, Some(dec!(-100)));
        assert_eq!(b.average_order_value.current, None);
        assert_eq!(b.average_review_score.current, None);
        assert_eq!(b.current_records, 0);
        assert!(b.warnings.iter().any(|w| w.contains("No delivered sales in current")));
    }

    #[test]
    fn test_non_delivered_excluded() {
        let mut canceled = rec("o2", 2023, 1, dec!(999));
        canceled.status = OrderStatus::Canceled;
        let records = vec![rec("o1", 2023, 1, dec!(10)), canceled];
        let b = compute_metrics(&records, &y2023(), &y2022(), &MetricsOptions::default()).unwrap();
        assert_eq!(b.total_revenue.current, Some(dec!(10)));
        assert_eq!(b.total_orders.current, Some(dec!(1)));
        assert!(b.warnings.iter().any(|w| w.starts_with("1 line items")));
    }

    #[test]
    fn test_yoy_deltas() {
        let records = vec![
            rec("a", 2023, 1, dec!(150)),
            rec("b", 2022, 1, dec!(100)),
            rec("c", 2021, 1, dec!(1000)),
        ];
        let b = compute_metrics(&records, &y2023(), &y2022(), &MetricsOptions::default()).unwrap();
        assert_eq!(b.total_revenue.comparison, Some(dec!(100)));
        assert_eq!(b.total_revenue.absolute_change, Some(dec!(50)));
        assert_eq!(b.total_revenue.pct_change, Some(dec!(50)));
        assert_eq!(b.total_orders.pct_change, Some(dec!(0)));
    }

    #[test]
    fn test_overlapping_periods_rejected() {
        let err = compute_metrics(&[], &y2023(), &y2023(), &MetricsOptions::default()).unwrap_err();
        assert!(matches!(err, KpiError::InvalidPeriod { .. }));
    }

    #[test]
    fn test_zero_top_n_rejected() {
        let err = compute_metrics(&[], &y2023(), &y2022(), &MetricsOptions { top_n: 0 }).unwrap_err();
        assert!(matches!(err, KpiError::InvalidInput { .. }));
    }

    #[test]
    fn test_analyze_dashboard_defaults_to_previous_year() {
        let input = DashboardInput {
            records: vec![rec("a", 2023, 5, dec!(10)), rec("b", 2022, 5, dec!(5))],
            current_period: Period::months(2023, &[5]).unwrap(),
            comparison_period: None,
            options: MetricsOptions::default(),
        };
        let out = analyze_dashboard(&input).unwrap();
        assert_eq!(out.result.comparison_period, Period::months(2022, &[5]).unwrap());
        assert_eq!(out.result.total_revenue.pct_change, Some(dec!(100)));
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }

    #[test]
    fn test_analyze_dashboard_rejects_bad_review_score() {
        let mut r = rec("a", 2023, 5, dec!(10));
        r.review_score = Some(9);
        let input = DashboardInput {
            records: vec![r],
            current_period: y2023(),
            comparison_period: None,
            options: MetricsOptions::default(),
        };
        match analyze_dashboard(&input).unwrap_err() {
            KpiError::InvalidInput { field, .. } => assert_eq!(field, "review_score"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_analyze_dashboard_out_of_range_year_is_invalid_period() {
        let input = DashboardInput {
            records: vec![],
            current_period: Period::year(i32::MIN),
            comparison_period: None,
            options: MetricsOptions::default(),
        };
        assert!(matches!(
            analyze_dashboard(&input).unwrap_err(),
            KpiError::InvalidPeriod { .. }
        ));
    }

    #[test]
    fn test_tiny_baseline_gives_undefined_change() {
        let records = vec![
            rec("a", 2023, 1, dec!(1000000)),
            rec("b", 2022, 1, Decimal::new(1, 22)),
        ];
        let b = compute_metrics(&records, &y2023(), &y2022(), &MetricsOptions::default()).unwrap();
        assert_eq!(b.total_revenue.current, Some(dec!(1000000)));
        assert_eq!(b.total_revenue.pct_change, None);
        assert_eq!(b.revenue_by_category[0].revenue_change_pct, None);
    }

    #[test]
    fn test_revenue_overflow_is_invalid_input() {
        let records = vec![
            rec("a", 2023, 1, Decimal::MAX),
            rec("b", 2023, 2, Decimal::MAX),
        ];
        match compute_metrics(&records, &y2023(), &y2022(), &MetricsOptions::default()) {
            Err(KpiError::InvalidInput { field, .. }) => assert_eq!(field, "price"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }
}
