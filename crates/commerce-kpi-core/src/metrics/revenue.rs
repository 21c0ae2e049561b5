use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::metrics::{add_money, mean, pct_change, safe_div, sum_money};
use crate::types::{Money, Pct, SalesRecord};
use crate::KpiResult;

/// Revenue for one calendar month of a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    /// 1-12
    pub month: u32,
    pub revenue: Money,
    pub orders: usize,
    /// Change against the previous month with sales. None for the first
    /// month of the series or when the previous month had zero revenue.
    pub growth_pct: Option<Pct>,
}

/// Sum of line-item prices.
pub fn total_revenue(records: &[&SalesRecord]) -> KpiResult<Money> {
    sum_money(records.iter().map(|r| r.price))
}

/// Number of distinct order ids.
pub fn distinct_orders(records: &[&SalesRecord]) -> usize {
    records
        .iter()
        .map(|r| r.order_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Total revenue / distinct orders. None when there are no orders.
pub fn average_order_value(records: &[&SalesRecord]) -> KpiResult<Option<Money>> {
    Ok(safe_div(
        total_revenue(records)?,
        Decimal::from(distinct_orders(records) as u64),
    ))
}

/// Revenue per month present in `records`, ascending, with month-over-month
/// growth against the preceding month in the series.
pub fn monthly_revenue(records: &[&SalesRecord]) -> KpiResult<Vec<MonthlyRevenue>> {
    let mut by_month: BTreeMap<u32, (Money, HashSet<&str>)> = BTreeMap::new();
    for r in records {
        let entry = by_month
            .entry(r.month())
            .or_insert_with(|| (Decimal::ZERO, HashSet::new()));
        entry.0 = add_money(entry.0, r.price)?;
        entry.1.insert(r.order_id.as_str());
    }

    let mut series = Vec::with_capacity(by_month.len());
    let mut previous: Option<Money> = None;
    for (month, (revenue, orders)) in by_month {
        let growth_pct = previous.and_then(|prev| pct_change(revenue, prev));
        series.push(MonthlyRevenue {
            month,
            revenue,
            orders: orders.len(),
            growth_pct,
        });
        previous = Some(revenue);
    }
    Ok(series)
}

/// Mean of the defined month-over-month growth rates.
///
/// The first month has no baseline and is left out rather than counted
/// as zero growth.
pub fn average_monthly_growth(series: &[MonthlyRevenue]) -> Option<Pct> {
    mean(series.iter().filter_map(|m| m.growth_pct))
}
