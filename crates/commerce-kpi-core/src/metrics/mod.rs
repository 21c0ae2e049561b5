pub mod breakdown;
pub mod cache;
pub mod engine;
pub mod revenue;
pub mod satisfaction;
pub mod status;
pub mod summary;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::KpiError;
use crate::types::{Money, Pct};
use crate::KpiResult;

pub use cache::MetricsCache;
pub use engine::{analyze_dashboard, compute_metrics, DashboardInput, KpiBundle, MetricsOptions};

/// A KPI value for the current period next to the comparison period.
///
/// Every field is optional: an empty period has no average, and a zero
/// comparison value has no percentage change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiDelta {
    pub current: Option<Decimal>,
    pub comparison: Option<Decimal>,
    /// current - comparison
    pub absolute_change: Option<Decimal>,
    /// (current - comparison) / comparison * 100
    pub pct_change: Option<Pct>,
}

impl KpiDelta {
    pub fn new(current: Option<Decimal>, comparison: Option<Decimal>) -> Self {
        let (absolute_change, pct_change) = match (current, comparison) {
            (Some(c), Some(p)) => (c.checked_sub(p), pct_change(c, p)),
            _ => (None, None),
        };
        KpiDelta {
            current,
            comparison,
            absolute_change,
            pct_change,
        }
    }

    pub fn from_values(current: Decimal, comparison: Decimal) -> Self {
        KpiDelta::new(Some(current), Some(comparison))
    }
}

/// Percentage change in points. None when the baseline is zero or the
/// change is outside the decimal range.
pub fn pct_change(current: Decimal, comparison: Decimal) -> Option<Pct> {
    current
        .checked_sub(comparison)
        .and_then(|diff| safe_div(diff, comparison))
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
}

/// Division that yields None instead of failing on a zero denominator or
/// an out-of-range quotient.
pub(crate) fn safe_div(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    numerator.checked_div(denominator)
}

/// Sum of money amounts, failing with `InvalidInput` if it leaves the
/// decimal range.
pub(crate) fn sum_money<I>(amounts: I) -> KpiResult<Money>
where
    I: IntoIterator<Item = Money>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, add_money)
}

pub(crate) fn add_money(total: Money, amount: Money) -> KpiResult<Money> {
    total.checked_add(amount).ok_or_else(|| KpiError::InvalidInput {
        field: "price".to_string(),
        reason: format!("Revenue total overflows the decimal range adding {amount} to {total}"),
    })
}

/// Arithmetic mean, None for an empty sequence or an out-of-range sum.
pub(crate) fn mean<I>(values: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    let (sum, count) = values
        .into_iter()
        .try_fold((Decimal::ZERO, 0u64), |(s, n), v| Some((s.checked_add(v)?, n + 1)))?;
    safe_div(sum, Decimal::from(count))
}
