use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::metrics::{add_money, pct_change, safe_div, sum_money};
use crate::types::{Money, Pct, SalesRecord};
use crate::KpiResult;

/// Revenue for one segment (product category or customer state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentPerformance {
    pub name: String,
    pub revenue: Money,
    /// Line items sold in the segment
    pub items: usize,
    pub avg_item_price: Option<Money>,
    /// Segment revenue / total revenue, in points
    pub share_pct: Option<Pct>,
    pub comparison_revenue: Money,
    pub revenue_change_pct: Option<Pct>,
}

/// Which record field a breakdown groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Category,
    State,
}

impl Segment {
    fn key<'a>(&self, record: &'a SalesRecord) -> &'a str {
        match self {
            Segment::Category => record.category.as_str(),
            Segment::State => record.state.as_str(),
        }
    }
}

/// Group current-period revenue by segment, with the matching
/// comparison-period revenue per segment.
///
/// Rows are ordered by revenue descending, ties by name ascending. Only
/// segments with current-period sales are listed, so the rows partition
/// current total revenue exactly.
pub fn segment_performance(
    current: &[&SalesRecord],
    comparison: &[&SalesRecord],
    segment: Segment,
) -> KpiResult<Vec<SegmentPerformance>> {
    let mut groups: BTreeMap<&str, (Money, usize)> = BTreeMap::new();
    for r in current {
        let entry = groups.entry(segment.key(r)).or_insert((Decimal::ZERO, 0));
        entry.0 = add_money(entry.0, r.price)?;
        entry.1 += 1;
    }

    let mut prior: BTreeMap<&str, Money> = BTreeMap::new();
    for r in comparison {
        let entry = prior.entry(segment.key(r)).or_insert(Decimal::ZERO);
        *entry = add_money(*entry, r.price)?;
    }

    let total = sum_money(groups.values().map(|(rev, _)| *rev))?;

    let mut rows: Vec<SegmentPerformance> = groups
        .into_iter()
        .map(|(name, (revenue, items))| {
            let comparison_revenue = prior.get(name).copied().unwrap_or(Decimal::ZERO);
            SegmentPerformance {
                name: name.to_string(),
                revenue,
                items,
                avg_item_price: safe_div(revenue, Decimal::from(items as u64)),
                share_pct: safe_div(revenue, total).and_then(|s| s.checked_mul(dec!(100))),
                comparison_revenue,
                revenue_change_pct: pct_change(revenue, comparison_revenue),
            }
        })
        .collect();

    rank_by_revenue(&mut rows);
    Ok(rows)
}

/// Revenue descending, then name ascending.
pub fn rank_by_revenue(rows: &mut [SegmentPerformance]) {
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
}

/// The first `n` rows of an already ranked breakdown.
pub fn top_n(rows: &[SegmentPerformance], n: usize) -> Vec<SegmentPerformance> {
    rows.iter().take(n).cloned().collect()
}
