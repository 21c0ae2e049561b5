use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::metrics::safe_div;
use crate::period::Period;
use crate::types::{OrderHeader, OrderStatus, Pct};
use crate::KpiResult;

/// Share of orders in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusShare {
    pub status: OrderStatus,
    pub orders: usize,
    pub share_pct: Pct,
}

/// Distribution of order statuses among orders purchased in `period`,
/// largest first, ties by status name.
pub fn order_status_distribution(
    orders: &[OrderHeader],
    period: &Period,
) -> KpiResult<Vec<StatusShare>> {
    let period = period.validate()?;

    let mut counts: BTreeMap<&OrderStatus, usize> = BTreeMap::new();
    let mut total = 0usize;
    for o in orders.iter().filter(|o| period.contains(&o.purchased_at)) {
        *counts.entry(&o.status).or_insert(0) += 1;
        total += 1;
    }

    let total_dec = Decimal::from(total as u64);
    let mut shares: Vec<StatusShare> = counts
        .into_iter()
        .map(|(status, n)| StatusShare {
            status: status.clone(),
            orders: n,
            share_pct: safe_div(Decimal::from(n as u64), total_dec).unwrap_or_default()
                * dec!(100),
        })
        .collect();

    shares.sort_by(|a, b| {
        b.orders
            .cmp(&a.orders)
            .then_with(|| a.status.as_str().cmp(b.status.as_str()))
    });
    Ok(shares)
}
