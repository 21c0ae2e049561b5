use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::metrics::mean;
use crate::types::SalesRecord;

/// Upper bound (inclusive) of the fast delivery bucket, in days.
pub const FAST_MAX_DAYS: i64 = 3;
/// Upper bound (inclusive) of the standard delivery bucket, in days.
pub const STANDARD_MAX_DAYS: i64 = 7;

/// Delivery-time ranges used to slice review scores.
///
/// `[0,3]`, `[4,7]` and `[8,∞)` days. Durations below zero (delivery
/// stamped before purchase) land in the first bucket, so every duration
/// maps to exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryBucket {
    Fast,
    Standard,
    Slow,
}

impl DeliveryBucket {
    pub const ALL: [DeliveryBucket; 3] = [
        DeliveryBucket::Fast,
        DeliveryBucket::Standard,
        DeliveryBucket::Slow,
    ];

    pub fn for_days(days: i64) -> Self {
        if days <= FAST_MAX_DAYS {
            DeliveryBucket::Fast
        } else if days <= STANDARD_MAX_DAYS {
            DeliveryBucket::Standard
        } else {
            DeliveryBucket::Slow
        }
    }

    pub fn min_days(&self) -> i64 {
        match self {
            DeliveryBucket::Fast => 0,
            DeliveryBucket::Standard => FAST_MAX_DAYS + 1,
            DeliveryBucket::Slow => STANDARD_MAX_DAYS + 1,
        }
    }

    pub fn max_days(&self) -> Option<i64> {
        match self {
            DeliveryBucket::Fast => Some(FAST_MAX_DAYS),
            DeliveryBucket::Standard => Some(STANDARD_MAX_DAYS),
            DeliveryBucket::Slow => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeliveryBucket::Fast => "0-3 days",
            DeliveryBucket::Standard => "4-7 days",
            DeliveryBucket::Slow => "8+ days",
        }
    }
}

impl fmt::Display for DeliveryBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Delivery and review outcome of a single order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderExperience<'a> {
    pub order_id: &'a str,
    pub delivery_days: Option<i64>,
    pub review_score: Option<u8>,
}

/// Collapse line items to one observation per order (first line wins).
pub fn order_experiences<'a>(records: &[&'a SalesRecord]) -> Vec<OrderExperience<'a>> {
    let mut orders: BTreeMap<&'a str, OrderExperience<'a>> = BTreeMap::new();
    for r in records.iter().copied() {
        orders
            .entry(r.order_id.as_str())
            .or_insert_with(|| OrderExperience {
                order_id: r.order_id.as_str(),
                delivery_days: r.delivery_days(),
                review_score: r.review_score,
            });
    }
    orders.into_values().collect()
}

pub fn average_review_score(orders: &[OrderExperience<'_>]) -> Option<Decimal> {
    mean(orders.iter().filter_map(|o| o.review_score).map(Decimal::from))
}

/// Mean delivery time over every delivered order, reviewed or not.
pub fn average_delivery_days(orders: &[OrderExperience<'_>]) -> Option<Decimal> {
    mean(orders.iter().filter_map(|o| o.delivery_days).map(Decimal::from))
}

/// Review score for one delivery bucket, current vs comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryBucketSatisfaction {
    pub bucket: DeliveryBucket,
    pub label: String,
    pub min_days: i64,
    pub max_days: Option<i64>,
    /// Delivered orders falling in the bucket
    pub orders: usize,
    pub avg_review_score: Option<Decimal>,
    pub comparison_orders: usize,
    pub comparison_avg_review_score: Option<Decimal>,
    /// avg_review_score - comparison_avg_review_score
    pub review_score_change: Option<Decimal>,
}

fn bucket_stats(orders: &[OrderExperience<'_>]) -> BTreeMap<DeliveryBucket, (usize, Vec<Decimal>)> {
    let mut stats: BTreeMap<DeliveryBucket, (usize, Vec<Decimal>)> = BTreeMap::new();
    for o in orders {
        let Some(days) = o.delivery_days else {
            continue;
        };
        let entry = stats.entry(DeliveryBucket::for_days(days)).or_default();
        entry.0 += 1;
        if let Some(score) = o.review_score {
            entry.1.push(Decimal::from(score));
        }
    }
    stats
}

/// Average review score per delivery bucket. All three buckets are
/// always present, in fixed order, even when empty.
pub fn satisfaction_by_delivery(
    current: &[OrderExperience<'_>],
    comparison: &[OrderExperience<'_>],
) -> Vec<DeliveryBucketSatisfaction> {
    let mut cur = bucket_stats(current);
    let mut prev = bucket_stats(comparison);

    DeliveryBucket::ALL
        .iter()
        .map(|bucket| {
            let (orders, scores) = cur.remove(bucket).unwrap_or_default();
            let (comparison_orders, prev_scores) = prev.remove(bucket).unwrap_or_default();
            let avg_review_score = mean(scores);
            let comparison_avg_review_score = mean(prev_scores);
            let review_score_change = match (avg_review_score, comparison_avg_review_score) {
                (Some(c), Some(p)) => Some(c - p),
                _ => None,
            };
            DeliveryBucketSatisfaction {
                bucket: *bucket,
                label: bucket.label().to_string(),
                min_days: bucket.min_days(),
                max_days: bucket.max_days(),
                orders,
                avg_review_score,
                comparison_orders,
                comparison_avg_review_score,
                review_score_change,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderStatus;
    use chrono::{Duration, NaiveDate};
    use rust_decimal_macros::dec;

    fn rec(order: &str, days: Option<i64>, score: Option<u8>) -> SalesRecord {
        let purchased_at = NaiveDate::from_ymd_opt(2023, 2, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        SalesRecord {
            order_id: order.to_string(),
            status: OrderStatus::Delivered,
            purchased_at,
            delivered_at: days.map(|d| purchased_at + Duration::days(d)),
            product_id: "p".to_string(),
            category: "c".to_string(),
            price: dec!(1),
            freight_value: None,
            state: "SP".to_string(),
            review_score: score,
        }
    }

    #[test]
    fn test_bucket_boundaries_inclusive() {
        assert_eq!(DeliveryBucket::for_days(0), DeliveryBucket::Fast);
        assert_eq!(DeliveryBucket::for_days(3), DeliveryBucket::Fast);
        assert_eq!(DeliveryBucket::for_days(4), DeliveryBucket::Standard);
        assert_eq!(DeliveryBucket::for_days(7), DeliveryBucket::Standard);
        assert_eq!(DeliveryBucket::for_days(8), DeliveryBucket::Slow);
        assert_eq!(DeliveryBucket::for_days(400), DeliveryBucket::Slow);
    }

    #[test]
    fn test_buckets_disjoint_and_exhaustive() {
        for days in -30i64..=60 {
            let hits = DeliveryBucket::ALL
                .iter()
                .filter(|b| {
                    let lower_ok = days >= b.min_days() || **b == DeliveryBucket::Fast;
                    let upper_ok = b.max_days().map_or(true, |max| days <= max);
                    lower_ok && upper_ok
                })
                .count();
            assert_eq!(hits, 1, "{days} days matched {hits} buckets");
            let b = DeliveryBucket::for_days(days);
            assert!(b.max_days().map_or(true, |max| days <= max));
        }
    }

    #[test]
    fn test_order_level_dedup() {
        let rows = vec![
            rec("a", Some(2), Some(5)),
            rec("a", Some(2), Some(5)),
            rec("b", Some(10), Some(1)),
        ];
        let refs: Vec<&SalesRecord> = rows.iter().collect();
        let orders = order_experiences(&refs);
        assert_eq!(orders.len(), 2);
        assert_eq!(average_review_score(&orders), Some(dec!(3)));
        assert_eq!(average_delivery_days(&orders), Some(dec!(6)));
    }

    #[test]
    fn test_satisfaction_by_delivery_all_buckets_present() {
        let rows = vec![
            rec("a", Some(1), Some(5)),
            rec("b", Some(2), Some(4)),
            rec("c", Some(12), Some(2)),
            rec("d", None, Some(3)),
        ];
        let refs: Vec<&SalesRecord> = rows.iter().collect();
        let orders = order_experiences(&refs);
        let out = satisfaction_by_delivery(&orders, &[]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].orders, 2);
        assert_eq!(out[0].avg_review_score, Some(dec!(4.5)));
        assert_eq!(out[1].orders, 0);
        assert_eq!(out[1].avg_review_score, None);
        assert_eq!(out[2].avg_review_score, Some(dec!(2)));
        assert_eq!(out[2].review_score_change, None);
    }

    #[test]
    fn test_unreviewed_orders_count_but_do_not_score() {
        let rows = vec![rec("a", Some(5), None), rec("b", Some(6), Some(4))];
        let refs: Vec<&SalesRecord> = rows.iter().collect();
        let out = satisfaction_by_delivery(&order_experiences(&refs), &[]);
        assert_eq!(out[1].orders, 2);
        assert_eq!(out[1].avg_review_score, Some(dec!(4)));
    }

    #[test]
    fn test_delivery_average_includes_unreviewed_orders() {
        let rows = vec![rec("a", Some(2), Some(5)), rec("b", Some(10), None)];
        let refs: Vec<&SalesRecord> = rows.iter().collect();
        let orders = order_experiences(&refs);
        assert_eq!(average_delivery_days(&orders), Some(dec!(6)));
        assert_eq!(average_review_score(&orders), Some(dec!(5)));
    }
}
