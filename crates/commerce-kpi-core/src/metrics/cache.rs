use std::collections::HashMap;
use tracing::debug;

use crate::metrics::engine::{compute_metrics, KpiBundle, MetricsOptions};
use crate::period::Period;
use crate::types::SalesRecord;
use crate::KpiResult;

/// Memoises KPI bundles over an immutable record set, keyed by the
/// normalised (current, comparison) period pair.
///
/// Records never change after loading, so entries are never invalidated.
pub struct MetricsCache<'a> {
    records: &'a [SalesRecord],
    options: MetricsOptions,
    bundles: HashMap<(Period, Period), KpiBundle>,
}

impl<'a> MetricsCache<'a> {
    pub fn new(records: &'a [SalesRecord], options: MetricsOptions) -> Self {
        MetricsCache {
            records,
            options,
            bundles: HashMap::new(),
        }
    }

    pub fn get_or_compute(&mut self, current: &Period, comparison: &Period) -> KpiResult<&KpiBundle> {
        let key = (current.validate()?, comparison.validate()?);
        if self.bundles.contains_key(&key) {
            debug!(current = %key.0, comparison = %key.1, "KPI cache hit");
        } else {
            let bundle = compute_metrics(self.records, &key.0, &key.1, &self.options)?;
            self.bundles.insert(key.clone(), bundle);
        }
        Ok(&self.bundles[&key])
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderStatus;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn records() -> Vec<SalesRecord> {
        vec![SalesRecord {
            order_id: "o1".to_string(),
            status: OrderStatus::Delivered,
            purchased_at: NaiveDate::from_ymd_opt(2023, 4, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            delivered_at: None,
            product_id: "p1".to_string(),
            category: "toys".to_string(),
            price: dec!(42),
            freight_value: None,
            state: "RJ".to_string(),
            review_score: None,
        }]
    }

    #[test]
    fn test_cache_reuses_bundle_for_equivalent_periods() {
        let recs = records();
        let mut cache = MetricsCache::new(&recs, MetricsOptions::default());
        let first = cache
            .get_or_compute(&Period::year(2023), &Period::year(2022))
            .unwrap()
            .clone();
        // same period written with all twelve months
        let all: Vec<u32> = (1..=12).collect();
        let again = cache
            .get_or_compute(
                &Period {
                    year: 2023,
                    months: all,
                },
                &Period::year(2022),
            )
            .unwrap()
            .clone();
        assert_eq!(first, again);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_keys_by_pair() {
        let recs = records();
        let mut cache = MetricsCache::new(&recs, MetricsOptions::default());
        cache
            .get_or_compute(&Period::year(2023), &Period::year(2022))
            .unwrap();
        cache
            .get_or_compute(&Period::year(2023), &Period::year(2021))
            .unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_does_not_store_errors() {
        let recs = records();
        let mut cache = MetricsCache::new(&recs, MetricsOptions::default());
        assert!(cache
            .get_or_compute(&Period::year(2023), &Period::year(2023))
            .is_err());
        assert!(cache.is_empty());
    }
}
