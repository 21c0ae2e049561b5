use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::KpiError;
use crate::KpiResult;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 9999;

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A calendar year, optionally narrowed to a set of months.
///
/// An empty `months` list means the whole year. Periods built through the
/// constructors are validated and normalised (months sorted, deduplicated),
/// so two periods selecting the same months compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub months: Vec<u32>,
}

impl Period {
    /// The whole of `year`. Call `validate` before use if the year is untrusted.
    pub fn year(year: i32) -> Self {
        Period {
            year,
            months: Vec::new(),
        }
    }

    pub fn months(year: i32, months: &[u32]) -> KpiResult<Self> {
        Period {
            year,
            months: months.to_vec(),
        }
        .validate()
    }

    /// Calendar quarter 1-4 of `year`.
    pub fn quarter(year: i32, quarter: u32) -> KpiResult<Self> {
        if !(1..=4).contains(&quarter) {
            return Err(KpiError::InvalidPeriod {
                field: "quarter".to_string(),
                reason: format!("Quarter must be between 1 and 4, got {quarter}"),
            });
        }
        let first = (quarter - 1) * 3 + 1;
        Period::months(year, &[first, first + 1, first + 2])
    }

    /// Check year/month bounds and return the normalised period.
    pub fn validate(&self) -> KpiResult<Period> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&self.year) {
            return Err(KpiError::InvalidPeriod {
                field: "year".to_string(),
                reason: format!(
                    "Year must be between {MIN_YEAR} and {MAX_YEAR}, got {}",
                    self.year
                ),
            });
        }
        if let Some(bad) = self.months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(KpiError::InvalidPeriod {
                field: "months".to_string(),
                reason: format!("Month must be between 1 and 12, got {bad}"),
            });
        }

        let mut months = self.months.clone();
        months.sort_unstable();
        months.dedup();
        // all twelve selected is the same period as the whole year
        if months.len() == 12 {
            months.clear();
        }
        Ok(Period {
            year: self.year,
            months,
        })
    }

    pub fn includes_month(&self, month: u32) -> bool {
        self.months.is_empty() || self.months.contains(&month)
    }

    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        ts.year() == self.year && self.includes_month(ts.month())
    }

    pub fn overlaps(&self, other: &Period) -> bool {
        if self.year != other.year {
            return false;
        }
        (1..=12).any(|m| self.includes_month(m) && other.includes_month(m))
    }

    /// The same months one year earlier: the default YoY comparison.
    /// Both this period and the derived one must be in range.
    pub fn previous_year(&self) -> KpiResult<Period> {
        let current = self.validate()?;
        Period {
            year: current.year - 1,
            months: current.months,
        }
        .validate()
    }

    pub fn label(&self) -> String {
        if self.months.is_empty() {
            return self.year.to_string();
        }
        let names: Vec<&str> = self
            .months
            .iter()
            .filter_map(|m| MONTH_ABBR.get((*m as usize).wrapping_sub(1)).copied())
            .collect();
        format!("{} ({})", self.year, names.join(", "))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Validate both periods of a comparison and reject overlapping pairs.
pub fn validate_pair(current: &Period, comparison: &Period) -> KpiResult<(Period, Period)> {
    let current = current.validate()?;
    let comparison = comparison.validate()?;
    if current.overlaps(&comparison) {
        return Err(KpiError::InvalidPeriod {
            field: "comparison_period".to_string(),
            reason: format!("Comparison period {comparison} overlaps current period {current}"),
        });
    }
    Ok((current, comparison))
}
