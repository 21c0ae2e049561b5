use chrono::{Datelike, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentages expressed in points (12.5 = 12.5%), as shown on dashboard cards.
pub type Pct = Decimal;

/// Lifecycle status of an order as it appears in the orders extract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Delivered,
    Shipped,
    Canceled,
    Unavailable,
    Invoiced,
    Processing,
    Created,
    Approved,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Delivered => "delivered",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Unavailable => "unavailable",
            OrderStatus::Invoiced => "invoiced",
            OrderStatus::Processing => "processing",
            OrderStatus::Created => "created",
            OrderStatus::Approved => "approved",
            OrderStatus::Other(s) => s.as_str(),
        }
    }

    /// Only delivered orders count towards revenue.
    pub fn is_delivered(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }
}

impl From<&str> for OrderStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "delivered" => OrderStatus::Delivered,
            "shipped" => OrderStatus::Shipped,
            // both spellings occur in real extracts
            "canceled" | "cancelled" => OrderStatus::Canceled,
            "unavailable" => OrderStatus::Unavailable,
            "invoiced" => OrderStatus::Invoiced,
            "processing" => OrderStatus::Processing,
            "created" => OrderStatus::Created,
            "approved" => OrderStatus::Approved,
            other => OrderStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        OrderStatus::from(s.as_str())
    }
}

impl From<OrderStatus> for String {
    fn from(s: OrderStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line item of an order, denormalised with its order, product,
/// customer and review context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub order_id: String,
    pub status: OrderStatus,
    pub purchased_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub product_id: String,
    pub category: String,
    /// Item price, excluding freight
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freight_value: Option<Money>,
    /// Customer state code, e.g. "SP"
    pub state: String,
    /// Review score 1-5, when the order was reviewed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_score: Option<u8>,
}

impl SalesRecord {
    pub fn year(&self) -> i32 {
        self.purchased_at.year()
    }

    pub fn month(&self) -> u32 {
        self.purchased_at.month()
    }

    /// Whole days from purchase to delivery, floored. None when undelivered.
    pub fn delivery_days(&self) -> Option<i64> {
        self.delivered_at
            .map(|d| (d - self.purchased_at).num_seconds().div_euclid(86_400))
    }
}

/// One row per order, used for status mix regardless of line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHeader {
    pub order_id: String,
    pub status: OrderStatus,
    pub purchased_at: NaiveDateTime,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn record() -> SalesRecord {
        SalesRecord {
            order_id: "o1".to_string(),
            status: OrderStatus::Delivered,
            purchased_at: ts(2023, 3, 1, 18),
            delivered_at: Some(ts(2023, 3, 5, 9)),
            product_id: "p1".to_string(),
            category: "toys".to_string(),
            price: dec!(10),
            freight_value: None,
            state: "SP".to_string(),
            review_score: Some(5),
        }
    }

    #[test]
    fn test_delivery_days_floors_partial_days() {
        // 3 days 15 hours
        assert_eq!(record().delivery_days(), Some(3));
    }

    #[test]
    fn test_delivery_days_none_when_undelivered() {
        let mut r = record();
        r.delivered_at = None;
        assert_eq!(r.delivery_days(), None);
    }

    #[test]
    fn test_delivery_days_negative_floors_down() {
        let mut r = record();
        r.delivered_at = Some(ts(2023, 3, 1, 6));
        assert_eq!(r.delivery_days(), Some(-1));
    }

    #[test]
    fn test_status_parsing_accepts_both_cancel_spellings() {
        assert_eq!(OrderStatus::from("cancelled"), OrderStatus::Canceled);
        assert_eq!(OrderStatus::from(" Canceled "), OrderStatus::Canceled);
        assert_eq!(
            OrderStatus::from("returned"),
            OrderStatus::Other("returned".to_string())
        );
    }

    #[test]
    fn test_status_serializes_as_plain_string() {
        let json = serde_json::to_string(&OrderStatus::Delivered).unwrap();
        assert_eq!(json, "\"delivered\"");
        let back: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(back, OrderStatus::Shipped);
    }
}
