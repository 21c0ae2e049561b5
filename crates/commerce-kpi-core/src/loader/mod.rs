pub mod table;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::types::{OrderHeader, OrderStatus, SalesRecord};
use crate::KpiResult;
use table::{field, parse_decimal, parse_review_score, parse_timestamp, Table, TableSummary};

/// Category/state used when a product or customer row cannot be joined.
pub const UNKNOWN: &str = "unknown";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// File names of the extract tables, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableFiles {
    pub orders: String,
    pub order_items: String,
    pub products: String,
    pub customers: String,
    pub reviews: String,
}

impl Default for TableFiles {
    fn default() -> Self {
        TableFiles {
            orders: "orders_dataset.csv".to_string(),
            order_items: "order_items_dataset.csv".to_string(),
            products: "products_dataset.csv".to_string(),
            customers: "customers_dataset.csv".to_string(),
            reviews: "order_reviews_dataset.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub data_dir: PathBuf,
    pub files: TableFiles,
    /// Keep only line items whose order has this status. None keeps all.
    pub status_filter: Option<OrderStatus>,
    /// Also keep canceled orders alongside `status_filter`
    pub include_canceled: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            data_dir: PathBuf::from("ecommerce_data"),
            files: TableFiles::default(),
            status_filter: Some(OrderStatus::Delivered),
            include_canceled: false,
        }
    }
}

impl LoaderConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        LoaderConfig {
            data_dir: data_dir.into(),
            ..LoaderConfig::default()
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    fn keeps(&self, status: &OrderStatus) -> bool {
        match &self.status_filter {
            None => true,
            Some(wanted) => {
                wanted == status || (self.include_canceled && *status == OrderStatus::Canceled)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Shape of everything that was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub tables: Vec<TableSummary>,
    pub sales_records: usize,
    pub orders: usize,
    pub years: Vec<i32>,
    pub first_purchase: Option<NaiveDateTime>,
    pub last_purchase: Option<NaiveDateTime>,
}

/// Joined, filtered sales records plus the per-order status table.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub sales: Vec<SalesRecord>,
    pub orders: Vec<OrderHeader>,
    pub summary: DatasetSummary,
    pub warnings: Vec<String>,
}

struct OrderRow {
    status: OrderStatus,
    customer_id: String,
    purchased_at: NaiveDateTime,
    delivered_at: Option<NaiveDateTime>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn load_table(name: &str, path: &Path) -> KpiResult<Table> {
    let t = Table::from_path(name, path)?;
    info!(table = name, rows = t.rows.len(), "loaded table");
    Ok(t)
}

/// Load a lookup table that the join can do without.
fn load_optional(name: &str, path: &Path, warnings: &mut Vec<String>) -> KpiResult<Option<Table>> {
    if !path.exists() {
        warn!(table = name, path = %path.display(), "table not found, skipping");
        warnings.push(format!("{} not found, skipping {name}", path.display()));
        return Ok(None);
    }
    load_table(name, path).map(Some)
}

/// Read every table under `config.data_dir` and join them into sales records.
///
/// Orders and order items are required; products, customers and reviews
/// only enrich the records and are skipped with a warning when absent.
pub fn load_dataset(config: &LoaderConfig) -> KpiResult<Dataset> {
    let mut warnings = Vec::new();

    let orders = load_table("orders", &config.path(&config.files.orders))?;
    let items = load_table("order_items", &config.path(&config.files.order_items))?;
    let products = load_optional("products", &config.path(&config.files.products), &mut warnings)?;
    let customers =
        load_optional("customers", &config.path(&config.files.customers), &mut warnings)?;
    let reviews = load_optional("reviews", &config.path(&config.files.reviews), &mut warnings)?;

    let tables = Tables {
        orders: &orders,
        items: &items,
        products: products.as_ref(),
        customers: customers.as_ref(),
        reviews: reviews.as_ref(),
    };
    let mut dataset = build_dataset(&tables, config)?;
    warnings.append(&mut dataset.warnings);
    dataset.warnings = warnings;
    Ok(dataset)
}

/// Borrowed set of extract tables, for joining tables that did not come
/// from disk.
pub struct Tables<'a> {
    pub orders: &'a Table,
    pub items: &'a Table,
    pub products: Option<&'a Table>,
    pub customers: Option<&'a Table>,
    pub reviews: Option<&'a Table>,
}

/// Join already-read tables into a dataset.
pub fn build_dataset(tables: &Tables<'_>, config: &LoaderConfig) -> KpiResult<Dataset> {
    let mut warnings = Vec::new();

    let (order_rows, headers) = index_orders(tables.orders, &mut warnings)?;
    let categories = match tables.products {
        Some(t) => lookup(t, "product_id", "product_category_name")?,
        None => HashMap::new(),
    };
    let states = match tables.customers {
        Some(t) => lookup(t, "customer_id", "customer_state")?,
        None => HashMap::new(),
    };
    let scores = match tables.reviews {
        Some(t) => index_reviews(t)?,
        None => HashMap::new(),
    };

    let items = tables.items;
    let c_order = items.column("order_id")?;
    let c_product = items.column("product_id")?;
    let c_price = items.column("price")?;
    let c_freight = items.optional_column("freight_value");

    let mut sales = Vec::with_capacity(items.rows.len());
    let mut unmatched = 0usize;
    let mut bad_price = 0usize;
    let mut filtered = 0usize;

    for row in &items.rows {
        let Some((order_id, order)) =
            field(row, c_order).and_then(|id| order_rows.get(id).map(|o| (id, o)))
        else {
            unmatched += 1;
            continue;
        };
        if !config.keeps(&order.status) {
            filtered += 1;
            continue;
        }
        let Some(price) = field(row, c_price).and_then(parse_decimal) else {
            bad_price += 1;
            continue;
        };
        let product_id = field(row, c_product).unwrap_or_default().to_string();

        sales.push(SalesRecord {
            order_id: order_id.to_string(),
            status: order.status.clone(),
            purchased_at: order.purchased_at,
            delivered_at: order.delivered_at,
            category: categories
                .get(product_id.as_str())
                .cloned()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            product_id,
            price,
            freight_value: c_freight.and_then(|c| field(row, c)).and_then(parse_decimal),
            state: states
                .get(order.customer_id.as_str())
                .cloned()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            review_score: scores.get(order_id).copied(),
        });
    }

    debug!(
        kept = sales.len(),
        unmatched, bad_price, filtered, "joined order items"
    );
    if unmatched > 0 {
        warnings.push(format!("{unmatched} order items reference unknown orders and were dropped"));
    }
    if bad_price > 0 {
        warnings.push(format!("{bad_price} order items have no numeric price and were dropped"));
    }

    let mut table_summaries = vec![tables.orders.summary(), tables.items.summary()];
    table_summaries.extend(
        [tables.products, tables.customers, tables.reviews]
            .into_iter()
            .flatten()
            .map(Table::summary),
    );

    let summary = DatasetSummary {
        tables: table_summaries,
        sales_records: sales.len(),
        orders: headers.len(),
        years: available_years(&sales),
        first_purchase: sales.iter().map(|s| s.purchased_at).min(),
        last_purchase: sales.iter().map(|s| s.purchased_at).max(),
    };

    info!(
        sales_records = summary.sales_records,
        years = ?summary.years,
        "dataset ready"
    );

    Ok(Dataset {
        sales,
        orders: headers,
        summary,
        warnings,
    })
}

fn index_orders(
    orders: &Table,
    warnings: &mut Vec<String>,
) -> KpiResult<(HashMap<String, OrderRow>, Vec<OrderHeader>)> {
    let c_id = orders.column("order_id")?;
    let c_customer = orders.column("customer_id")?;
    let c_status = orders.column("order_status")?;
    let c_purchase = orders.column("order_purchase_timestamp")?;
    let c_delivered = orders.column("order_delivered_customer_date")?;

    let mut rows = HashMap::with_capacity(orders.rows.len());
    let mut headers = Vec::with_capacity(orders.rows.len());
    let mut undated = 0usize;

    for row in &orders.rows {
        let Some(order_id) = field(row, c_id) else {
            continue;
        };
        let Some(purchased_at) = field(row, c_purchase).and_then(parse_timestamp) else {
            undated += 1;
            continue;
        };
        let status = OrderStatus::from(field(row, c_status).unwrap_or_default());
        headers.push(OrderHeader {
            order_id: order_id.to_string(),
            status: status.clone(),
            purchased_at,
        });
        rows.insert(
            order_id.to_string(),
            OrderRow {
                status,
                customer_id: field(row, c_customer).unwrap_or_default().to_string(),
                purchased_at,
                delivered_at: field(row, c_delivered).and_then(parse_timestamp),
            },
        );
    }

    if undated > 0 {
        warn!(undated, "orders without a purchase timestamp dropped");
        warnings.push(format!(
            "{undated} orders have no valid purchase timestamp and were dropped"
        ));
    }
    Ok((rows, headers))
}

/// key column -> value column, blank values mapped to `UNKNOWN`.
fn lookup(table: &Table, key: &str, value: &str) -> KpiResult<HashMap<String, String>> {
    let c_key = table.column(key)?;
    let c_value = table.column(value)?;
    Ok(table
        .rows
        .iter()
        .filter_map(|row| {
            let k = field(row, c_key)?;
            let v = field(row, c_value).unwrap_or(UNKNOWN);
            Some((k.to_string(), v.to_string()))
        })
        .collect())
}

/// First valid review score per order.
fn index_reviews(reviews: &Table) -> KpiResult<HashMap<String, u8>> {
    let c_order = reviews.column("order_id")?;
    let c_score = reviews.column("review_score")?;
    let mut scores = HashMap::new();
    for row in &reviews.rows {
        if let (Some(order_id), Some(score)) = (
            field(row, c_order),
            field(row, c_score).and_then(parse_review_score),
        ) {
            scores.entry(order_id.to_string()).or_insert(score);
        }
    }
    Ok(scores)
}

/// Distinct purchase years, most recent first.
pub fn available_years(records: &[SalesRecord]) -> Vec<i32> {
    records
        .iter()
        .map(|r| r.purchased_at.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .rev()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KpiError;
    use rust_decimal_macros::dec;

    const ORDERS: &str = "\
order_id,customer_id,order_status,order_purchase_timestamp,order_delivered_customer_date
o1,c1,delivered,2023-01-10 10:00:00,2023-01-14 09:00:00
o2,c2,canceled,2023-02-01 08:00:00,
o3,c1,delivered,,2023-03-01 00:00:00
o4,c3,delivered,2022-07-07 07:07:07,2022-07-20 12:00:00
";

    const ITEMS: &str = "\
order_id,order_item_id,product_id,price,freight_value
o1,1,p1,100.00,10.50
o1,2,p2,50.00,5.00
o2,1,p1,70.00,3.00
o3,1,p1,20.00,1.00
o4,1,p3,abc,1.00
o9,1,p1,5.00,1.00
";

    const PRODUCTS: &str = "\
product_id,product_category_name
p1,toys
p2,
";

    const CUSTOMERS: &str = "\
customer_id,customer_state
c1,SP
c2,RJ
";

    const REVIEWS: &str = "\
review_id,order_id,review_score
r1,o1,5
r2,o1,1
";

    fn table(name: &str, csv: &str) -> Table {
        Table::read(name, csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_join_and_filter() {
        let orders = table("orders", ORDERS);
        let items = table("order_items", ITEMS);
        let products = table("products", PRODUCTS);
        let customers = table("customers", CUSTOMERS);
        let reviews = table("reviews", REVIEWS);
        let tables = Tables {
            orders: &orders,
            items: &items,
            products: Some(&products),
            customers: Some(&customers),
            reviews: Some(&reviews),
        };
        let ds = build_dataset(&tables, &LoaderConfig::default()).unwrap();

        // o1 x2 kept; o2 canceled; o3 undated; o4 bad price; o9 unknown order
        assert_eq!(ds.sales.len(), 2);
        let first = &ds.sales[0];
        assert_eq!(first.category, "toys");
        assert_eq!(first.state, "SP");
        assert_eq!(first.review_score, Some(5));
        assert_eq!(first.freight_value, Some(dec!(10.50)));
        assert_eq!(first.delivery_days(), Some(3));
        assert_eq!(ds.sales[1].category, UNKNOWN);

        assert_eq!(ds.orders.len(), 3);
        assert_eq!(ds.summary.years, vec![2023]);
        assert!(ds.warnings.iter().any(|w| w.contains("no valid purchase timestamp")));
        assert!(ds.warnings.iter().any(|w| w.contains("unknown orders")));
        assert!(ds.warnings.iter().any(|w| w.contains("no numeric price")));
    }

    #[test]
    fn test_include_canceled() {
        let orders = table("orders", ORDERS);
        let items = table("order_items", ITEMS);
        let tables = Tables {
            orders: &orders,
            items: &items,
            products: None,
            customers: None,
            reviews: None,
        };
        let config = LoaderConfig {
            include_canceled: true,
            ..LoaderConfig::default()
        };
        let ds = build_dataset(&tables, &config).unwrap();
        assert_eq!(ds.sales.len(), 3);
        assert!(ds.sales.iter().all(|s| s.state == UNKNOWN));
    }

    #[test]
    fn test_missing_required_column() {
        let orders = table("orders", "order_id,customer_id,order_status\no1,c1,delivered\n");
        let items = table("order_items", ITEMS);
        let tables = Tables {
            orders: &orders,
            items: &items,
            products: None,
            customers: None,
            reviews: None,
        };
        match build_dataset(&tables, &LoaderConfig::default()).unwrap_err() {
            KpiError::MissingColumn { table, column } => {
                assert_eq!(table, "orders");
                assert_eq!(column, "order_purchase_timestamp");
            }
            other => panic!("Expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_available_years_descending() {
        let orders = table("orders", ORDERS);
        let items = table("order_items", "order_id,product_id,price\no1,p1,1\no4,p1,2\n");
        let tables = Tables {
            orders: &orders,
            items: &items,
            products: None,
            customers: None,
            reviews: None,
        };
        let ds = build_dataset(&tables, &LoaderConfig::default()).unwrap();
        assert_eq!(available_years(&ds.sales), vec![2023, 2022]);
    }
}
