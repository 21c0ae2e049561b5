use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::KpiError;
use crate::KpiResult;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// A CSV extract held in memory with its header row.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

/// Shape and quality counters for one loaded table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    /// Cells that are empty after trimming
    pub empty_cells: usize,
    pub duplicate_rows: usize,
}

impl Table {
    pub fn read<R: Read>(name: &str, reader: R) -> KpiResult<Table> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(false)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        let mut rows = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result
                .map_err(|e| KpiError::Csv(format!("{name}: parse error at line {}: {e}", line + 2)))?;
            rows.push(record);
        }

        Ok(Table {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    pub fn from_path(name: &str, path: &Path) -> KpiResult<Table> {
        let file = File::open(path)
            .map_err(|e| KpiError::Io(format!("Failed to open '{}': {}", path.display(), e)))?;
        Table::read(name, file)
    }

    /// Index of a required column.
    pub fn column(&self, column: &str) -> KpiResult<usize> {
        self.optional_column(column)
            .ok_or_else(|| KpiError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    pub fn optional_column(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    pub fn summary(&self) -> TableSummary {
        let mut seen: HashSet<u64> = HashSet::with_capacity(self.rows.len());
        let mut duplicate_rows = 0;
        let mut empty_cells = 0;
        for row in &self.rows {
            let mut hasher = DefaultHasher::new();
            for field in row.iter() {
                if field.is_empty() {
                    empty_cells += 1;
                }
                field.hash(&mut hasher);
            }
            if !seen.insert(hasher.finish()) {
                duplicate_rows += 1;
            }
        }
        TableSummary {
            name: self.name.clone(),
            rows: self.rows.len(),
            columns: self.headers.len(),
            empty_cells,
            duplicate_rows,
        }
    }
}

/// Field at `idx`, None when absent or blank.
pub fn field(row: &StringRecord, idx: usize) -> Option<&str> {
    row.get(idx).filter(|s| !s.is_empty())
}

/// Parse an extract timestamp; date-only values map to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Review scores arrive as "5" or "5.0"; anything outside 1-5 is dropped.
pub fn parse_review_score(raw: &str) -> Option<u8> {
    let value = parse_decimal(raw)?;
    if value.fract() != Decimal::ZERO {
        return None;
    }
    let score = value.to_u8()?;
    (1..=5).contains(&score).then_some(score)
}
