use thiserror::Error;

#[derive(Debug, Error)]
pub enum KpiError {
    #[error("Invalid period: {field} — {reason}")]
    InvalidPeriod { field: String, reason: String },

    #[error("Missing column: table '{table}' has no '{column}' column")]
    MissingColumn { table: String, column: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for KpiError {
    fn from(e: serde_json::Error) -> Self {
        KpiError::SerializationError(e.to_string())
    }
}

impl From<std::io::Error> for KpiError {
    fn from(e: std::io::Error) -> Self {
        KpiError::Io(e.to_string())
    }
}

#[cfg(feature = "loader")]
impl From<csv::Error> for KpiError {
    fn from(e: csv::Error) -> Self {
        KpiError::Csv(e.to_string())
    }
}
