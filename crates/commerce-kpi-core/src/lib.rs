pub mod error;
pub mod period;
pub mod types;

#[cfg(feature = "loader")]
pub mod loader;

#[cfg(feature = "metrics")]
pub mod metrics;

pub use error::KpiError;
pub use period::Period;
pub use types::*;

/// Standard result type for all commerce-kpi operations
pub type KpiResult<T> = Result<T, KpiError>;
