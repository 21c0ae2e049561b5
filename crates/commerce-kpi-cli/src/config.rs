use commerce_kpi_core::loader::LoaderConfig;
use commerce_kpi_core::metrics::MetricsOptions;
use serde::{Deserialize, Serialize};

use crate::input;

/// Settings file contents. Every section is optional; command-line flags
/// override whatever is set here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub loader: LoaderConfig,
    pub metrics: MetricsOptions,
    /// Analysis year used when --year is not given
    pub year: Option<i32>,
    pub comparison_year: Option<i32>,
}

impl AppConfig {
    /// Load from a .json/.yaml/.yml file, or defaults when no path is given.
    pub fn load(path: Option<&str>) -> Result<AppConfig, Box<dyn std::error::Error>> {
        match path {
            Some(p) => input::file::read_structured(p),
            None => Ok(AppConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_sections() {
        let mut f = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            f,
            "loader:\n  data_dir: extracts\n  include_canceled: true\nmetrics:\n  top_n: 5\nyear: 2023\n"
        )
        .unwrap();
        let cfg = AppConfig::load(f.path().to_str()).unwrap();
        assert_eq!(cfg.loader.data_dir.to_str(), Some("extracts"));
        assert!(cfg.loader.include_canceled);
        assert_eq!(cfg.metrics.top_n, 5);
        assert_eq!(cfg.year, Some(2023));
        assert_eq!(cfg.comparison_year, None);
    }

    #[test]
    fn test_json_config_defaults() {
        let mut f = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(f, "{{\"metrics\": {{}}}}").unwrap();
        let cfg = AppConfig::load(f.path().to_str()).unwrap();
        assert_eq!(cfg.metrics.top_n, 10);
        assert_eq!(cfg.loader.files.orders, "orders_dataset.csv");
    }

    #[test]
    fn test_no_config_is_default() {
        let cfg = AppConfig::load(None).unwrap();
        assert_eq!(cfg.year, None);
    }
}
