pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Render a command's JSON envelope to stdout in the chosen format.
/// `summary` prints its own text and never comes through here.
pub fn format_output(format: &OutputFormat, value: &Value) {
    let render: fn(&Value) = match format {
        OutputFormat::Json => json::print_json,
        OutputFormat::Table => table::print_table,
        OutputFormat::Csv => csv_out::print_csv,
        OutputFormat::Minimal => minimal::print_minimal,
    };
    render(value);
}
