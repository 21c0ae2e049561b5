use serde_json::Value;
use std::io::{self, Write};

/// Write output as `field,value` CSV to stdout, flattening nested objects and
/// lists into dotted paths such as `revenue_by_state.0.revenue`.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(stdout.lock(), value) {
        eprintln!("CSV output error: {}", e);
    }
}

pub fn write_csv<W: Write>(writer: W, value: &Value) -> csv::Result<()> {
    let body = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let mut rows = Vec::new();
    flatten("", body, &mut rows);

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["field", "value"])?;
    for (field, val) in rows {
        wtr.write_record([field, val])?;
    }
    wtr.flush()?;
    Ok(())
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn flatten(prefix: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                flatten(&join(prefix, key), val, rows);
            }
        }
        Value::Array(arr) if arr.iter().any(|v| v.is_object() || v.is_array()) => {
            for (i, val) in arr.iter().enumerate() {
                flatten(&join(prefix, &i.to_string()), val, rows);
            }
        }
        Value::Array(arr) => {
            let joined: Vec<String> = arr.iter().map(scalar).collect();
            rows.push((prefix.to_string(), joined.join(";")));
        }
        _ => rows.push((prefix.to_string(), scalar(value))),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flattens_result_into_dotted_fields() {
        let value = json!({
            "result": {
                "total_revenue": {"current": "1000", "pct_change": null},
                "current_period": {"year": 2023, "months": [1, 2]},
                "revenue_by_state": [{"name": "SP", "revenue": "700"}]
            },
            "warnings": []
        });
        let mut buf = Vec::new();
        write_csv(&mut buf, &value).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("field,value\n"));
        assert!(text.contains("total_revenue.current,1000\n"));
        assert!(text.contains("total_revenue.pct_change,\n"));
        assert!(text.contains("current_period.months,1;2\n"));
        assert!(text.contains("revenue_by_state.0.name,SP\n"));
        assert!(!text.contains("warnings"));
    }
}
