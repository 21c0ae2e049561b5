use serde_json::Value;

/// Headline fields, tried in order, as paths into the result object.
const PRIORITY_PATHS: [&str; 3] = ["total_revenue.current", "statuses", "sales_records"];

/// Print just the headline answer: current revenue for a dashboard, one
/// `status share%` line per status, or the record count for an inspection.
pub fn print_minimal(value: &Value) {
    println!("{}", render(value));
}

pub fn render(value: &Value) -> String {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for path in PRIORITY_PATHS {
        if let Some(val) = lookup(result, path).filter(|v| !v.is_null()) {
            return format_minimal(val);
        }
    }

    if let Some((key, val)) = result.as_object().and_then(|m| m.iter().next()) {
        return format!("{}: {}", key, format_minimal(val));
    }
    format_minimal(result)
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Array(rows) if rows.iter().all(|r| r.get("status").is_some()) => rows
            .iter()
            .map(|r| {
                format!(
                    "{} {}%",
                    r.get("status").map(format_minimal).unwrap_or_default(),
                    r.get("share_pct").map(format_minimal).unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dashboard_prints_current_revenue() {
        let v = json!({"result": {"current_period": {"year": 2023}, "total_revenue": {"current": "1000.00"}}});
        assert_eq!(render(&v), "1000.00");
    }

    #[test]
    fn test_status_lines() {
        let v = json!({"result": {"period": "2023", "statuses": [
            {"status": "delivered", "orders": 3, "share_pct": "75.00"},
            {"status": "canceled", "orders": 1, "share_pct": "25.00"}
        ]}});
        assert_eq!(render(&v), "delivered 75.00%\ncanceled 25.00%");
    }

    #[test]
    fn test_falls_back_to_first_field() {
        let v = json!({"result": {"alpha": 1}});
        assert_eq!(render(&v), "alpha: 1");
    }
}
