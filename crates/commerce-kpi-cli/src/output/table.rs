use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

const DELTA_KEYS: [&str; 4] = ["current", "comparison", "absolute_change", "pct_change"];

/// Format output as tables: scalar fields, a KPI comparison table for
/// current/comparison pairs, then one titled table per list of rows.
pub fn print_table(value: &Value) {
    print!("{}", render(value));
}

pub fn render(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => {
                render_section(result, &mut out);
                render_footer(map, &mut out);
            }
            None => render_section(value, &mut out),
        },
        Value::Array(arr) => out.push_str(&rows_table(arr)),
        _ => {
            out.push_str(&format_value(value));
            out.push('\n');
        }
    }
    out
}

fn is_delta(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|m| m.len() == DELTA_KEYS.len() && DELTA_KEYS.iter().all(|k| m.contains_key(*k)))
}

fn is_row_list(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|a| !a.is_empty() && a.iter().all(Value::is_object))
}

fn render_section(value: &Value, out: &mut String) {
    let Value::Object(map) = value else {
        out.push_str(&format_value(value));
        out.push('\n');
        return;
    };

    let mut fields = Builder::default();
    fields.push_record(["Field", "Value"]);
    let mut kpis = Builder::default();
    kpis.push_record(["KPI", "Current", "Comparison", "Change", "Change %"]);
    let (mut has_fields, mut has_kpis) = (false, false);
    let mut lists: Vec<(&String, &Vec<Value>)> = Vec::new();

    for (key, val) in map {
        if is_delta(val) {
            let cell = |k: &str| val.get(k).map(format_value).unwrap_or_default();
            kpis.push_record([
                key.clone(),
                cell("current"),
                cell("comparison"),
                cell("absolute_change"),
                cell("pct_change"),
            ]);
            has_kpis = true;
        } else if is_row_list(val) {
            if let Value::Array(rows) = val {
                lists.push((key, rows));
            }
        } else {
            fields.push_record([key.clone(), format_value(val)]);
            has_fields = true;
        }
    }

    if has_fields {
        out.push_str(&format!("{}\n", Table::from(fields)));
    }
    if has_kpis {
        out.push_str(&format!("\n{}\n", Table::from(kpis)));
    }
    for (title, rows) in lists {
        out.push_str(&format!("\n{}:\n", title));
        out.push_str(&rows_table(rows));
    }
}

fn render_footer(envelope: &Map<String, Value>, out: &mut String) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            out.push_str("\nWarnings:\n");
            for w in warnings.iter().filter_map(Value::as_str) {
                out.push_str(&format!("  - {}\n", w));
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        out.push_str(&format!("\nMethodology: {}\n", meth));
    }
}

fn rows_table(arr: &[Value]) -> String {
    let Some(Value::Object(first)) = arr.first() else {
        return arr.iter().map(|v| format_value(v) + "\n").collect();
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for map in arr.iter().filter_map(Value::as_object) {
        builder.push_record(
            headers
                .iter()
                .map(|h| map.get(h).map(format_value).unwrap_or_default()),
        );
    }
    format!("{}\n", Table::from(builder))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}={}", format_value(v)))
            .collect::<Vec<_>>()
            .join(" "),
    }
}
