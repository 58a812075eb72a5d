pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod report;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
        OutputFormat::Report => report::print_report(value),
    }
}

/// Flatten nested objects into dotted keys (`costs.finance_costs`).
///
/// Arrays are kept whole under their own key.
pub fn flatten_fields(map: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut fields = Vec::new();
    flatten_into(&mut fields, "", map);
    fields
}

fn flatten_into(fields: &mut Vec<(String, Value)>, prefix: &str, map: &Map<String, Value>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_into(fields, &name, inner),
            other => fields.push((name, other.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_objects() {
        let value = json!({
            "rlv": "100",
            "costs": {"finance_costs": "5", "funding_fee": "2"},
            "sensitivity": [{"shock_pct": "0"}]
        });
        let fields = flatten_fields(value.as_object().unwrap());
        let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert!(names.contains(&"costs.finance_costs"));
        assert!(names.contains(&"costs.funding_fee"));
        assert!(names.contains(&"sensitivity"));
        assert!(!names.contains(&"costs"));
    }
}
