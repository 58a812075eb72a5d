use serde_json::Value;
use std::io;

use super::flatten_fields;

/// Write output as CSV to stdout.
///
/// An envelope becomes a two-column `field,value` listing with nested cost
/// and settlement lines flattened. Arrays of rows are written as a table.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let fields = match map.get("result") {
                Some(Value::Object(result)) => flatten_fields(result),
                _ => flatten_fields(map),
            };
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in &fields {
                match val {
                    // Sensitivity rows as sensitivity[0].rlv_alt and so on
                    Value::Array(rows) if rows.iter().all(Value::is_object) => {
                        for (i, row) in rows.iter().enumerate() {
                            if let Value::Object(row) = row {
                                for (col, cell) in row {
                                    let name = format!("{key}[{i}].{col}");
                                    let _ = wtr.write_record([name.as_str(), &format_csv_value(cell)]);
                                }
                            }
                        }
                    }
                    other => {
                        let _ = wtr.write_record([key.as_str(), &format_csv_value(other)]);
                    }
                }
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
