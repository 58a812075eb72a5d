use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::flatten_fields;

/// Format output as tables using the tabled crate.
///
/// Scalar and nested fields go in one Field/Value table; arrays of rows
/// (sensitivity, accrual schedule) each get a table of their own.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => print_result_tables(result, map),
            _ => print_field_table(map),
        },
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_tables(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    let fields = flatten_fields(result);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut row_sets: Vec<(String, Vec<Value>)> = Vec::new();
    for (key, val) in fields {
        match val {
            Value::Array(rows) if rows.iter().all(Value::is_object) && !rows.is_empty() => {
                row_sets.push((key, rows));
            }
            other => builder.push_record([key, format_value(&other)]),
        }
    }
    println!("{}", Table::from(builder));

    for (title, rows) in &row_sets {
        println!("\n{}:", title);
        print_array_table(rows);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_field_table(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten_fields(map) {
        builder.push_record([key, format_value(&val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(headers.clone());

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
