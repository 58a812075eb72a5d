use serde_json::Value;

use super::flatten_fields;

/// Key answers, in order of preference: residual land value for a
/// feasibility, facility size for a facility sizing.
const PRIORITY_KEYS: [&str; 4] = [
    "rlv",
    "solution.facility_size",
    "amount_financed",
    "finance_cost",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_answer(value));
}

fn minimal_answer(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result_obj else {
        return format_minimal(result_obj);
    };
    let fields = flatten_fields(map);

    for key in PRIORITY_KEYS {
        if let Some((_, val)) = fields.iter().find(|(k, v)| k == key && !v.is_null()) {
            return format_minimal(val);
        }
    }

    match fields.first() {
        Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
        None => format_minimal(result_obj),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
