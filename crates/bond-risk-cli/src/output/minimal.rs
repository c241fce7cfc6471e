use serde_json::Value;

/// Headline figure of each command, in order of preference.
const HEADLINE_KEYS: [&str; 7] = [
    "weighted_duration",
    "modified_duration",
    "total_market_value",
    "base_model_market_value",
    "admitted",
    "duration_contribution",
    "price_after",
];

/// Print just the headline value of the output.
///
/// Array results print one line per element, labelled by identifier or
/// period when present.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(items) => {
            for item in items {
                let label = item
                    .get("identifier")
                    .or_else(|| item.get("period"))
                    .map(format_minimal);
                let body = item
                    .get("present_value")
                    .or_else(|| headline(item))
                    .map(format_minimal)
                    .unwrap_or_else(|| format_minimal(item));
                match label {
                    Some(label) => println!("{label}: {body}"),
                    None => println!("{body}"),
                }
            }
        }
        Value::Object(map) => match headline(result) {
            Some(val) => println!("{}", format_minimal(val)),
            None => {
                if let Some((key, val)) = map.iter().next() {
                    println!("{}: {}", key, format_minimal(val));
                }
            }
        },
        other => println!("{}", format_minimal(other)),
    }
}

fn headline(value: &Value) -> Option<&Value> {
    HEADLINE_KEYS
        .iter()
        .filter_map(|key| value.get(*key))
        .find(|val| !val.is_null())
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
