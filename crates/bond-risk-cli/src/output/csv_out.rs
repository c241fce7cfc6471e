use serde_json::{Map, Value};
use std::io::{self, Write};

/// Write output as CSV to stdout.
///
/// Row-shaped results (holdings, schedules, ladder points) are written one
/// row per element; anything else becomes a two-column field/value sheet.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let outcome = match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Array(rows)) => write_rows(&mut wtr, rows),
            Some(Value::Object(result)) => match primary_rows(result) {
                Some(rows) => write_rows(&mut wtr, rows),
                None => write_fields(&mut wtr, result),
            },
            _ => write_fields(&mut wtr, map),
        },
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => wtr.write_record([format_csv_value(value)]),
    };

    if let Err(e) = outcome.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        tracing::error!(error = %e, "failed to write CSV");
    }
}

/// Arrays that make up the body of a result, in order of preference.
const ROW_KEYS: [&str; 2] = ["holdings", "points"];

/// The main array of objects inside a result object.
fn primary_rows(result: &Map<String, Value>) -> Option<&Vec<Value>> {
    ROW_KEYS
        .iter()
        .filter_map(|key| result.get(*key))
        .chain(result.values())
        .find_map(|val| match val {
            Value::Array(rows) if rows.iter().any(Value::is_object) => Some(rows),
            _ => None,
        })
}

fn write_fields<W: Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &format_csv_value(val)])?;
    }
    Ok(())
}

fn write_rows<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            wtr.write_record([format_csv_value(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for map in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
            .collect();
        wtr.write_record(&row)?;
    }
    Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render(rows: &[Value]) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_rows(&mut wtr, rows).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_rows_use_first_object_headers() {
        let out = render(&[
            json!({ "period": 1, "amount": "50" }),
            json!({ "period": 2, "amount": "1050" }),
        ]);
        let mut lines = out.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("period") && header.contains("amount"));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn test_primary_rows_finds_holdings() {
        let result = json!({
            "total_market_value": "2000",
            "excluded": [{ "identifier": "Z", "reason": "price" }],
            "holdings": [{ "identifier": "A" }, { "identifier": "B" }],
        });
        let rows = primary_rows(result.as_object().unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
