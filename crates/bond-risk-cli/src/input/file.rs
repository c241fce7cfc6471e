use bond_risk_core::fixed_income::{parse_bond_records, BondRecord};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read bond records from a `.csv` file or a JSON array.
pub fn read_bonds(path: &str) -> Result<Vec<BondRecord>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let is_csv = canonical
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        let file = fs::File::open(&canonical)
            .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
        parse_bonds_csv(file)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
    } else {
        let contents = fs::read_to_string(&canonical)
            .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
        parse_bond_records(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
    }
}

/// Raw CSV row; numeric columns are parsed as exact decimals.
#[derive(Debug, Deserialize)]
struct CsvBondRow {
    identifier: String,
    maturity_years: String,
    ytm_pct: String,
    coupon_rate_pct: String,
    price: String,
    face_value: String,
    quantity: String,
}

/// Parse CSV with a header row naming the bond record fields.
pub fn parse_bonds_csv<R: Read>(reader: R) -> Result<Vec<BondRecord>, Box<dyn std::error::Error>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for (i, row) in rdr.deserialize::<CsvBondRow>().enumerate() {
        let row = row?;
        // Header is line 1
        let line = i + 2;
        records.push(BondRecord {
            identifier: row.identifier,
            maturity_years: parse_field(&row.maturity_years, "maturity_years", line)?,
            ytm_pct: parse_field::<Decimal>(&row.ytm_pct, "ytm_pct", line)?,
            coupon_rate_pct: parse_field::<Decimal>(&row.coupon_rate_pct, "coupon_rate_pct", line)?,
            price: parse_field::<Decimal>(&row.price, "price", line)?,
            face_value: parse_field::<Decimal>(&row.face_value, "face_value", line)?,
            quantity: parse_field(&row.quantity, "quantity", line)?,
        });
    }

    Ok(records)
}

fn parse_field<T: FromStr>(raw: &str, field: &str, line: usize) -> Result<T, String> {
    raw.parse::<T>()
        .map_err(|_| format!("line {line}: '{raw}' is not a valid {field}"))
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
