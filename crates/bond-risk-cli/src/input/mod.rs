pub mod file;
pub mod stdin;

use bond_risk_core::fixed_income::BondRecord;
use bond_risk_core::portfolio::{Portfolio, RejectedRecord};

/// Load bond records from `--input` (JSON or CSV) or piped JSON on stdin,
/// and admit them into a fresh session portfolio.
pub fn load_portfolio(
    path: Option<&str>,
) -> Result<(Portfolio, Vec<RejectedRecord>), Box<dyn std::error::Error>> {
    let records: Vec<BondRecord> = if let Some(path) = path {
        file::read_bonds(path)?
    } else if let Some(records) = stdin::read_stdin()? {
        records
    } else {
        return Err("--input <portfolio.json|portfolio.csv> or stdin required".into());
    };

    let (portfolio, rejected) = Portfolio::from_records(records);
    tracing::info!(
        admitted = portfolio.len(),
        rejected = rejected.len(),
        "portfolio loaded"
    );
    Ok((portfolio, rejected))
}
