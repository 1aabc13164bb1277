// * Roster loader
// * Reads the company list (CSV with "Symbol" and "Company Name" columns)

use crate::config::constants::{ROSTER_NAME_COLUMN, ROSTER_SYMBOL_COLUMN};
use crate::persistence::schema::CompanyRecord;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Roster file not found: {0}")]
    NotFound(String),

    #[error("Roster is missing the '{0}' column")]
    MissingColumn(&'static str),

    #[error("Roster CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct RosterEntry {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Company Name")]
    name: String,
}

/// Loads the roster from a CSV file, in file order.
///
/// Extra columns are ignored. Rows with a blank symbol are skipped with a
/// warning. Duplicate symbols are kept and processed twice.
pub fn load_roster(path: impl AsRef<Path>) -> Result<Vec<CompanyRecord>, RosterError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(RosterError::NotFound(path.display().to_string()));
    }

    let reader = ReaderBuilder::new().trim(Trim::All).from_path(path)?;
    let companies = read_roster(reader)?;

    info!(path = %path.display(), companies = companies.len(), "Loaded roster");
    Ok(companies)
}

/// Parses roster CSV text
pub fn parse_roster(text: &str) -> Result<Vec<CompanyRecord>, RosterError> {
    let reader = ReaderBuilder::new().trim(Trim::All).from_reader(text.as_bytes());
    read_roster(reader)
}

fn read_roster<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<CompanyRecord>, RosterError> {
    let headers = reader.headers()?.clone();
    for column in [ROSTER_SYMBOL_COLUMN, ROSTER_NAME_COLUMN] {
        if !headers.iter().any(|h| h == column) {
            return Err(RosterError::MissingColumn(column));
        }
    }

    let mut companies = Vec::new();
    for (line, entry) in reader.deserialize::<RosterEntry>().enumerate() {
        let entry = entry?;
        if entry.symbol.is_empty() {
            // * +2: header row plus 1-based numbering
            warn!(line = line + 2, name = %entry.name, "Skipping roster row with blank symbol");
            continue;
        }
        companies.push(CompanyRecord::new(entry.symbol, entry.name));
    }

    Ok(companies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_in_file_order() {
        let roster = parse_roster("Symbol,Company Name\nTCS,Tata Consultancy\nINFY,Infosys\n").unwrap();
        assert_eq!(
            roster,
            vec![
                CompanyRecord::new("TCS", "Tata Consultancy"),
                CompanyRecord::new("INFY", "Infosys"),
            ]
        );
    }

    #[test]
    fn test_extra_columns_and_whitespace() {
        let text = "Sector, Symbol ,Company Name\nIT,  TCS , Tata Consultancy \n";
        let roster = parse_roster(text).unwrap();
        assert_eq!(roster, vec![CompanyRecord::new("TCS", "Tata Consultancy")]);
    }

    #[test]
    fn test_blank_symbol_skipped() {
        let roster = parse_roster("Symbol,Company Name\n,Nameless\nINFY,Infosys\n").unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].symbol, "INFY");
    }

    #[test]
    fn test_duplicates_kept() {
        let roster = parse_roster("Symbol,Company Name\nTCS,A\nTCS,A\n").unwrap();
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_missing_column() {
        let result = parse_roster("Ticker,Company Name\nTCS,Tata\n");
        assert!(matches!(result, Err(RosterError::MissingColumn("Symbol"))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Symbol,Company Name").unwrap();
        writeln!(file, "RELIANCE,Reliance Industries").unwrap();

        let roster = load_roster(file.path()).unwrap();
        assert_eq!(roster, vec![CompanyRecord::new("RELIANCE", "Reliance Industries")]);
    }

    #[test]
    fn test_missing_file() {
        let result = load_roster("/definitely/not/here/company.csv");
        assert!(matches!(result, Err(RosterError::NotFound(_))));
    }
}
