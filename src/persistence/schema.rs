// * Row entities for the scrape -> reshape -> persist pipeline
// * Everything here lives for the processing of a single company only

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

// * Optional leading minus, digits with at most one decimal point
static NUMERIC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(\d+\.?\d*|\.\d+)$").expect("! CRITICAL: Invalid numeric regex"));

/// One entry of the input roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// Exchange symbol used to build the statement URL
    pub symbol: String,
    /// Display name stored alongside every row
    pub name: String,
}

impl CompanyRecord {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// Cells of one HTML table, row by row. The first row is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Builds a table from string literals
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// True when there is nothing below the header
    pub fn is_empty(&self) -> bool {
        self.data_rows().is_empty()
    }
}

/// Cleaned cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Parses the strict numeric grammar used by the value cleaner
    pub fn parse_numeric(s: &str) -> Option<f64> {
        if NUMERIC_PATTERN.is_match(s) {
            s.parse::<f64>().ok()
        } else {
            None
        }
    }

    /// Rebuilds a value from its stored TEXT form
    pub fn from_stored(s: &str) -> Self {
        match Self::parse_numeric(s) {
            Some(n) => CellValue::Number(n),
            None => CellValue::Text(s.to_string()),
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Number(0.0)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// One line item with a raw value per reporting period.
/// `values[i]` belongs to the period at the same index of [`WideTable::periods`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideFinancialRow {
    pub narration: String,
    pub company_name: String,
    pub values: Vec<String>,
}

/// Wide statement: every row shares the same period columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WideTable {
    pub periods: Vec<String>,
    pub rows: Vec<WideFinancialRow>,
}

impl WideTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Persisted unit: one (line item, period) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongFinancialRow {
    pub narration: String,
    pub company_name: String,
    pub year: String,
    pub value: CellValue,
}

impl LongFinancialRow {
    pub fn new(
        narration: impl Into<String>,
        company_name: impl Into<String>,
        year: impl Into<String>,
        value: impl Into<CellValue>,
    ) -> Self {
        Self {
            narration: narration.into(),
            company_name: company_name.into(),
            year: year.into(),
            value: value.into(),
        }
    }
}

/// Trailing-twelve-month value of one line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtmRow {
    pub narration: String,
    pub company_name: String,
    pub ttm: CellValue,
}

impl TtmRow {
    pub fn new(
        narration: impl Into<String>,
        company_name: impl Into<String>,
        ttm: impl Into<CellValue>,
    ) -> Self {
        Self {
            narration: narration.into(),
            company_name: company_name.into(),
            ttm: ttm.into(),
        }
    }
}

/// Output of the reshaper for one company
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReshapedStatement {
    pub rows: Vec<LongFinancialRow>,
    pub ttm_rows: Vec<TtmRow>,
}

impl ReshapedStatement {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.ttm_rows.is_empty()
    }
}
