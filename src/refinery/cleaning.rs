// * Value cleaning for statement cells
// * "1,234.5%" -> 1234.5, "" / "-" / "NaN" -> 0.0, "N/A" -> "N/A"

use crate::persistence::schema::CellValue;

// * Characters removed anywhere in the cell
const STRIPPED_CHARS: [char; 3] = ['%', ',', '+'];

// * Cells that mean "no value" once stripped
const MISSING_MARKERS: [&str; 3] = ["", "-", "--"];

/// Cleans one cell.
///
/// Strips `%`, `,`, `+` and surrounding whitespace. A remainder matching the
/// numeric grammar becomes a number, blank or missing markers become the
/// default `0.0`, anything else is kept as cleaned text.
pub fn clean_value(raw: &str) -> CellValue {
    let stripped: String = raw.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect();
    let cleaned = stripped.trim();

    if is_missing(cleaned) {
        return CellValue::default();
    }

    match CellValue::parse_numeric(cleaned) {
        Some(n) => CellValue::Number(n),
        None => CellValue::Text(cleaned.to_string()),
    }
}

/// Trims a line-item label, including the trailing expand marker ("Sales +")
pub fn clean_narration(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| c == '+' || c.is_whitespace())
        .trim()
        .to_string()
}

fn is_missing(cleaned: &str) -> bool {
    MISSING_MARKERS.contains(&cleaned) || cleaned.eq_ignore_ascii_case("nan")
}
