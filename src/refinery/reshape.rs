// * Reshaper
// * Turns the wide statement table (one column per period) into long rows:
// * header promotion -> label column -> company name -> TTM split -> melt -> sort -> clean

use crate::config::constants::{AGGREGATE_MARKERS, ID_COLUMN, NARRATION_COLUMN, TTM_COLUMN};
use crate::persistence::schema::{
    LongFinancialRow, RawTable, ReshapedStatement, TtmRow, WideFinancialRow, WideTable,
};
use crate::refinery::cleaning::{clean_narration, clean_value};
use tracing::debug;

/// Options for the reshaper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReshapeOptions {
    /// Move a `TTM` column into its own row set instead of melting it
    pub split_ttm: bool,
}

impl Default for ReshapeOptions {
    fn default() -> Self {
        Self { split_ttm: true }
    }
}

/// Applies the full transform sequence
#[derive(Debug, Clone, Default)]
pub struct Reshaper {
    options: ReshapeOptions,
}

impl Reshaper {
    pub fn new(options: ReshapeOptions) -> Self {
        Self { options }
    }

    /// Reshapes one extracted table for `company_name`.
    ///
    /// An empty table yields an empty result. A missing TTM column yields an
    /// empty TTM row set.
    pub fn reshape(&self, table: &RawTable, company_name: &str) -> ReshapedStatement {
        let (mut wide, ttm_values) = to_wide(table, company_name, self.options);

        if wide.is_empty() {
            debug!(company = company_name, "No rows after header promotion");
            return ReshapedStatement::default();
        }

        let ttm_rows = match ttm_values {
            Some(values) => ttm_rows(&wide, values),
            None => Vec::new(),
        };

        drop_aggregate_rows(&mut wide);

        let mut rows = melt(&wide);
        sort_long_rows(&mut rows);

        debug!(
            company = company_name,
            periods = wide.periods.len(),
            rows = rows.len(),
            ttm_rows = ttm_rows.len(),
            "Reshaped statement"
        );

        ReshapedStatement { rows, ttm_rows }
    }
}

/// Reshapes with default options
pub fn reshape(table: &RawTable, company_name: &str) -> ReshapedStatement {
    Reshaper::default().reshape(table, company_name)
}

// * Column roles after header promotion
struct ColumnLayout {
    label: usize,
    ttm: Option<usize>,
    periods: Vec<usize>,
}

impl ColumnLayout {
    fn from_table(header: &[String], rows: &[Vec<String>], options: ReshapeOptions) -> Self {
        let leading_id = header.first().is_some_and(|h| h.trim().eq_ignore_ascii_case(ID_COLUMN));
        let named_label = header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(NARRATION_COLUMN));

        // * Label column: a "Narration" header wins, otherwise the first non-id column
        let label = named_label.unwrap_or(if leading_id { 1 } else { 0 });

        let ttm = if options.split_ttm {
            header.iter().position(|h| h.trim().eq_ignore_ascii_case(TTM_COLUMN))
        } else {
            None
        };

        let periods = header
            .iter()
            .enumerate()
            .filter(|(i, h)| {
                *i != label
                    && !(leading_id && *i == 0)
                    && Some(*i) != ttm
                    && !is_aggregate_marker(h)
                    && !(named_label.is_some() && is_staged_label(*i, h, label, rows))
            })
            .map(|(i, _)| i)
            .collect();

        Self { label, ttm, periods }
    }
}

// * Helper column that staged the label next to a named "Narration" column:
// * blank header, or the same cells as the label on every row
fn is_staged_label(column: usize, header: &str, label: usize, rows: &[Vec<String>]) -> bool {
    if header.trim().is_empty() {
        return true;
    }
    !rows.is_empty() && rows.iter().all(|row| cell(row, column).trim() == cell(row, label).trim())
}

/// Promotes the header and builds the wide table.
///
/// Returns the wide table plus the raw TTM column, if one was split off.
pub fn to_wide(
    table: &RawTable,
    company_name: &str,
    options: ReshapeOptions,
) -> (WideTable, Option<Vec<String>>) {
    let Some(header) = table.header() else {
        return (WideTable::default(), None);
    };

    let layout = ColumnLayout::from_table(header, table.data_rows(), options);
    let periods: Vec<String> = layout.periods.iter().map(|&i| header[i].trim().to_string()).collect();

    let rows: Vec<WideFinancialRow> = table
        .data_rows()
        .iter()
        .map(|row| WideFinancialRow {
            narration: clean_narration(&cell(row, layout.label)),
            company_name: company_name.to_string(),
            values: layout.periods.iter().map(|&i| cell(row, i)).collect(),
        })
        .collect();

    let ttm = layout
        .ttm
        .map(|t| table.data_rows().iter().map(|row| cell(row, t)).collect());

    (WideTable { periods, rows }, ttm)
}

fn cell(row: &[String], i: usize) -> String {
    row.get(i).cloned().unwrap_or_default()
}

// * Pairs the split-off TTM column with its line items, skipping aggregate rows
fn ttm_rows(wide: &WideTable, values: Vec<String>) -> Vec<TtmRow> {
    wide.rows
        .iter()
        .zip(values)
        .filter(|(row, _)| !is_aggregate_marker(&row.narration))
        .map(|(row, raw)| TtmRow {
            narration: row.narration.clone(),
            company_name: row.company_name.clone(),
            ttm: clean_value(&raw),
        })
        .collect()
}

/// Removes rows whose label is an aggregate marker
pub fn drop_aggregate_rows(wide: &mut WideTable) {
    wide.rows.retain(|row| !is_aggregate_marker(&row.narration));
}

/// Un-pivots the wide table: one row per (line item, period), values cleaned
pub fn melt(wide: &WideTable) -> Vec<LongFinancialRow> {
    wide.rows
        .iter()
        .flat_map(|row| {
            wide.periods.iter().zip(&row.values).map(move |(period, raw)| LongFinancialRow {
                narration: row.narration.clone(),
                company_name: row.company_name.clone(),
                year: period.clone(),
                value: clean_value(raw),
            })
        })
        .collect()
}

/// Sorts by (Narration, Year) ascending.
///
/// Year is compared as a string: "Mar 2023" sorts before "Sep 2019", and
/// "2023" sorts before "999". Period labels are not parsed as dates.
pub fn sort_long_rows(rows: &mut [LongFinancialRow]) {
    rows.sort_by(|a, b| a.narration.cmp(&b.narration).then_with(|| a.year.cmp(&b.year)));
}

fn is_aggregate_marker(label: &str) -> bool {
    let label = label.trim();
    AGGREGATE_MARKERS.iter().any(|m| label.eq_ignore_ascii_case(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::schema::CellValue;

    #[test]
    fn test_two_period_scenario() {
        let table = RawTable::from_rows([["Narration", "2022", "2023"], ["Sales", "100", "200"]]);
        let result = reshape(&table, "Acme");

        assert_eq!(
            result.rows,
            vec![
                LongFinancialRow::new("Sales", "Acme", "2022", 100.0),
                LongFinancialRow::new("Sales", "Acme", "2023", 200.0),
            ]
        );
        assert!(result.ttm_rows.is_empty());
    }

    #[test]
    fn test_row_count_is_rows_times_periods() {
        let table = RawTable::from_rows([
            vec!["", "Mar 2021", "Mar 2022", "Mar 2023"],
            vec!["Sales +", "1,000", "1,100", "1,200"],
            vec!["Expenses +", "800", "850", "900"],
        ]);
        let result = reshape(&table, "Acme");
        assert_eq!(result.rows.len(), 2 * 3);
    }

    #[test]
    fn test_ttm_split() {
        let table = RawTable::from_rows([
            vec!["", "Mar 2022", "Mar 2023", "TTM"],
            vec!["Sales +", "1,000", "1,200", "1,250"],
            vec!["OPM %", "20%", "21%", "22%"],
        ]);
        let result = reshape(&table, "Acme");

        assert_eq!(result.rows.len(), 4);
        assert!(result.rows.iter().all(|r| r.year != "TTM"));
        assert_eq!(
            result.ttm_rows,
            vec![TtmRow::new("Sales", "Acme", 1250.0), TtmRow::new("OPM %", "Acme", 22.0)]
        );
    }

    #[test]
    fn test_ttm_kept_as_period_when_not_split() {
        let table = RawTable::from_rows([vec!["", "2023", "TTM"], vec!["Sales", "1", "2"]]);
        let result = Reshaper::new(ReshapeOptions { split_ttm: false }).reshape(&table, "Acme");

        assert!(result.ttm_rows.is_empty());
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[1].year, "TTM");
    }

    #[test]
    fn test_missing_ttm_column_is_not_an_error() {
        let table = RawTable::from_rows([["", "2023"], ["Sales", "5"]]);
        let result = reshape(&table, "Acme");
        assert!(result.ttm_rows.is_empty());
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn test_empty_table_yields_empty_result() {
        let header_only = RawTable::from_rows([["Narration", "2022"]]);
        assert!(reshape(&header_only, "Acme").is_empty());
        assert!(reshape(&RawTable::default(), "Acme").is_empty());
    }

    #[test]
    fn test_sorted_by_narration_then_year() {
        let table = RawTable::from_rows([
            vec!["", "2023", "2022"],
            vec!["Sales", "2", "1"],
            vec!["Expenses", "4", "3"],
        ]);
        let result = reshape(&table, "Acme");
        let keys: Vec<(&str, &str)> =
            result.rows.iter().map(|r| (r.narration.as_str(), r.year.as_str())).collect();
        assert_eq!(
            keys,
            vec![("Expenses", "2022"), ("Expenses", "2023"), ("Sales", "2022"), ("Sales", "2023")]
        );
    }

    #[test]
    fn test_year_sort_is_lexicographic() {
        // * Month-prefixed labels do not sort chronologically
        let table = RawTable::from_rows([vec!["", "Sep 2019", "Mar 2023"], vec!["Sales", "1", "2"]]);
        let result = reshape(&table, "Acme");
        assert_eq!(result.rows[0].year, "Mar 2023");
        assert_eq!(result.rows[1].year, "Sep 2019");
    }

    #[test]
    fn test_leading_id_column_dropped() {
        let table = RawTable::from_rows([vec!["id", "Narration", "2023"], vec!["7", "Sales", "10"]]);
        let result = reshape(&table, "Acme");
        assert_eq!(result.rows, vec![LongFinancialRow::new("Sales", "Acme", "2023", 10.0)]);
    }

    #[test]
    fn test_leading_id_column_without_narration_header() {
        let table = RawTable::from_rows([vec!["id", "", "2023"], vec!["7", "Sales", "10"]]);
        let result = reshape(&table, "Acme");
        assert_eq!(result.rows[0].narration, "Sales");
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn test_staged_label_column_dropped() {
        let table = RawTable::from_rows([
            vec!["id", "Narration", "", "2022"],
            vec!["1", "Sales", "Sales", "100"],
        ]);
        let result = reshape(&table, "Acme");
        assert_eq!(result.rows, vec![LongFinancialRow::new("Sales", "Acme", "2022", 100.0)]);
    }

    #[test]
    fn test_duplicated_label_column_dropped() {
        let table = RawTable::from_rows([
            vec!["Narration", "Label", "2022", "2023"],
            vec!["Sales", "Sales", "100", "110"],
            vec!["Expenses", "Expenses", "80", "85"],
        ]);
        let result = reshape(&table, "Acme");
        assert_eq!(result.rows.len(), 2 * 2);
        assert!(result.rows.iter().all(|r| r.year == "2022" || r.year == "2023"));
    }

    #[test]
    fn test_blank_label_header_without_narration_is_the_label() {
        // * No "Narration" header: the blank first column is the label, not a helper
        let table = RawTable::from_rows([vec!["", "2022"], vec!["Sales", "100"]]);
        let result = reshape(&table, "Acme");
        assert_eq!(result.rows, vec![LongFinancialRow::new("Sales", "Acme", "2022", 100.0)]);
    }

    #[test]
    fn test_row_count_over_table_shapes() {
        for rows in 1..=4usize {
            for periods in 1..=5usize {
                let mut raw = vec![std::iter::once("Narration".to_string())
                    .chain((0..periods).map(|p| format!("FY{}", 2000 + p)))
                    .collect::<Vec<_>>()];
                for r in 0..rows {
                    raw.push(
                        std::iter::once(format!("Item {}", r))
                            .chain((0..periods).map(|p| (r * 10 + p).to_string()))
                            .collect(),
                    );
                }

                let result = reshape(&RawTable::new(raw), "Acme");
                assert_eq!(result.rows.len(), rows * periods, "{} rows x {} periods", rows, periods);
            }
        }
    }

    #[test]
    fn test_aggregate_markers_excluded() {
        let table = RawTable::from_rows([
            vec!["", "2022", "2023", "TTL"],
            vec!["Sales", "1", "2", "3"],
            vec!["TTL", "9", "9", "9"],
        ]);
        let result = reshape(&table, "Acme");
        // * 1 remaining row x 2 remaining periods
        assert_eq!(result.rows.len(), 2);
        assert!(result.rows.iter().all(|r| r.narration == "Sales" && r.year != "TTL"));
    }

    #[test]
    fn test_values_cleaned() {
        let table = RawTable::from_rows([vec!["", "2022", "2023", "2024"], vec!["Growth", "12%", "", "N/A"]]);
        let result = reshape(&table, "Acme");
        let values: Vec<CellValue> = result.rows.into_iter().map(|r| r.value).collect();
        assert_eq!(
            values,
            vec![CellValue::Number(12.0), CellValue::Number(0.0), CellValue::Text("N/A".to_string())]
        );
    }
}
