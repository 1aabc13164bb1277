// * Table Extraction
// * Locates a statement section by its anchor id and reads its first table.

use crate::persistence::schema::RawTable;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::warn;

// * Precompiled CSS selectors
static SELECTOR_SECTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("section").expect("Invalid section selector"));
static SELECTOR_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("Invalid table selector"));

/// Why a page produced no statement data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoDataReason {
    /// No section element carries the anchor id
    MissingSection,
    /// The section has no table
    MissingTable,
    /// Nothing left after header promotion
    EmptyTable,
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NoDataReason::MissingSection => "section not found",
            NoDataReason::MissingTable => "table not found in section",
            NoDataReason::EmptyTable => "table is empty",
        };
        f.write_str(text)
    }
}

/// Extracts the first table of a named section
#[derive(Debug, Clone)]
pub struct SectionTableExtractor {
    section_id: String,
}

impl SectionTableExtractor {
    pub fn new(section_id: impl Into<String>) -> Self {
        Self {
            section_id: section_id.into(),
        }
    }

    pub fn section_id(&self) -> &str {
        &self.section_id
    }

    /// Parses the document and returns the section's first table.
    ///
    /// A missing section or table is a recoverable outcome, reported as the
    /// matching [`NoDataReason`]. An empty table is still returned.
    pub fn extract(&self, html: &str) -> Result<RawTable, NoDataReason> {
        let document = Html::parse_document(html);

        // * Compare ids directly so anchors with CSS-special characters still match
        let section = document
            .select(&SELECTOR_SECTION)
            .find(|s| s.value().id() == Some(self.section_id.as_str()))
            .ok_or(NoDataReason::MissingSection)?;

        let table = section
            .select(&SELECTOR_TABLE)
            .next()
            .ok_or(NoDataReason::MissingTable)?;

        Ok(Self::read_rows(&table))
    }

    // * Reads every row; the first row is the header. Rows whose width differs
    // * from the header are dropped.
    fn read_rows(table: &ElementRef) -> RawTable {
        let mut rows: Vec<Vec<String>> = Vec::new();

        for (index, tr) in own_rows(table).into_iter().enumerate() {
            let cells: Vec<String> = child_elements(tr)
                .filter(|cell| matches!(cell.value().name(), "th" | "td"))
                .map(|cell| {
                    let text: String = cell.text().collect();
                    text.trim().to_string()
                })
                .collect();

            match rows.first().map(Vec::len) {
                None => rows.push(cells),
                Some(width) if width == cells.len() => rows.push(cells),
                Some(width) => {
                    warn!(
                        row = index,
                        expected = width,
                        found = cells.len(),
                        "Dropping row with mismatched cell count"
                    );
                }
            }
        }

        RawTable::new(rows)
    }
}

// * Rows of this table only: direct <tr> children and those of thead/tbody/tfoot.
// * Rows of tables nested inside a cell are skipped.
fn own_rows<'a>(table: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let mut rows = Vec::new();
    for child in child_elements(*table) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(child_elements(child).filter(|el| el.value().name() == "tr"));
            }
            _ => {}
        }
    }
    rows
}

fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

/// Convenience wrapper returning `None` when the section or table is absent
pub fn extract_section_table(html: &str, section_id: &str) -> Option<RawTable> {
    SectionTableExtractor::new(section_id).extract(html).ok()
}
