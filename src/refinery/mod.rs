// * The Refinery
// * Statement page HTML -> section table -> long rows ready for persistence.

pub mod cleaning;
pub mod reshape;
pub mod tables;

// * Re-exports for convenient access
pub use cleaning::{clean_narration, clean_value};
pub use reshape::{reshape, ReshapeOptions, Reshaper};
pub use tables::{extract_section_table, NoDataReason, SectionTableExtractor};

use crate::persistence::schema::ReshapedStatement;

/// Extraction followed by reshaping, for a single statement page
///
/// # Example
/// ```ignore
/// use statement_flow::refinery::{ReshapeOptions, StatementRefinery};
///
/// let refinery = StatementRefinery::new("profit-loss", ReshapeOptions::default());
/// let statement = refinery.process(&html, "Acme Ltd")?;
/// println!("rows: {}", statement.rows.len());
/// ```
#[derive(Debug, Clone)]
pub struct StatementRefinery {
    extractor: SectionTableExtractor,
    reshaper: Reshaper,
}

impl StatementRefinery {
    pub fn new(section_id: impl Into<String>, options: ReshapeOptions) -> Self {
        Self {
            extractor: SectionTableExtractor::new(section_id),
            reshaper: Reshaper::new(options),
        }
    }

    pub fn section_id(&self) -> &str {
        self.extractor.section_id()
    }

    /// Processes one page for `company_name`.
    ///
    /// Fails with a [`NoDataReason`] when the section or table is missing, or
    /// when nothing is left once the header has been promoted.
    pub fn process(&self, html: &str, company_name: &str) -> Result<ReshapedStatement, NoDataReason> {
        let table = self.extractor.extract(html)?;
        let statement = self.reshaper.reshape(&table, company_name);

        if statement.is_empty() {
            return Err(NoDataReason::EmptyTable);
        }
        Ok(statement)
    }
}

impl Default for StatementRefinery {
    fn default() -> Self {
        Self::new(crate::config::constants::DEFAULT_SECTION_ID, ReshapeOptions::default())
    }
}
