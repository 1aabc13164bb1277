// * Persistence
// * Row entities shared across the pipeline and the SQLite store that receives them

pub mod schema;
pub mod store;

// * Re-exports for convenient access
pub use schema::{
    CellValue, CompanyRecord, LongFinancialRow, RawTable, ReshapedStatement, TtmRow,
    WideFinancialRow, WideTable,
};
pub use store::{validate_table_name, PersistError, StatementStore};
