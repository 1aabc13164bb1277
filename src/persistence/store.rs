// * Persister - SQLite destination tables
// * Idempotent schema creation, append-only writes, one transaction per batch

use crate::persistence::schema::{CellValue, LongFinancialRow, ReshapedStatement, TtmRow};
use regex::Regex;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info};

static TABLE_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("! CRITICAL: Invalid table name regex"));

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid table name '{0}'")]
    InvalidTableName(String),
}

/// Checks that a destination name is a plain SQL identifier
pub fn validate_table_name(name: &str) -> Result<(), PersistError> {
    if TABLE_NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(PersistError::InvalidTableName(name.to_string()))
    }
}

// * Identifiers are validated first, then always double-quoted
fn quoted(name: &str) -> Result<String, PersistError> {
    validate_table_name(name)?;
    Ok(format!("\"{}\"", name))
}

/// Append-only store for statement rows.
///
/// Holds one pool that is reused for every company in a run.
#[derive(Debug, Clone)]
pub struct StatementStore {
    pool: SqlitePool,
}

impl StatementStore {
    /// Opens (creating if needed) the database at `database_url`
    pub async fn connect(database_url: &str) -> Result<Self, PersistError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // * Single connection: writes are sequential and `sqlite::memory:` stays one database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        debug!(database_url, "Connected to destination database");
        Ok(Self { pool })
    }

    /// In-memory database, for tests and dry runs
    pub async fn in_memory() -> Result<Self, PersistError> {
        Self::connect("sqlite::memory:").await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the long-form table if it does not exist
    pub async fn ensure_table(&self, table: &str) -> Result<(), PersistError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                \"Narration\" TEXT,
                company_name TEXT,
                \"Year\" TEXT,
                \"Value\" TEXT
            )",
            quoted(table)?
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Creates the TTM table if it does not exist
    pub async fn ensure_ttm_table(&self, table: &str) -> Result<(), PersistError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                \"Narration\" TEXT,
                company_name TEXT,
                \"TTM\" TEXT
            )",
            quoted(table)?
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Appends rows in order. Existing rows are never touched.
    ///
    /// Returns the number of rows written.
    pub async fn persist(&self, rows: &[LongFinancialRow], table: &str) -> Result<u64, PersistError> {
        self.ensure_table(table).await?;

        let mut tx = self.pool.begin().await?;
        let written = insert_rows(&mut tx, rows, table).await?;
        tx.commit().await?;

        info!(table, rows = written, "Data loaded successfully");
        Ok(written)
    }

    /// Appends TTM rows in order
    pub async fn persist_ttm(&self, rows: &[TtmRow], table: &str) -> Result<u64, PersistError> {
        self.ensure_ttm_table(table).await?;

        let mut tx = self.pool.begin().await?;
        let written = insert_ttm_rows(&mut tx, rows, table).await?;
        tx.commit().await?;

        info!(table, rows = written, "TTM data loaded successfully");
        Ok(written)
    }

    /// Appends one company's long rows and TTM rows in a single transaction.
    ///
    /// Either both sets are committed or neither is. An empty TTM set does not
    /// touch `ttm_table`. Returns `(rows, ttm_rows)` written.
    pub async fn persist_statement(
        &self,
        statement: &ReshapedStatement,
        table: &str,
        ttm_table: &str,
    ) -> Result<(u64, u64), PersistError> {
        self.ensure_table(table).await?;
        if !statement.ttm_rows.is_empty() {
            self.ensure_ttm_table(ttm_table).await?;
        }

        // * Dropping the transaction on error rolls back both inserts
        let mut tx = self.pool.begin().await?;
        let rows = insert_rows(&mut tx, &statement.rows, table).await?;
        let ttm_rows = if statement.ttm_rows.is_empty() {
            0
        } else {
            insert_ttm_rows(&mut tx, &statement.ttm_rows, ttm_table).await?
        };
        tx.commit().await?;

        info!(table, ttm_table, rows, ttm_rows, "Data loaded successfully");
        Ok((rows, ttm_rows))
    }

    /// Reads back all long-form rows in insertion order
    pub async fn load(&self, table: &str) -> Result<Vec<LongFinancialRow>, PersistError> {
        let sql = format!(
            "SELECT \"Narration\", company_name, \"Year\", \"Value\" FROM {} ORDER BY id",
            quoted(table)?
        );
        let rows: Vec<(String, String, String, String)> =
            sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(narration, company_name, year, value)| LongFinancialRow {
                narration,
                company_name,
                year,
                value: CellValue::from_stored(&value),
            })
            .collect())
    }

    /// Reads back all TTM rows in insertion order
    pub async fn load_ttm(&self, table: &str) -> Result<Vec<TtmRow>, PersistError> {
        let sql = format!(
            "SELECT \"Narration\", company_name, \"TTM\" FROM {} ORDER BY id",
            quoted(table)?
        );
        let rows: Vec<(String, String, String)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(narration, company_name, ttm)| TtmRow {
                narration,
                company_name,
                ttm: CellValue::from_stored(&ttm),
            })
            .collect())
    }

    /// Column names of a table, in declaration order
    pub async fn table_columns(&self, table: &str) -> Result<Vec<String>, PersistError> {
        let sql = format!("PRAGMA table_info({})", quoted(table)?);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(PersistError::from))
            .collect()
    }
}

async fn insert_rows(
    conn: &mut SqliteConnection,
    rows: &[LongFinancialRow],
    table: &str,
) -> Result<u64, PersistError> {
    let sql = format!(
        "INSERT INTO {} (\"Narration\", company_name, \"Year\", \"Value\") VALUES (?1, ?2, ?3, ?4)",
        quoted(table)?
    );

    let mut written = 0;
    for row in rows {
        written += sqlx::query(&sql)
            .bind(&row.narration)
            .bind(&row.company_name)
            .bind(&row.year)
            .bind(row.value.to_string())
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }
    Ok(written)
}

async fn insert_ttm_rows(conn: &mut SqliteConnection, rows: &[TtmRow], table: &str) -> Result<u64, PersistError> {
    let sql = format!(
        "INSERT INTO {} (\"Narration\", company_name, \"TTM\") VALUES (?1, ?2, ?3)",
        quoted(table)?
    );

    let mut written = 0;
    for row in rows {
        written += sqlx::query(&sql)
            .bind(&row.narration)
            .bind(&row.company_name)
            .bind(row.ttm.to_string())
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("financials").is_ok());
        assert!(validate_table_name("_pl_2024").is_ok());
        assert!(validate_table_name("2024_pl").is_err());
        assert!(validate_table_name("fin; DROP TABLE x").is_err());
        assert!(validate_table_name("").is_err());
    }

    #[tokio::test]
    async fn test_schema_creation_is_idempotent() {
        let store = StatementStore::in_memory().await.unwrap();
        store.ensure_table("financials").await.unwrap();
        let before = store.table_columns("financials").await.unwrap();

        store.ensure_table("financials").await.unwrap();
        let after = store.table_columns("financials").await.unwrap();

        assert_eq!(before, vec!["id", "Narration", "company_name", "Year", "Value"]);
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_persist_appends_in_order() {
        let store = StatementStore::in_memory().await.unwrap();
        let first = vec![LongFinancialRow::new("Sales", "Acme", "2022", 100.0)];
        let second = vec![
            LongFinancialRow::new("Sales", "Beta", "2022", 7.5),
            LongFinancialRow::new("OPM", "Beta", "2022", "N/A"),
        ];

        assert_eq!(store.persist(&first, "financials").await.unwrap(), 1);
        assert_eq!(store.persist(&second, "financials").await.unwrap(), 2);

        let loaded = store.load("financials").await.unwrap();
        let mut expected = first.clone();
        expected.extend(second);
        assert_eq!(loaded, expected);
    }

    #[tokio::test]
    async fn test_invalid_table_name_rejected() {
        let store = StatementStore::in_memory().await.unwrap();
        let result = store.persist(&[], "bad name").await;
        assert!(matches!(result, Err(PersistError::InvalidTableName(_))));
    }

    #[tokio::test]
    async fn test_empty_ttm_batch_writes_nothing() {
        let store = StatementStore::in_memory().await.unwrap();
        assert_eq!(store.persist_ttm(&[], "financials_ttm").await.unwrap(), 0);
        assert!(store.load_ttm("financials_ttm").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persist_statement_is_all_or_nothing() {
        let store = StatementStore::in_memory().await.unwrap();
        // * TTM table exists with an incompatible schema
        sqlx::query("CREATE TABLE financials_ttm (x TEXT)")
            .execute(store.pool())
            .await
            .unwrap();

        let statement = ReshapedStatement {
            rows: vec![LongFinancialRow::new("Sales", "Acme", "2023", 10.0)],
            ttm_rows: vec![TtmRow::new("Sales", "Acme", 12.0)],
        };
        let result = store.persist_statement(&statement, "financials", "financials_ttm").await;

        assert!(matches!(result, Err(PersistError::Database(_))));
        assert!(store.load("financials").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persist_statement_writes_both_sets() {
        let store = StatementStore::in_memory().await.unwrap();
        let statement = ReshapedStatement {
            rows: vec![
                LongFinancialRow::new("Sales", "Acme", "2022", 9.0),
                LongFinancialRow::new("Sales", "Acme", "2023", 10.0),
            ],
            ttm_rows: vec![TtmRow::new("Sales", "Acme", 12.0)],
        };

        let written = store.persist_statement(&statement, "financials", "financials_ttm").await.unwrap();

        assert_eq!(written, (2, 1));
        assert_eq!(store.load("financials").await.unwrap(), statement.rows);
        assert_eq!(store.load_ttm("financials_ttm").await.unwrap(), statement.ttm_rows);
    }
}
