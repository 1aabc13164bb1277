// * Pipeline - per-company orchestration and the run loop
// * fetch (candidate URLs in order) -> extract -> reshape -> persist, one company at a time

use crate::config::settings::{ConfigError, Credentials, Settings};
use crate::engine::roster::{load_roster, RosterError};
use crate::engine::urls::candidate_urls;
use crate::network::{Authenticator, LoginEndpoints, NetworkError, RetryPolicy, Session, StatementClient};
use crate::ops::telemetry::{RunStats, RunSummary};
use crate::persistence::schema::{CompanyRecord, ReshapedStatement};
use crate::persistence::store::{validate_table_name, PersistError, StatementStore};
use crate::refinery::{NoDataReason, ReshapeOptions, StatementRefinery};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

/// Errors that stop a run before the per-company loop begins
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),
}

/// What happened to one company
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CompanyOutcome {
    /// Rows were appended; `url` is the candidate that produced them
    Persisted { rows: u64, ttm_rows: u64, url: String },
    /// No candidate yielded a usable table
    NoData(NoDataReason),
    /// Every candidate fetch failed
    FetchFailed(String),
    /// The rows were reshaped but could not be written
    PersistFailed(String),
}

impl CompanyOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, CompanyOutcome::Persisted { .. })
    }
}

/// Sequential pipeline over one client, one store and one refinery
pub struct Pipeline {
    client: StatementClient,
    store: StatementStore,
    refinery: StatementRefinery,
    base_url: Url,
    table: String,
    ttm_table: String,
    split_ttm: bool,
    stats: RunStats,
}

impl Pipeline {
    pub fn new(client: StatementClient, store: StatementStore, settings: &Settings) -> Self {
        Self {
            client,
            store,
            refinery: StatementRefinery::new(
                settings.section_id.clone(),
                ReshapeOptions {
                    split_ttm: settings.split_ttm,
                },
            ),
            base_url: settings.base_url.clone(),
            table: settings.table.clone(),
            ttm_table: settings.ttm_table.clone(),
            split_ttm: settings.split_ttm,
            stats: RunStats::new(),
        }
    }

    pub fn store(&self) -> &StatementStore {
        &self.store
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Validates destination names and creates the destination tables
    pub async fn prepare(&self) -> Result<(), PersistError> {
        validate_table_name(&self.table)?;
        self.store.ensure_table(&self.table).await?;

        if self.split_ttm {
            validate_table_name(&self.ttm_table)?;
            self.store.ensure_ttm_table(&self.ttm_table).await?;
        }
        Ok(())
    }

    /// Establishes a session in the client's cookie jar
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, NetworkError> {
        let authenticator = Authenticator::new(LoginEndpoints::for_site(&self.base_url)?);
        authenticator.login(&self.client, credentials).await
    }

    /// Processes one company. Never fails: every error becomes an outcome.
    ///
    /// Candidates are tried in order. A fetch that exhausts its attempts, or a
    /// page without the section or table, moves on to the next candidate. An
    /// empty table ends the company with `NoData`.
    pub async fn process_company(&self, company: &CompanyRecord) -> CompanyOutcome {
        let mut outcome = CompanyOutcome::NoData(NoDataReason::MissingSection);

        for url in candidate_urls(&self.base_url, &company.symbol) {
            let html = match self.client.fetch(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(symbol = %company.symbol, url = %url, "Candidate fetch failed: {}", e);
                    outcome = CompanyOutcome::FetchFailed(e.to_string());
                    continue;
                }
            };

            match self.refinery.process(&html, &company.name) {
                Ok(statement) => return self.persist(company, url, statement).await,
                Err(NoDataReason::EmptyTable) => {
                    warn!(symbol = %company.symbol, url = %url, "Table is empty after header promotion");
                    return CompanyOutcome::NoData(NoDataReason::EmptyTable);
                }
                Err(reason) => {
                    warn!(symbol = %company.symbol, url = %url, %reason, "No statement table on page");
                    outcome = CompanyOutcome::NoData(reason);
                }
            }
        }

        outcome
    }

    // * Both row sets commit together, so a failed company leaves nothing behind
    async fn persist(&self, company: &CompanyRecord, url: String, statement: ReshapedStatement) -> CompanyOutcome {
        match self.store.persist_statement(&statement, &self.table, &self.ttm_table).await {
            Ok((rows, ttm_rows)) => CompanyOutcome::Persisted { rows, ttm_rows, url },
            Err(e) => {
                error!(symbol = %company.symbol, table = %self.table, ttm_table = %self.ttm_table, "Error loading data: {}", e);
                CompanyOutcome::PersistFailed(e.to_string())
            }
        }
    }

    /// Processes the roster in order and returns the run summary
    pub async fn run_roster(&self, roster: &[CompanyRecord]) -> RunSummary {
        for (index, company) in roster.iter().enumerate() {
            debug!(symbol = %company.symbol, position = index + 1, total = roster.len(), "Processing company");

            let outcome = self.process_company(company).await;
            match &outcome {
                CompanyOutcome::Persisted { rows, ttm_rows, url } => {
                    info!(symbol = %company.symbol, url = %url, rows, ttm_rows, "Company persisted");
                    self.stats.record_persisted(*rows, *ttm_rows);
                }
                CompanyOutcome::NoData(reason) => {
                    warn!(symbol = %company.symbol, %reason, "No data for company");
                    self.stats.record_no_data();
                }
                CompanyOutcome::FetchFailed(e) => {
                    error!(symbol = %company.symbol, "Failed to fetch data: {}", e);
                    self.stats.record_fetch_failed();
                }
                CompanyOutcome::PersistFailed(e) => {
                    error!(symbol = %company.symbol, "Failed to persist data: {}", e);
                    self.stats.record_persist_failed();
                }
            }
        }

        let summary = self.stats.summary();
        info!(
            companies = summary.companies,
            persisted = summary.persisted,
            no_data = summary.no_data,
            fetch_failed = summary.fetch_failed,
            persist_failed = summary.persist_failed,
            rows_written = summary.rows_written,
            "Run complete"
        );
        summary
    }
}

/// Full run: startup checks, optional login, then the company loop.
///
/// Errors returned here are fatal-startup errors. Per-company failures are
/// logged and counted in the summary instead.
pub async fn run(settings: &Settings) -> Result<RunSummary, RunError> {
    validate_table_name(&settings.table)?;
    if settings.split_ttm {
        validate_table_name(&settings.ttm_table)?;
    }

    let roster = load_roster(&settings.roster_path)?;
    let store = StatementStore::connect(&settings.database_url).await?;
    let client = StatementClient::new(RetryPolicy::new(settings.max_attempts, settings.retry_delay))?;

    let pipeline = Pipeline::new(client, store, settings);
    pipeline.prepare().await?;

    if let Some(credentials) = &settings.credentials {
        let session = pipeline.login(credentials).await?;
        info!(landed_on = %session.landed_on(), "Logged in");
    }

    Ok(pipeline.run_roster(&roster).await)
}
