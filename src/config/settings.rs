// * Runtime Settings
// * CLI flags with environment fallbacks, resolved once into an explicit Settings value

use crate::config::constants::{
    DEFAULT_BASE_URL, DEFAULT_DATABASE_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY,
    DEFAULT_ROSTER_PATH, DEFAULT_SECTION_ID, DEFAULT_TABLE, DEFAULT_TTM_TABLE,
};
use clap::{ArgAction, Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("max attempts must be at least 1")]
    InvalidAttempts,

    #[error("--login requires both a username and a password")]
    MissingCredentials,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Command line interface
#[derive(Debug, Clone, Parser)]
#[command(name = "statement-flow", version, about = "Scrape company financial statements into SQL tables")]
pub struct Cli {
    /// CSV roster with `Symbol` and `Company Name` columns
    #[arg(long, env = "STATEMENT_ROSTER", default_value = DEFAULT_ROSTER_PATH)]
    pub roster: PathBuf,

    /// Destination database connection string
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Destination table for long-form statement rows
    #[arg(long, env = "STATEMENT_TABLE", default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Destination table for trailing-twelve-month rows
    #[arg(long, env = "STATEMENT_TTM_TABLE", default_value = DEFAULT_TTM_TABLE)]
    pub ttm_table: String,

    /// Site root used to build company URLs
    #[arg(long, env = "STATEMENT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Id of the section holding the statement table
    #[arg(long, env = "STATEMENT_SECTION", default_value = DEFAULT_SECTION_ID)]
    pub section: String,

    /// Total fetch attempts per URL
    #[arg(long, env = "STATEMENT_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Constant delay between fetch attempts, in seconds
    #[arg(long, env = "STATEMENT_RETRY_DELAY_SECS", default_value_t = DEFAULT_RETRY_DELAY.as_secs())]
    pub retry_delay_secs: u64,

    /// Log in before scraping
    #[arg(long, env = "STATEMENT_LOGIN", default_value_t = false)]
    pub login: bool,

    #[arg(long, env = "STATEMENT_USERNAME", default_value = "")]
    pub username: String,

    #[arg(long, env = "STATEMENT_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Split the TTM column into its own table
    #[arg(long, env = "STATEMENT_SPLIT_TTM", action = ArgAction::Set, default_value_t = true)]
    pub split_ttm: bool,

    #[arg(long, env = "STATEMENT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

/// Login credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// * Never print the password
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Fully resolved settings threaded through every pipeline stage
#[derive(Debug, Clone)]
pub struct Settings {
    pub roster_path: PathBuf,
    pub database_url: String,
    pub table: String,
    pub ttm_table: String,
    pub base_url: Url,
    pub section_id: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub credentials: Option<Credentials>,
    pub split_ttm: bool,
    pub log_format: LogFormat,
}

impl Settings {
    /// Loads `.env` (if present) and parses the process arguments
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_cli(Cli::parse())
    }

    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let base_url =
            Url::parse(cli.base_url.trim()).map_err(|_| ConfigError::InvalidBaseUrl(cli.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl(cli.base_url));
        }

        if cli.max_attempts == 0 {
            return Err(ConfigError::InvalidAttempts);
        }

        let credentials = if cli.login {
            if cli.username.trim().is_empty() || cli.password.is_empty() {
                return Err(ConfigError::MissingCredentials);
            }
            Some(Credentials::new(cli.username.trim(), cli.password))
        } else {
            None
        };

        Ok(Self {
            roster_path: cli.roster,
            database_url: cli.database_url,
            table: cli.table,
            ttm_table: cli.ttm_table,
            base_url,
            section_id: cli.section,
            max_attempts: cli.max_attempts,
            retry_delay: Duration::from_secs(cli.retry_delay_secs),
            credentials,
            split_ttm: cli.split_ttm,
            log_format: cli.log_format,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            roster_path: PathBuf::from(DEFAULT_ROSTER_PATH),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            table: DEFAULT_TABLE.to_string(),
            ttm_table: DEFAULT_TTM_TABLE.to_string(),
            base_url: Url::parse(DEFAULT_BASE_URL).expect("! CRITICAL: Invalid default base URL"),
            section_id: DEFAULT_SECTION_ID.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            credentials: None,
            split_ttm: true,
            log_format: LogFormat::Json,
        }
    }
}
