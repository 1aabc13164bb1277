// * Configuration Constants
// * Central location for site defaults, retry policy and storage names

use std::time::Duration;

// * Site root used to build company statement URLs
pub const DEFAULT_BASE_URL: &str = "https://www.screener.in";

// * Anchor id of the profit & loss statement section
pub const DEFAULT_SECTION_ID: &str = "profit-loss";

// * Retry policy: constant delay, no exponential backoff
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

// * Per-request timeout
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// * Destination tables
pub const DEFAULT_TABLE: &str = "financials";
pub const DEFAULT_TTM_TABLE: &str = "financials_ttm";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://financials.db";

// * Input roster
pub const DEFAULT_ROSTER_PATH: &str = "company.csv";
pub const ROSTER_SYMBOL_COLUMN: &str = "Symbol";
pub const ROSTER_NAME_COLUMN: &str = "Company Name";

// * Login form
pub const LOGIN_PATH: &str = "login/";
pub const DASHBOARD_PATH: &str = "dash/";
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";

// * Column labels with special meaning in the statement table
pub const NARRATION_COLUMN: &str = "Narration";
pub const TTM_COLUMN: &str = "TTM";
pub const ID_COLUMN: &str = "id";

// * Sentinel labels for aggregate rows/columns (compared case-insensitively)
pub const AGGREGATE_MARKERS: [&str; 2] = ["TTL", "Total"];
