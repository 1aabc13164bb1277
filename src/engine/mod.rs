pub mod pipeline;
pub mod roster;
pub mod urls;

pub use pipeline::{run, CompanyOutcome, Pipeline, RunError};
pub use roster::{load_roster, parse_roster, RosterError};
pub use urls::{candidate_urls, normalize_url};
