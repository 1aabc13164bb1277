use thiserror::Error;

// * Unified Error type for the Network Layer.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to fetch {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },

    #[error("Anti-forgery token '{0}' not found on login page")]
    MissingToken(String),

    #[error("Login rejected: landed on {landed_on}")]
    LoginRejected { landed_on: String },

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid URL")]
    InvalidUrl,
}
