pub mod auth;
pub mod client;
pub mod errors;
pub mod identity;

pub use auth::{extract_form_token, Authenticator, LoginEndpoints, Session};
pub use client::{Pause, PauseFuture, RetryPolicy, StatementClient, TokioPause};
pub use errors::NetworkError;
pub use identity::IdentityProfile;
