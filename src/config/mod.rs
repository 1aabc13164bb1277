pub mod constants;
pub mod settings;

pub use settings::{Cli, ConfigError, Credentials, LogFormat, Settings};
