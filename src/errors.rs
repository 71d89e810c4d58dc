use thiserror::Error;

use daybook_config::ConfigError;
use daybook_core::CoreError;

/// Failures surfaced by the command line front-end.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}\n\n{usage}", usage = crate::cli::USAGE)]
    Usage(String),
    #[error("Invalid date `{0}`; expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Customer `{0}` not found")]
    UnknownCustomer(String),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
