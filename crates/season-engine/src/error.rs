//! Error types for configuration loading and validation.
//!
//! Infeasibility inside the scheduling pipeline is never an error: it surfaces
//! as `Fixture::Unplaced` entries. Only malformed or inconsistent configuration
//! stops a run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid date range '{0}': expected YYYY-MM-DD:YYYY-MM-DD")]
    InvalidDateRange(String),

    #[error("Invalid time '{0}': expected e.g. 5:30pm, 10am or 17:00")]
    InvalidTime(String),

    #[error("Invalid day of week: {0}")]
    InvalidDay(String),

    /// Structural problems found after parsing; all of them, not just the first.
    #[error("Invalid configuration:\n  {}", .0.join("\n  "))]
    Invalid(Vec<String>),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
