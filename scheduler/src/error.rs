use thiserror::Error;

/// A configuration that cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown key: {0}")]
    UnknownKey(String),

    #[error("missing value for {0}")]
    MissingValue(String),

    #[error("{key}: `{value}` is not a number")]
    InvalidNumber { key: String, value: String },

    #[error("scheduler is not either rr or fcfs: `{0}`")]
    UnknownPolicy(String),

    #[error("{key} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        key: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("min-ins ({min}) greater than max-ins ({max})")]
    MinAboveMax { min: usize, max: usize },
}
