//! Error types.
//!
//! Only input problems surface as errors. A solver that cannot find a
//! feasible roster is not an error: it is reported through
//! [`GenerationResult`](crate::scheduler::GenerationResult) with
//! `success = false`. Validators never fail; they return violation lists.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::MonthKey;

/// Errors raised before a roster model is built.
///
/// Configuration problems are reported separately as [`ConfigError`].
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("invalid month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("day {day} does not exist in {month}")]
    InvalidDate { month: MonthKey, day: u32 },

    #[error("invalid month key '{0}', expected YYYY-MM")]
    InvalidMonthKey(String),

    #[error("unknown employee id {0}")]
    UnknownEmployee(u32),

    #[error("a month has 28 to 31 days, got {0}")]
    InvalidMonthLength(u32),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
