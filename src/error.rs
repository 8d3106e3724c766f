// Error types for engine construction.
//
// Classification itself never fails. Everything that can go wrong happens
// while a configuration is parsed, validated and compiled into rules, so
// these errors are only ever returned from constructors.

use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid baseline: {0} is outside [0, 100]")]
    InvalidBaseline(i32),

    #[error("Invalid threshold for {age_group}: {value} is outside [0, 100]")]
    InvalidThreshold { age_group: String, value: i32 },

    #[error("Threshold ordering violated: {stricter} ({stricter_value}) must not be below {looser} ({looser_value})")]
    NonMonotoneThresholds {
        stricter: String,
        stricter_value: i32,
        looser: String,
        looser_value: i32,
    },

    #[error("Empty blocklist term for {0}")]
    EmptyTerm(String),

    #[error("Empty trusted channel entry")]
    EmptyTrustedChannel,

    #[error("Invalid weight for {name}: {reason}")]
    InvalidWeight { name: String, reason: String },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unknown age group code: {0}")]
    UnknownAgeGroup(String),
}

/// Parse Errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Root error type for the crate.
#[derive(Debug, Error)]
pub enum GuardianError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

pub type GuardianResult<T> = Result<T, GuardianError>;
