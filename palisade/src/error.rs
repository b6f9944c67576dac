// palisade/src/error.rs
//
// Library error type. Only construction and config loading are fallible;
// evaluation itself always completes (malformed input is scored evidence,
// internal faults fail the assessment closed).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
