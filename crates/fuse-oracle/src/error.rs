//! Oracle configuration error types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("Oracle schedule is empty")]
    EmptySchedule,

    #[error("Oracle schedule not strictly ascending at block {0}")]
    UnorderedSchedule(u64),

    #[error("Invalid protocol configuration: {0}")]
    InvalidConfig(String),
}

pub type OracleResult<T> = Result<T, OracleError>;
