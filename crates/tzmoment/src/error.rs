//! Error types for moment operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MomentError {
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Shift has no fixed duration: {0}")]
    UnrepresentableShift(String),
}

pub type Result<T> = std::result::Result<T, MomentError>;
