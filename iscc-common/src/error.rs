//! Common error types for the ISCC crates

use thiserror::Error;

use crate::units::ComputationError;

/// Common result type for ISCC operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the service and the batch tool
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input, e.g. a malformed code string
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// One of the unit computations failed
    #[error("Computation error: {0}")]
    Computation(#[from] ComputationError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
