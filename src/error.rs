//! Error types for building, encoding and optimizing the digit chain

use crate::search::Direction;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for digit-chain operations
pub type Result<T> = std::result::Result<T, MonadError>;

/// Errors that can occur while building or solving a digit chain
#[derive(Debug, Error)]
pub enum MonadError {
    /// The coefficient table is malformed
    #[error("invalid coefficient table: {0}")]
    InvalidCoefficients(String),

    /// Expression shape the CNF lowering cannot represent exactly
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// The backend reported unsatisfiable or unknown
    #[error("solver failed to {direction} the model number: {reason}")]
    SolverFailure { direction: Direction, reason: String },

    /// The run exceeded its deadline
    #[error("solver timed out after {:.3}s while trying to {direction} the model number", .elapsed.as_secs_f64())]
    Timeout { direction: Direction, elapsed: Duration },

    /// Wrong length or a digit outside 1..=9
    #[error("invalid model number: {0}")]
    InvalidModelNumber(String),

    /// ALU program text could not be parsed or has an unexpected shape
    #[error("line {line}: {message}")]
    Program { line: usize, message: String },

    /// ALU runtime fault
    #[error("ALU execution fault: {0}")]
    Execution(String),

    /// SAT backend misuse or configuration error
    #[error("SAT backend error: {0}")]
    Backend(String),

    /// An optimization run was driven out of order
    #[error("invalid run state: {0}")]
    InvalidState(String),
}
