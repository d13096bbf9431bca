//! Document tree error types

use thiserror::Error;

/// Tree operation result type
pub type DomResult<T> = Result<T, DomError>;

/// Tree operation errors
#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}
