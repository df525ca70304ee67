//! Cache-related error types

use thiserror::Error;

/// Cache operation errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid cache capacity: {0}")]
    InvalidCapacity(usize),
}

/// Re-export commonly used Result type
pub type Result<T> = std::result::Result<T, CacheError>;
