//! Engine error types
//!
//! Failures inside a suggestion source are swallowed at the source
//! boundary and turned into "no result"; these types exist so the
//! transport and host seams have something structured to return before
//! that happens.

use thiserror::Error;

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Network error or non-success response from the completion/fix
    /// backend
    #[error("Transport failure: {0}")]
    Transport(String),

    /// No authentication token available; short-circuits before any
    /// cache or network work
    #[error("Authentication unavailable")]
    AuthUnavailable,

    /// The editor host could not serve a narrow-interface call
    #[error("Host error: {0}")]
    Host(String),

    /// The request was cancelled; not a failure, the result is simply
    /// discarded
    #[error("Request cancelled")]
    Cancelled,
}

/// Re-export commonly used Result type
pub type Result<T> = std::result::Result<T, EngineError>;
