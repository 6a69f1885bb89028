//! Error types for the lintel core.
//!
//! Only *API misuse* surfaces as an error: problems in the JavaScript input
//! itself are reported through [`crate::diag`] and never fail the pipeline.

use thiserror::Error;

/// All errors that can be produced by the lintel core.
#[derive(Debug, Error)]
pub enum LintelError {
    /// A text replacement range ended before it started.
    #[error("replacement range ends before it starts")]
    BackwardsRange,
}

/// Convenient `Result` alias for fallible lintel operations.
pub type LintelResult<T> = Result<T, LintelError>;
