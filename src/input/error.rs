//! Error type for mapper operations

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the control mapper and binding table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapperError {
    /// The binding table could not be read in time; resolving without it
    /// would silently drop every binding.
    #[error("binding table lock unavailable after {0:?}")]
    BindingsUnavailable(Duration),

    /// A mapping in text form could not be parsed
    #[error("invalid input mapping: {0:?}")]
    InvalidMapping(String),

    /// A chord in text form could not be parsed
    #[error("invalid chord: {0:?}")]
    InvalidChord(String),

    /// An output name could not be resolved
    #[error("unknown output: {0:?}")]
    UnknownOutput(String),
}

/// Result type for mapper operations
pub type MapperResult<T> = Result<T, MapperError>;
