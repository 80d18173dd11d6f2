//! Crate-wide error type.

use std::path::PathBuf;

pub use crate::parser::error::SpecError;

/// Errors surfaced by parsing, completion and the CLI.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The spec text is malformed.
    #[error("{0}")]
    Spec(#[from] SpecError),

    /// An engine invariant was violated. This indicates a defect in the
    /// engine or in a registered function, never in user input.
    #[error("internal error: {0}")]
    Internal(String),

    /// A function could not be registered or invoked.
    #[error("function registry: {0}")]
    Registry(String),

    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    /// Returns the spec error, if this is one.
    #[must_use]
    pub fn as_spec_error(&self) -> Option<&SpecError> {
        match self {
            Error::Spec(e) => Some(e),
            _ => None,
        }
    }
}
