//! # Error Taxonomy
//!
//! The four-way error split the store surfaces at every boundary:
//! validation (bad input, rejected before the mutex is acquired),
//! not-found (a normal control path, never logged as an error),
//! I/O (a WAL append/flush/rename failure; in-memory state is left
//! untouched), and internal (an invariant violation that should never
//! happen).

use std::fmt;

/// Result type used throughout the store core and its adapters.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the store core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller-supplied input failed validation (empty key, non-positive TTL, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested key is absent or has expired.
    #[error("not found")]
    NotFound,

    /// A write-ahead-log append, flush, or rename failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal invariant was violated. Should never happen; if it
    /// does, the caller should log it and keep serving other requests.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short machine-readable tag for the error family, used by HTTP
    /// adapters to pick a status code and populate error bodies.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound => ErrorKind::NotFound,
            Error::Io(_) => ErrorKind::Io,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// The error family, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Io,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Io => "io",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}
