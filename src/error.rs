//! Unified error type.

use crate::method::Method;
use crate::storage::StorageError;

/// The error type returned by margin's fallible operations.
///
/// Application-level outcomes (404, 400) are expressed as
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// registration mistakes, collaborator failures and infrastructure failures.
/// A handler returning `Err` is answered with the fixed `500`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("route {method} {pattern} is already registered")]
    DuplicateRoute { method: Method, pattern: String },

    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("config: {0}")]
    Config(String),
}
