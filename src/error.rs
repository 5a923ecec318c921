//! Crate-wide error taxonomy.
//!
//! Four failure classes cover the whole panel: a broken catalog source is
//! fatal to session start, storage failures split into missing objects vs.
//! credential/transport problems, and invalid user operations are rejected
//! before any state changes. Binaries and HTTP handlers wrap these in
//! `anyhow`/HTTP codes at the boundary.

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum Error {
    /// The catalog table could not be read or parsed. No partial catalog is
    /// ever served.
    #[error("catalog source error ({path}): {message}")]
    DataSource { path: String, message: String },

    /// A requested object key does not exist in storage.
    #[error("object not found: {0}")]
    NotFound(String),

    /// Credentials, permission, or transport failure talking to storage.
    /// Surfaced immediately, never retried.
    #[error("storage access error: {0}")]
    Access(String),

    /// An operation was rejected; prior state is untouched.
    #[error("invalid operation: {0}")]
    Validation(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => Error::NotFound(key),
            StorageError::Access(message) => Error::Access(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
