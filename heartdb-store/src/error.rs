//! Error types for heartdb-store
//!
//! "Not found" is never an error here: lookups return `Option` and list
//! queries return an empty `Vec`.

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Endpoint unreachable or handshake failed. Not retried.
    #[error("connection to {endpoint} failed: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: mongodb::error::Error,
    },

    /// Surrogate id string is not a 24-character hex ObjectId.
    #[error("malformed object id '{value}': {source}")]
    MalformedId {
        value: String,
        #[source]
        source: bson::oid::Error,
    },

    /// Unique index violated on insert.
    #[error("duplicate key in {collection}: {detail}")]
    Conflict { collection: String, detail: String },

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("failed to encode document: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("failed to decode document: {0}")]
    Decode(#[from] bson::de::Error),
}

impl StoreError {
    pub fn conflict(collection: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Conflict {
            collection: collection.into(),
            detail: detail.into(),
        }
    }

    /// Classify a driver error raised while writing to `collection`.
    pub(crate) fn from_write(collection: &str, err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            Self::conflict(collection, err.to_string())
        } else {
            Self::Database(err)
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY,
        ErrorKind::Command(command) => command.code == DUPLICATE_KEY,
        _ => false,
    }
}
