use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

use crate::dao::storage::StorageError;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Server error code reported when a unique index rejects a write.
const DUPLICATE_KEY_CODE: i32 = 11_000;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to write to collection `{collection}`")]
    Write {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to read from collection `{collection}`")]
    Read {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("duplicate key in collection `{collection}`")]
    DuplicateKey {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("document `{id}` in collection `{collection}` is malformed")]
    InvalidDocument {
        collection: &'static str,
        id: String,
        #[source]
        source: uuid::Error,
    },
}

impl MongoDaoError {
    /// Classify a write failure, separating unique index violations.
    pub fn write(collection: &'static str, source: MongoError) -> Self {
        if is_duplicate_key(&source) {
            MongoDaoError::DuplicateKey { collection, source }
        } else {
            MongoDaoError::Write { collection, source }
        }
    }

    pub fn read(collection: &'static str, source: MongoError) -> Self {
        MongoDaoError::Read { collection, source }
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::DuplicateKey { .. } => StorageError::conflict(err.to_string()),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
