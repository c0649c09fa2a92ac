use serde_json::Value;
use thiserror::Error;

/// Errors raised by a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt value under key '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Write rejected for key '{0}'")]
    WriteRejected(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable key/value storage of JSON values.
///
/// Calls are synchronous from the caller's point of view. There is no
/// transaction across keys: callers order their writes so that a failure
/// part way through leaves stale but readable state.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Overwrite the value stored under `key`
    fn set(&self, key: &str, value: &Value) -> StoreResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}
