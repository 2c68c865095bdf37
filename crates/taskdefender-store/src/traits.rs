//! Store trait definitions

use crate::StoreResult;

/// Local key-value storage holding string values.
///
/// Writes replace the whole value under a key; there is no partial update.
pub trait Storage: Send + Sync {
    /// Value stored under `key`, if any
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> StoreResult<()>;

    /// Check if storage is healthy
    fn is_healthy(&self) -> bool;
}
