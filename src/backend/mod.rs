//! Storage engine backends.
//!
//! A backend is any embedded engine that can keep byte keys sorted by
//! [`crate::encoding::compare_keys`] and hand out a [`RawCursor`] over them.
//! The table facade and the range cursor protocol are written once against
//! this trait.

use crate::config::StoreConfig;
use crate::cursor::RawCursor;
use std::path::Path;

pub mod memory;
pub mod redb;

pub use self::memory::MemoryBackend;
pub use self::redb::RedbBackend;

/// Errors specific to the backend layer.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Failure reported by the redb engine
    #[error("redb: {0}")]
    Redb(#[from] ::redb::Error),

    /// Filesystem failure while managing backend files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cursor used after `close()`
    #[error("Cursor is closed")]
    CursorClosed,
}

impl BackendError {
    pub(crate) fn redb(err: impl Into<::redb::Error>) -> Self {
        BackendError::Redb(err.into())
    }
}

/// A single buffered write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl BatchOp {
    pub fn key(&self) -> &[u8] {
        match self {
            BatchOp::Put { key, .. } | BatchOp::Delete { key } => key,
        }
    }
}

/// What the core requires from a storage engine.
///
/// Single-key operations are individually atomic. `write_batch` applies all
/// operations atomically or none of them.
pub trait Backend: Send + Sync + Sized + 'static {
    type Cursor: RawCursor;

    /// Opens (creating if needed) the store at `path`.
    fn open(path: &Path, config: &StoreConfig) -> Result<Self, BackendError>;

    /// Removes the store at `path`. Missing stores are not an error.
    fn destroy(path: &Path) -> Result<(), BackendError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), BackendError>;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BackendError>;

    /// Removes `key`. Deleting a missing key is a no-op.
    fn delete(&self, key: &[u8]) -> Result<(), BackendError>;

    /// Opens a cursor that owns its own read handle.
    fn cursor(&self) -> Result<Self::Cursor, BackendError>;

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), BackendError>;
}
