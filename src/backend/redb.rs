//! redb B-tree backend.
//!
//! Rows live in a single redb table whose key type installs the composite
//! comparator natively, so redb's own ordering is the table's ordering.

use super::{Backend, BackendError, BatchOp};
use crate::config::StoreConfig;
use crate::cursor::{Entry, RawCursor};
use crate::encoding::compare::compare_keys;
use ::redb::{
    AccessGuard, Database, Key, ReadOnlyTable, ReadableDatabase, StorageError,
    TableDefinition, TypeName, Value,
};
use std::cmp::Ordering;
use std::ops::Bound;
use std::path::{Path, PathBuf};

/// redb key type for encoded composite keys.
///
/// Stored bytes are the composite key as-is; only the comparison differs
/// from a plain `&[u8]` key.
#[derive(Debug)]
pub struct CompositeKey;

impl Value for CompositeKey {
    type SelfType<'a>
        = &'a [u8]
    where
        Self: 'a;

    type AsBytes<'a>
        = &'a [u8]
    where
        Self: 'a;

    fn fixed_width() -> Option<usize> {
        None
    }

    fn from_bytes<'a>(data: &'a [u8]) -> Self::SelfType<'a>
    where
        Self: 'a,
    {
        data
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Self::AsBytes<'a>
    where
        Self: 'a,
        Self: 'b,
    {
        value
    }

    fn type_name() -> TypeName {
        TypeName::new("rangekv::CompositeKey")
    }
}

impl Key for CompositeKey {
    fn compare(data1: &[u8], data2: &[u8]) -> Ordering {
        compare_keys(data1, data2)
    }
}

const ROWS: TableDefinition<CompositeKey, &[u8]> = TableDefinition::new("rows");

type RowTable = ReadOnlyTable<CompositeKey, &'static [u8]>;
type RowRange = ::redb::Range<'static, CompositeKey, &'static [u8]>;
type RangeItem = Result<
    (
        AccessGuard<'static, CompositeKey>,
        AccessGuard<'static, &'static [u8]>,
    ),
    StorageError,
>;

fn owned(item: Option<RangeItem>) -> Result<Option<Entry>, BackendError> {
    item.map(|res| res.map(|(key, value)| (key.value().to_vec(), value.value().to_vec())))
        .transpose()
        .map_err(BackendError::redb)
}

/// Backend over a single redb database file.
pub struct RedbBackend {
    db: Database,
    path: PathBuf,
}

impl RedbBackend {
    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write<F>(&self, apply: F) -> Result<(), BackendError>
    where
        F: FnOnce(&mut ::redb::Table<'_, CompositeKey, &'static [u8]>) -> Result<(), StorageError>,
    {
        let txn = self.db.begin_write().map_err(BackendError::redb)?;
        {
            let mut table = txn.open_table(ROWS).map_err(BackendError::redb)?;
            apply(&mut table).map_err(BackendError::redb)?;
        }
        txn.commit().map_err(BackendError::redb)?;
        Ok(())
    }

    fn read_table(&self) -> Result<RowTable, BackendError> {
        let txn = self.db.begin_read().map_err(BackendError::redb)?;
        txn.open_table(ROWS).map_err(BackendError::redb)
    }
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish()
    }
}

impl Backend for RedbBackend {
    type Cursor = RedbCursor;

    fn open(path: &Path, config: &StoreConfig) -> Result<Self, BackendError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut builder = Database::builder();
        if let Some(cache_size) = config.cache_size {
            builder.set_cache_size(cache_size);
        }
        let db = builder.create(path).map_err(BackendError::redb)?;

        let backend = Self {
            db,
            path: path.to_path_buf(),
        };
        // Create the table up front so read transactions can always open it
        backend.write(|_| Ok(()))?;

        tracing::debug!(path = %path.display(), "opened redb backend");
        Ok(backend)
    }

    fn destroy(path: &Path) -> Result<(), BackendError> {
        match std::fs::remove_file(path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "destroyed redb backend");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), BackendError> {
        self.write(|table| {
            table.insert(key, value)?;
            Ok(())
        })
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BackendError> {
        let table = self.read_table()?;
        let value = table
            .get(key)
            .map_err(BackendError::redb)?
            .map(|guard| guard.value().to_vec());
        Ok(value)
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn delete(&self, key: &[u8]) -> Result<(), BackendError> {
        self.write(|table| {
            table.remove(key)?;
            Ok(())
        })
    }

    fn cursor(&self) -> Result<RedbCursor, BackendError> {
        Ok(RedbCursor {
            table: Some(self.read_table()?),
            forward: None,
            current: None,
        })
    }

    #[tracing::instrument(level = "trace", skip_all, fields(ops = ops.len()))]
    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), BackendError> {
        self.write(|table| {
            for op in &ops {
                match op {
                    BatchOp::Put { key, value } => {
                        table.insert(key.as_slice(), value.as_slice())?;
                    }
                    BatchOp::Delete { key } => {
                        table.remove(key.as_slice())?;
                    }
                }
            }
            Ok(())
        })
    }
}

/// Cursor over a read snapshot of a [`RedbBackend`].
///
/// The read transaction is held by the table handle and released on
/// `close()` or drop. Consecutive `advance` calls reuse one forward range
/// iterator; any other move re-seeks relative to the owned current key.
pub struct RedbCursor {
    table: Option<RowTable>,
    forward: Option<RowRange>,
    current: Option<Entry>,
}

impl RedbCursor {
    fn table(&self) -> Result<&RowTable, BackendError> {
        self.table.as_ref().ok_or(BackendError::CursorClosed)
    }
}

impl RawCursor for RedbCursor {
    fn seek(&mut self, key: &[u8]) -> Result<(), BackendError> {
        let mut range = self
            .table()?
            .range::<&[u8]>(key..)
            .map_err(BackendError::redb)?;
        self.current = owned(range.next())?;
        self.forward = Some(range);
        Ok(())
    }

    fn seek_to_first(&mut self) -> Result<(), BackendError> {
        let mut range = self
            .table()?
            .range::<&[u8]>(..)
            .map_err(BackendError::redb)?;
        self.current = owned(range.next())?;
        self.forward = Some(range);
        Ok(())
    }

    fn seek_to_last(&mut self) -> Result<(), BackendError> {
        self.forward = None;
        let mut range = self
            .table()?
            .range::<&[u8]>(..)
            .map_err(BackendError::redb)?;
        self.current = owned(range.next_back())?;
        Ok(())
    }

    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn key(&self) -> &[u8] {
        self.current.as_ref().map(|(key, _)| key.as_slice()).unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.current
            .as_ref()
            .map(|(_, value)| value.as_slice())
            .unwrap_or_default()
    }

    fn advance(&mut self) -> Result<(), BackendError> {
        if let Some(range) = self.forward.as_mut() {
            self.current = owned(range.next())?;
            return Ok(());
        }

        let Some((key, _)) = self.current.take() else {
            return Ok(());
        };
        let mut range = self
            .table()?
            .range::<&[u8]>((Bound::Excluded(key.as_slice()), Bound::Unbounded))
            .map_err(BackendError::redb)?;
        self.current = owned(range.next())?;
        self.forward = Some(range);
        Ok(())
    }

    fn retreat(&mut self) -> Result<(), BackendError> {
        self.forward = None;

        let Some((key, _)) = self.current.take() else {
            return Ok(());
        };
        let mut range = self
            .table()?
            .range::<&[u8]>(..key.as_slice())
            .map_err(BackendError::redb)?;
        self.current = owned(range.next_back())?;
        Ok(())
    }

    fn close(&mut self) {
        self.forward = None;
        self.current = None;
        self.table = None;
    }
}
