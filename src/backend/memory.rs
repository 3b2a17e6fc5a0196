//! In-memory sorted map backend.
//!
//! Keys live in a `BTreeMap` ordered by the composite comparator. It is the
//! reference model the other backends are checked against.
//!
//! The map sits behind an `Arc` that writers update copy-on-write, so a
//! cursor reads the snapshot taken when it was opened, like a redb read
//! transaction.

use super::{Backend, BackendError, BatchOp};
use crate::config::StoreConfig;
use crate::cursor::{Entry, RawCursor};
use crate::encoding::compare::compare_keys;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

/// Map key ordered by [`compare_keys`] instead of raw bytes.
#[derive(Debug, Clone)]
struct OrderedKey(Vec<u8>);

impl PartialEq for OrderedKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedKey {}

impl PartialOrd for OrderedKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_keys(&self.0, &other.0)
    }
}

type Map = BTreeMap<OrderedKey, Vec<u8>>;

/// In-memory backend. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<Arc<Map>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Backend for MemoryBackend {
    type Cursor = MemoryCursor;

    fn open(_path: &Path, _config: &StoreConfig) -> Result<Self, BackendError> {
        Ok(Self::new())
    }

    fn destroy(_path: &Path) -> Result<(), BackendError> {
        Ok(())
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), BackendError> {
        let mut data = self.data.write();
        Arc::make_mut(&mut *data).insert(OrderedKey(key.to_vec()), value.to_vec());
        Ok(())
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(self.data.read().get(&OrderedKey(key.to_vec())).cloned())
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn delete(&self, key: &[u8]) -> Result<(), BackendError> {
        let mut data = self.data.write();
        Arc::make_mut(&mut *data).remove(&OrderedKey(key.to_vec()));
        Ok(())
    }

    fn cursor(&self) -> Result<MemoryCursor, BackendError> {
        Ok(MemoryCursor {
            snapshot: Some(Arc::clone(&*self.data.read())),
            current: None,
        })
    }

    #[tracing::instrument(level = "trace", skip_all, fields(ops = ops.len()))]
    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), BackendError> {
        let mut guard = self.data.write();
        // Copied at most once per batch while cursors hold the old snapshot
        let data = Arc::make_mut(&mut *guard);
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    data.insert(OrderedKey(key), value);
                }
                BatchOp::Delete { key } => {
                    data.remove(&OrderedKey(key));
                }
            }
        }
        Ok(())
    }
}

/// Cursor over a snapshot of a [`MemoryBackend`].
///
/// Writes committed after the cursor was opened are not visible to it. The
/// position is an owned copy of the current entry and every move re-seeks
/// relative to it.
pub struct MemoryCursor {
    snapshot: Option<Arc<Map>>,
    current: Option<Entry>,
}

impl MemoryCursor {
    fn snapshot(&self) -> Result<&Map, BackendError> {
        self.snapshot.as_deref().ok_or(BackendError::CursorClosed)
    }

    fn first_in(&mut self, lower: Bound<OrderedKey>) -> Result<(), BackendError> {
        self.current = self
            .snapshot()?
            .range((lower, Bound::Unbounded))
            .next()
            .map(|(key, value)| (key.0.clone(), value.clone()));
        Ok(())
    }

    fn last_in(&mut self, upper: Bound<OrderedKey>) -> Result<(), BackendError> {
        self.current = self
            .snapshot()?
            .range((Bound::Unbounded, upper))
            .next_back()
            .map(|(key, value)| (key.0.clone(), value.clone()));
        Ok(())
    }
}

impl RawCursor for MemoryCursor {
    fn seek(&mut self, key: &[u8]) -> Result<(), BackendError> {
        self.first_in(Bound::Included(OrderedKey(key.to_vec())))
    }

    fn seek_to_first(&mut self) -> Result<(), BackendError> {
        self.first_in(Bound::Unbounded)
    }

    fn seek_to_last(&mut self) -> Result<(), BackendError> {
        self.last_in(Bound::Unbounded)
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
        match self.current.take() {
            Some((key, _)) => self.first_in(Bound::Excluded(OrderedKey(key))),
            None => Ok(()),
        }
    }

    fn retreat(&mut self) -> Result<(), BackendError> {
        match self.current.take() {
            Some((key, _)) => self.last_in(Bound::Excluded(OrderedKey(key))),
            None => Ok(()),
        }
    }

    fn close(&mut self) {
        self.snapshot = None;
        self.current = None;
    }
}
