//! Typed hash/range table facade.
//!
//! A [`Table`] encodes typed keys and values through its codecs and hands the
//! bytes to a [`Backend`]. Reads come back as lazily decoded [`Row`]s.
//!
//! Scans are confined to one hash key. `from` and `to` are inclusive range
//! key bounds; for reverse scans `from` is the upper bound.

use crate::backend::Backend;
use crate::codec::{Codec, TableCodecs};
use crate::cursor::range::{seek_latest, ScanBounds};
use crate::cursor::{Direction, RawCursor, RowIter};
use crate::encoding::key::encode_row_key;
use crate::error::{Error, Result};
use crate::row::Row;
use bytes::Bytes;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

pub mod batch;

pub use batch::Batch;

/// Row iterator returned by table scans.
pub type TableIter<B, H, R, V> = RowIter<<B as Backend>::Cursor, H, R, V>;

/// A hash/range keyed table over backend `B`.
///
/// Handles are cheap to share behind an `Arc`; all methods take `&self`.
pub struct Table<B: Backend, H: Codec, R: Codec, V: Codec> {
    name: String,
    backend: RwLock<Option<Arc<B>>>,
    codecs: Arc<TableCodecs<H, R, V>>,
}

impl<B: Backend, H: Codec, R: Codec, V: Codec> Table<B, H, R, V> {
    /// Wraps an open backend.
    pub fn new(name: impl Into<String>, backend: Arc<B>, codecs: TableCodecs<H, R, V>) -> Self {
        let name = name.into();
        tracing::debug!(table = %name, codecs = ?codecs, "table opened");
        Self {
            name,
            backend: RwLock::new(Some(backend)),
            codecs: Arc::new(codecs),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn codecs(&self) -> &TableCodecs<H, R, V> {
        &self.codecs
    }

    fn backend(&self) -> Result<Arc<B>> {
        self.backend
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| Error::closed(format!("table {}", self.name)))
    }

    pub(crate) fn encode_hash(&self, hash: &H::Item) -> Result<Vec<u8>> {
        Ok(self.codecs.hash.encode(hash)?)
    }

    pub(crate) fn encode_range(&self, range: Option<&R::Item>) -> Result<Option<Vec<u8>>> {
        match range {
            Some(range) => Ok(Some(self.codecs.range.encode(range)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn encode_row(&self, hash: &H::Item, range: Option<&R::Item>) -> Result<Vec<u8>> {
        let hash = self.encode_hash(hash)?;
        let range = self.encode_range(range)?;
        Ok(encode_row_key(&hash, range.as_deref())?)
    }

    /// Inserts or overwrites a row.
    pub fn put(&self, hash: &H::Item, range: Option<&R::Item>, value: &V::Item) -> Result<()> {
        let backend = self.backend()?;
        let key = self.encode_row(hash, range)?;
        let value = self.codecs.value.encode(value)?;
        backend.put(&key, &value)?;
        Ok(())
    }

    /// Reads the value stored under `(hash, range)`.
    pub fn get(&self, hash: &H::Item, range: Option<&R::Item>) -> Result<Option<V::Item>> {
        let backend = self.backend()?;
        let key = self.encode_row(hash, range)?;
        match backend.get(&key)? {
            Some(bytes) => Ok(Some(self.codecs.value.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, hash: &H::Item, range: Option<&R::Item>) -> Result<bool> {
        let backend = self.backend()?;
        let key = self.encode_row(hash, range)?;
        Ok(backend.get(&key)?.is_some())
    }

    /// Removes a row. Removing a missing row is a no-op.
    pub fn delete(&self, hash: &H::Item, range: Option<&R::Item>) -> Result<()> {
        let backend = self.backend()?;
        let key = self.encode_row(hash, range)?;
        backend.delete(&key)?;
        Ok(())
    }

    /// Scans the rows of `hash` between the inclusive bounds `from` and `to`.
    ///
    /// A `from` that lies past `to` in scan order yields an empty iterator
    /// without touching the backend.
    pub fn scan(
        &self,
        hash: &H::Item,
        from: Option<&R::Item>,
        to: Option<&R::Item>,
        direction: Direction,
    ) -> Result<TableIter<B, H, R, V>> {
        let backend = self.backend()?;
        let bounds = ScanBounds {
            hash: self.encode_hash(hash)?,
            from: self.encode_range(from)?,
            to: self.encode_range(to)?,
            direction,
        };
        if bounds.is_empty() {
            return Ok(RowIter::empty(Arc::clone(&self.codecs)));
        }
        RowIter::open(backend.cursor()?, bounds, Arc::clone(&self.codecs))
    }

    /// All rows of `hash` in ascending range-key order.
    pub fn range(&self, hash: &H::Item) -> Result<TableIter<B, H, R, V>> {
        self.scan(hash, None, None, Direction::Forward)
    }

    pub fn range_from(&self, hash: &H::Item, from: &R::Item) -> Result<TableIter<B, H, R, V>> {
        self.scan(hash, Some(from), None, Direction::Forward)
    }

    pub fn range_between(
        &self,
        hash: &H::Item,
        from: Option<&R::Item>,
        to: &R::Item,
    ) -> Result<TableIter<B, H, R, V>> {
        self.scan(hash, from, Some(to), Direction::Forward)
    }

    /// All rows of `hash` in descending range-key order.
    pub fn range_reverse(&self, hash: &H::Item) -> Result<TableIter<B, H, R, V>> {
        self.scan(hash, None, None, Direction::Reverse)
    }

    pub fn range_reverse_from(
        &self,
        hash: &H::Item,
        from: &R::Item,
    ) -> Result<TableIter<B, H, R, V>> {
        self.scan(hash, Some(from), None, Direction::Reverse)
    }

    pub fn range_reverse_between(
        &self,
        hash: &H::Item,
        from: Option<&R::Item>,
        to: &R::Item,
    ) -> Result<TableIter<B, H, R, V>> {
        self.scan(hash, from, Some(to), Direction::Reverse)
    }

    /// Row with the largest range key at or below `range`.
    ///
    /// When no such row exists the smallest range key above `range` is
    /// returned instead. Without `range` this is the last row of `hash`.
    pub fn get_latest(
        &self,
        hash: &H::Item,
        range: Option<&R::Item>,
    ) -> Result<Option<Row<H, R, V>>> {
        let Some(range) = range else {
            return first_row(self.range_reverse(hash)?);
        };

        let backend = self.backend()?;
        let hash = self.encode_hash(hash)?;
        let range = self.codecs.range.encode(range)?;

        let mut cursor = backend.cursor()?;
        let found = seek_latest(&mut cursor, &hash, &range);
        cursor.close();

        Ok(found?.map(|(key, value)| {
            Row::new(Bytes::from(key), Bytes::from(value), Arc::clone(&self.codecs))
        }))
    }

    /// First row of `hash` with a range key at or after `range`.
    pub fn get_next(&self, hash: &H::Item, range: &R::Item) -> Result<Option<Row<H, R, V>>> {
        first_row(self.range_from(hash, range)?)
    }

    /// First row of `hash` with a range key at or before `range`.
    pub fn get_prev(&self, hash: &H::Item, range: &R::Item) -> Result<Option<Row<H, R, V>>> {
        first_row(self.range_reverse_from(hash, range)?)
    }

    /// Deletes every row of `hash` between the inclusive bounds.
    ///
    /// Rows are collected by a scan and removed in one batch. The scan and
    /// the batch are not isolated from concurrent writers.
    pub fn delete_range(
        &self,
        hash: &H::Item,
        from: Option<&R::Item>,
        to: Option<&R::Item>,
    ) -> Result<usize> {
        let mut batch = self.new_batch()?;
        let mut iter = self.scan(hash, from, to, Direction::Forward)?;
        while iter.has_next()? {
            let row = iter.next_row()?;
            batch.delete_raw(row.raw_key().to_vec());
        }
        iter.close();

        let deleted = batch.len();
        batch.flush()?;
        batch.close();

        tracing::debug!(table = %self.name, deleted, "deleted range");
        Ok(deleted)
    }

    /// Starts a write batch.
    ///
    /// Range keys are optional per operation, so the same batch serves rows
    /// with and without a range key.
    pub fn new_batch(&self) -> Result<Batch<'_, B, H, R, V>> {
        self.backend()?;
        Ok(Batch::new(self))
    }

    /// Releases the backend. Every later operation fails with [`Error::Closed`].
    pub fn close(&self) {
        if self.backend.write().take().is_some() {
            tracing::debug!(table = %self.name, "table closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.backend.read().is_none()
    }

    pub(crate) fn write_batch(&self, ops: Vec<crate::backend::BatchOp>) -> Result<()> {
        self.backend()?.write_batch(ops)?;
        Ok(())
    }
}

impl<B: Backend, H: Codec, R: Codec, V: Codec> fmt::Debug for Table<B, H, R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .field("codecs", &self.codecs)
            .finish()
    }
}

fn first_row<C: RawCursor, H: Codec, R: Codec, V: Codec>(
    mut iter: RowIter<C, H, R, V>,
) -> Result<Option<Row<H, R, V>>> {
    let row = match iter.has_next()? {
        true => Some(iter.next_row()?),
        false => None,
    };
    iter.close();
    Ok(row)
}
