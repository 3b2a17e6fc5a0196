//! Buffered write batches.

use super::Table;
use crate::backend::{Backend, BatchOp};
use crate::codec::Codec;
use crate::error::{Error, Result};
use std::fmt;

/// Writes buffered in memory and applied atomically by [`Batch::flush`].
///
/// Nothing is visible to readers before `flush` returns. Operations still
/// buffered when the batch is closed or dropped are discarded.
pub struct Batch<'t, B: Backend, H: Codec, R: Codec, V: Codec> {
    table: &'t Table<B, H, R, V>,
    ops: Vec<BatchOp>,
    closed: bool,
}

impl<'t, B: Backend, H: Codec, R: Codec, V: Codec> Batch<'t, B, H, R, V> {
    pub(crate) fn new(table: &'t Table<B, H, R, V>) -> Self {
        Self {
            table,
            ops: Vec::new(),
            closed: false,
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::closed("batch"));
        }
        Ok(())
    }

    pub fn put(&mut self, hash: &H::Item, range: Option<&R::Item>, value: &V::Item) -> Result<()> {
        self.check_open()?;
        let key = self.table.encode_row(hash, range)?;
        let value = self.table.codecs().value.encode(value)?;
        self.ops.push(BatchOp::Put { key, value });
        Ok(())
    }

    pub fn delete(&mut self, hash: &H::Item, range: Option<&R::Item>) -> Result<()> {
        self.check_open()?;
        let key = self.table.encode_row(hash, range)?;
        self.ops.push(BatchOp::Delete { key });
        Ok(())
    }

    pub(crate) fn delete_raw(&mut self, key: Vec<u8>) {
        self.ops.push(BatchOp::Delete { key });
    }

    /// Applies the buffered operations as one atomic write.
    ///
    /// The batch is empty afterwards and can be reused. On error nothing was
    /// applied and the operations are discarded.
    pub fn flush(&mut self) -> Result<()> {
        self.check_open()?;
        if self.ops.is_empty() {
            return Ok(());
        }

        let ops = std::mem::take(&mut self.ops);
        let count = ops.len();
        self.table.write_batch(ops)?;
        tracing::debug!(table = %self.table.name(), ops = count, "batch flushed");
        Ok(())
    }

    /// Discards unflushed operations. Idempotent.
    pub fn close(&mut self) {
        self.ops.clear();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of buffered operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl<B: Backend, H: Codec, R: Codec, V: Codec> Drop for Batch<'_, B, H, R, V> {
    fn drop(&mut self) {
        if !self.ops.is_empty() {
            tracing::warn!(
                table = %self.table.name(),
                ops = self.ops.len(),
                "batch dropped with unflushed operations"
            );
        }
    }
}

impl<B: Backend, H: Codec, R: Codec, V: Codec> fmt::Debug for Batch<'_, B, H, R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("table", &self.table.name())
            .field("ops", &self.ops.len())
            .field("closed", &self.closed)
            .finish()
    }
}
