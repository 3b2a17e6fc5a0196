//! Cursor primitives and the range cursor protocol.
//!
//! Backends only supply a [`RawCursor`]: a positioned, seekable handle over
//! their sorted key space. Everything else (bounded scans in both
//! directions, fix-first reverse positioning, restore-on-read peeks) is
//! implemented once on top of it.

use crate::backend::BackendError;

pub mod range;

pub use range::{Direction, RowIter};

/// An owned key/value pair copied out of a cursor.
pub type Entry = (Vec<u8>, Vec<u8>);

/// Minimal cursor capability a backend must provide.
///
/// `key()` and `value()` are only meaningful while `valid()` is true and
/// return empty slices otherwise. Moving an invalid cursor with `advance` or
/// `retreat` leaves it invalid; only a seek repositions it.
pub trait RawCursor {
    /// Positions at the first key at or after `key`.
    fn seek(&mut self, key: &[u8]) -> Result<(), BackendError>;

    fn seek_to_first(&mut self) -> Result<(), BackendError>;

    fn seek_to_last(&mut self) -> Result<(), BackendError>;

    fn valid(&self) -> bool;

    fn key(&self) -> &[u8];

    fn value(&self) -> &[u8];

    /// Steps to the next key.
    fn advance(&mut self) -> Result<(), BackendError>;

    /// Steps to the previous key.
    fn retreat(&mut self) -> Result<(), BackendError>;

    /// Releases the backend read handle. Idempotent.
    fn close(&mut self);
}

/// Helpers derived from the [`RawCursor`] primitives.
pub trait CursorExt: RawCursor {
    /// Copies the current entry out of the cursor.
    fn entry(&self) -> Option<Entry> {
        if self.valid() {
            Some((self.key().to_vec(), self.value().to_vec()))
        } else {
            None
        }
    }

    /// Reads the entry before the current one and restores the position.
    ///
    /// When there is no predecessor the cursor is repositioned with
    /// `seek_to_first`, which is where it was.
    fn peek_prev(&mut self) -> Result<Option<Entry>, BackendError> {
        if !self.valid() {
            return Ok(None);
        }

        self.retreat()?;
        if !self.valid() {
            self.seek_to_first()?;
            return Ok(None);
        }

        let entry = self.entry();
        self.advance()?;
        Ok(entry)
    }

    /// Reads the entry after the current one and restores the position.
    fn peek_next(&mut self) -> Result<Option<Entry>, BackendError> {
        if !self.valid() {
            return Ok(None);
        }

        self.advance()?;
        if !self.valid() {
            self.seek_to_last()?;
            return Ok(None);
        }

        let entry = self.entry();
        self.retreat()?;
        Ok(entry)
    }
}

impl<C: RawCursor + ?Sized> CursorExt for C {}
