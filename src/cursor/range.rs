//! Bounded range scans over a [`RawCursor`].
//!
//! A forward scan seeks to the lower bound and consumes rows while the hash
//! segment still matches and the key is at or below the upper bound.
//!
//! A reverse scan cannot rely on a native "seek for previous", so it seeks
//! forward to the start bound first:
//! - an exact hit is the first row and is yielded without re-reading (fix-first)
//! - any other hit means the first row is one step back
//! - no hit at all means the first row is the last key of the store
//!
//! It then walks backward while the hash segment matches and the key is at or
//! above the stop bound.

use super::{CursorExt, Entry, RawCursor};
use crate::codec::{Codec, TableCodecs};
use crate::encoding::compare::{compare_hash, compare_keys};
use crate::encoding::key::{encode_key, hash_segment, hash_upper_bound};
use crate::error::{Error, Result};
use crate::row::Row;
use bytes::Bytes;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Scan direction over the range keys of one hash group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending range keys; `from` is the lower bound, `to` the upper.
    Forward,
    /// Descending range keys; `from` is the upper bound, `to` the lower.
    Reverse,
}

/// Encoded bounds of a single-hash scan. Both bounds are inclusive.
#[derive(Debug, Clone)]
pub(crate) struct ScanBounds {
    pub hash: Vec<u8>,
    pub from: Option<Vec<u8>>,
    pub to: Option<Vec<u8>>,
    pub direction: Direction,
}

impl ScanBounds {
    /// True when `from` lies past `to` in scan order, so no row can match.
    pub fn is_empty(&self) -> bool {
        let (Some(from), Some(to)) = (&self.from, &self.to) else {
            return false;
        };
        let order = compare_hash(from, to);
        match self.direction {
            Direction::Forward => order == Ordering::Greater,
            Direction::Reverse => order == Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    /// Ran past the last row; the cursor was released implicitly.
    Exhausted,
    /// Closed by the caller.
    Closed,
}

/// Iterator over the rows of one hash key, in range-key order.
///
/// Each row is copied out of the cursor before the cursor moves. Reaching
/// the end releases the backend cursor; [`RowIter::close`] does the same for
/// early termination and is idempotent. Dropping the iterator also releases
/// the cursor.
pub struct RowIter<C: RawCursor, H: Codec, R: Codec, V: Codec> {
    cursor: Option<C>,
    hash: Vec<u8>,
    stop: Option<Vec<u8>>,
    direction: Direction,
    pending: Option<(Bytes, Bytes)>,
    state: State,
    codecs: Arc<TableCodecs<H, R, V>>,
}

impl<C: RawCursor, H: Codec, R: Codec, V: Codec> RowIter<C, H, R, V> {
    /// An iterator that yields nothing and holds no cursor.
    pub(crate) fn empty(codecs: Arc<TableCodecs<H, R, V>>) -> Self {
        Self {
            cursor: None,
            hash: Vec::new(),
            stop: None,
            direction: Direction::Forward,
            pending: None,
            state: State::Exhausted,
            codecs,
        }
    }

    /// Positions `cursor` for `bounds` and wraps it.
    pub(crate) fn open(
        mut cursor: C,
        bounds: ScanBounds,
        codecs: Arc<TableCodecs<H, R, V>>,
    ) -> Result<Self> {
        if bounds.is_empty() {
            cursor.close();
            return Ok(Self::empty(codecs));
        }

        let stop = match &bounds.to {
            Some(to) => Some(encode_key(&bounds.hash, Some(to))?),
            None => None,
        };

        let mut iter = Self {
            cursor: None,
            hash: bounds.hash,
            stop,
            direction: bounds.direction,
            pending: None,
            state: State::Open,
            codecs,
        };

        let positioned = match iter.direction {
            Direction::Forward => {
                let start = encode_key(&iter.hash, bounds.from.as_deref())?;
                cursor.seek(&start).map_err(Error::from)
            }
            Direction::Reverse => {
                position_reverse(&mut cursor, &iter.hash, bounds.from.as_deref()).map(
                    |first| {
                        iter.pending =
                            first.map(|(key, value)| (Bytes::from(key), Bytes::from(value)));
                    },
                )
            }
        };

        if let Err(err) = positioned {
            cursor.close();
            return Err(err);
        }
        iter.cursor = Some(cursor);
        Ok(iter)
    }

    /// Scan direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn in_bounds(&self, key: &[u8]) -> Result<bool> {
        if hash_segment(key)? != self.hash.as_slice() {
            return Ok(false);
        }
        let Some(stop) = &self.stop else {
            return Ok(true);
        };
        let order = compare_keys(key, stop);
        Ok(match self.direction {
            Direction::Forward => order != Ordering::Greater,
            Direction::Reverse => order != Ordering::Less,
        })
    }

    /// Materializes the next row into `pending`, stepping the cursor past it.
    fn fill(&mut self) -> Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        let Some(cursor) = self.cursor.as_ref() else {
            return Ok(false);
        };
        if !cursor.valid() || !self.in_bounds(cursor.key())? {
            self.release(State::Exhausted);
            return Ok(false);
        }

        let row = (
            Bytes::copy_from_slice(cursor.key()),
            Bytes::copy_from_slice(cursor.value()),
        );
        self.pending = Some(row);

        if let Some(cursor) = self.cursor.as_mut() {
            match self.direction {
                Direction::Forward => cursor.advance()?,
                Direction::Reverse => cursor.retreat()?,
            }
        }
        Ok(true)
    }

    /// True when another row is available. Exhaustion releases the cursor.
    pub fn has_next(&mut self) -> Result<bool> {
        if self.state == State::Closed {
            return Ok(false);
        }
        self.fill().map_err(|err| {
            self.release(State::Exhausted);
            err
        })
    }

    /// Returns the next row, failing with [`Error::Exhausted`] past the end.
    pub fn next_row(&mut self) -> Result<Row<H, R, V>> {
        if self.state == State::Closed {
            return Err(Error::closed("iterator"));
        }
        if !self.has_next()? {
            return Err(Error::Exhausted);
        }
        match self.pending.take() {
            Some((key, value)) => Ok(Row::new(key, value, Arc::clone(&self.codecs))),
            None => Err(Error::Exhausted),
        }
    }

    /// Returns the next row without consuming it.
    pub fn peek(&mut self) -> Result<Option<Row<H, R, V>>> {
        if !self.has_next()? {
            return Ok(None);
        }
        Ok(self.pending.as_ref().map(|(key, value)| {
            Row::new(key.clone(), value.clone(), Arc::clone(&self.codecs))
        }))
    }

    /// Stops the scan and releases the backend cursor. Idempotent.
    pub fn close(&mut self) {
        self.pending = None;
        self.release(State::Closed);
    }

    /// True once the iterator no longer holds a backend cursor.
    pub fn is_closed(&self) -> bool {
        self.cursor.is_none()
    }

    fn release(&mut self, state: State) {
        if self.state == State::Open {
            self.state = state;
        }
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
            tracing::trace!(?state, "range cursor released");
        }
    }
}

impl<C: RawCursor, H: Codec, R: Codec, V: Codec> Iterator for RowIter<C, H, R, V> {
    type Item = Result<Row<H, R, V>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => self.next_row().ok().map(Ok),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl<C: RawCursor, H: Codec, R: Codec, V: Codec> Drop for RowIter<C, H, R, V> {
    fn drop(&mut self) {
        self.release(State::Closed);
    }
}

impl<C: RawCursor, H: Codec, R: Codec, V: Codec> fmt::Debug for RowIter<C, H, R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowIter")
            .field("direction", &self.direction)
            .field("state", &self.state)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

/// Positions `cursor` on the first row of a reverse scan.
///
/// Returns that row when the forward seek already read it (exact hit on
/// `from`); the cursor is then left one step before it.
fn position_reverse<C: RawCursor>(
    cursor: &mut C,
    hash: &[u8],
    from: Option<&[u8]>,
) -> Result<Option<Entry>> {
    let target = match from {
        Some(from) => encode_key(hash, Some(from))?,
        None => hash_upper_bound(hash)?,
    };

    cursor.seek(&target)?;
    if !cursor.valid() {
        cursor.seek_to_last()?;
        return Ok(None);
    }

    if from.is_some() && compare_keys(cursor.key(), &target) == Ordering::Equal {
        let first = cursor.entry();
        cursor.retreat()?;
        return Ok(first);
    }

    cursor.retreat()?;
    Ok(None)
}

/// Finds the row of `hash` with the largest range key at or below `range`,
/// falling back to the smallest range key above it.
///
/// Uses a single cursor: one seek, then a restore-on-read peek backward.
pub(crate) fn seek_latest<C: RawCursor>(
    cursor: &mut C,
    hash: &[u8],
    range: &[u8],
) -> Result<Option<Entry>> {
    let target = encode_key(hash, Some(range))?;

    cursor.seek(&target)?;
    if !cursor.valid() {
        // Everything sorts before the target, so only a floor can exist
        cursor.seek_to_last()?;
        return entry_in_group(cursor, hash);
    }

    if compare_keys(cursor.key(), &target) == Ordering::Equal {
        return Ok(cursor.entry());
    }

    if let Some((key, value)) = cursor.peek_prev()? {
        if hash_segment(&key)? == hash {
            return Ok(Some((key, value)));
        }
    }

    entry_in_group(cursor, hash)
}

fn entry_in_group<C: RawCursor>(cursor: &C, hash: &[u8]) -> Result<Option<Entry>> {
    if cursor.valid() && hash_segment(cursor.key())? == hash {
        Ok(cursor.entry())
    } else {
        Ok(None)
    }
}
