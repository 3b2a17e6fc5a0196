//! Lazily decoded rows.
//!
//! A [`Row`] owns the encoded key and value bytes it was read from and
//! decodes each part on first access, caching the result. Rows are handed
//! out only after the bytes were copied out of the backend cursor, so
//! advancing the cursor can never change what a row decodes to.

use crate::codec::{Codec, TableCodecs};
use crate::encoding::key::{decode_key, KeyParts};
use crate::error::Result;
use bytes::Bytes;
use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

/// A row view that defers key and value decoding until accessed.
///
/// Not `Sync`: share decoded values, not the row, across threads.
pub struct Row<H: Codec, R: Codec, V: Codec> {
    key: Bytes,
    value: Bytes,
    codecs: Arc<TableCodecs<H, R, V>>,
    hash: OnceCell<H::Item>,
    range: OnceCell<Option<R::Item>>,
    decoded: OnceCell<V::Item>,
}

impl<H: Codec, R: Codec, V: Codec> Row<H, R, V> {
    pub(crate) fn new(key: Bytes, value: Bytes, codecs: Arc<TableCodecs<H, R, V>>) -> Self {
        Self {
            key,
            value,
            codecs,
            hash: OnceCell::new(),
            range: OnceCell::new(),
            decoded: OnceCell::new(),
        }
    }

    /// The encoded composite key.
    pub fn raw_key(&self) -> &[u8] {
        &self.key
    }

    /// The encoded value.
    pub fn raw_value(&self) -> &[u8] {
        &self.value
    }

    fn parts(&self) -> Result<KeyParts<'_>> {
        Ok(decode_key(&self.key)?)
    }

    /// Decodes (once) and returns the hash key.
    pub fn hash_key(&self) -> Result<&H::Item> {
        if let Some(hash) = self.hash.get() {
            return Ok(hash);
        }
        let hash = self.codecs.hash.decode(self.parts()?.hash)?;
        Ok(self.hash.get_or_init(|| hash))
    }

    /// Decodes (once) and returns the range key; `None` when the row has none.
    ///
    /// The range codec is never invoked for an absent range key.
    pub fn range_key(&self) -> Result<Option<&R::Item>> {
        if let Some(range) = self.range.get() {
            return Ok(range.as_ref());
        }
        let range = match self.parts()?.range {
            Some(bytes) => Some(self.codecs.range.decode(bytes)?),
            None => None,
        };
        Ok(self.range.get_or_init(|| range).as_ref())
    }

    /// Decodes (once) and returns the value.
    pub fn value(&self) -> Result<&V::Item> {
        if let Some(value) = self.decoded.get() {
            return Ok(value);
        }
        let value = self.codecs.value.decode(&self.value)?;
        Ok(self.decoded.get_or_init(|| value))
    }

    /// Consumes the row into its decoded parts, reusing anything already decoded.
    pub fn into_parts(self) -> Result<(H::Item, Option<R::Item>, V::Item)> {
        let parts = decode_key(&self.key)?;

        let hash = match self.hash.into_inner() {
            Some(hash) => hash,
            None => self.codecs.hash.decode(parts.hash)?,
        };
        let range = match self.range.into_inner() {
            Some(range) => range,
            None => match parts.range {
                Some(bytes) => Some(self.codecs.range.decode(bytes)?),
                None => None,
            },
        };
        let value = match self.decoded.into_inner() {
            Some(value) => value,
            None => self.codecs.value.decode(&self.value)?,
        };

        Ok((hash, range, value))
    }
}

impl<H: Codec, R: Codec, V: Codec> fmt::Debug for Row<H, R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("key", &self.key)
            .field("value_len", &self.value.len())
            .finish()
    }
}
