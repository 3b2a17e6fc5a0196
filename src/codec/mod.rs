//! Typed value codecs.
//!
//! A [`Codec`] converts a typed value to and from bytes. Codecs used for hash
//! or range keys must be order-preserving: the byte order of encoded values
//! has to match the order of the values themselves, because backends sort
//! keys bytewise within each segment.
//!
//! The set of built-in codecs is closed and selected explicitly by the
//! caller, or through [`DefaultCodec`] for the common primitive types.

use std::fmt;

pub mod primitives;
pub mod serde_codec;
pub mod versioned;

pub use primitives::{BytesCodec, I64Codec, StringCodec, U32Codec, U64Codec};
pub use serde_codec::BincodeCodec;
pub use versioned::{Versioned, VersionedCodec};

/// Errors specific to the codec layer.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Fixed-width input of the wrong size
    #[error("{codec}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        codec: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Bytes are not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Serde-based serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Versioned envelope could not be split
    #[error("Envelope error: {0}")]
    Envelope(#[from] crate::error::EncodingError),
}

/// Bidirectional converter between a typed value and its byte representation.
///
/// Implementations must be deterministic.
pub trait Codec: Send + Sync + 'static {
    /// The typed value handled by this codec.
    type Item;

    fn encode(&self, item: &Self::Item) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Item, CodecError>;
}

/// Type-to-codec lookup for the built-in primitive types.
pub trait DefaultCodec: Sized {
    type Codec: Codec<Item = Self> + Default;
}

/// The three codecs of a table: hash key, range key and value.
pub struct TableCodecs<H, R, V> {
    pub hash: H,
    pub range: R,
    pub value: V,
}

impl<H: Codec, R: Codec, V: Codec> TableCodecs<H, R, V> {
    pub fn new(hash: H, range: R, value: V) -> Self {
        Self { hash, range, value }
    }
}

impl<H, R, V> Default for TableCodecs<H, R, V>
where
    H: Codec + Default,
    R: Codec + Default,
    V: Codec + Default,
{
    fn default() -> Self {
        Self {
            hash: H::default(),
            range: R::default(),
            value: V::default(),
        }
    }
}

impl<H, R, V> fmt::Debug for TableCodecs<H, R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableCodecs")
            .field("hash", &std::any::type_name::<H>())
            .field("range", &std::any::type_name::<R>())
            .field("value", &std::any::type_name::<V>())
            .finish()
    }
}

/// Codecs for a table whose key and value types all have a [`DefaultCodec`].
pub type DefaultCodecs<H, R, V> =
    TableCodecs<<H as DefaultCodec>::Codec, <R as DefaultCodec>::Codec, <V as DefaultCodec>::Codec>;
