//! Crate-scoped error handling for rangekv.
//!
//! Public APIs return the unified [`Error`], while each layer keeps its own
//! precise error type ([`EncodingError`], [`crate::codec::CodecError`],
//! [`crate::backend::BackendError`]) that converts into it.

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type exposed to users of the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or unencodable composite key / envelope
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// A codec failed to encode or decode a typed value
    #[error("Codec error: {0}")]
    Codec(#[from] crate::codec::CodecError),

    /// The storage engine reported a failure
    #[error("Backend error: {0}")]
    Backend(#[from] crate::backend::BackendError),

    /// `next_row` was called on an iterator with no remaining rows
    #[error("Iterator exhausted")]
    Exhausted,

    /// Operation on a closed table, batch or iterator
    #[error("{0} is closed")]
    Closed(String),

    /// Table still referenced by open handles
    #[error("{0} is still in use")]
    InUse(String),

    /// Invalid configuration or table name
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors from the byte-level key and envelope encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Key bytes could not be split into hash and range segments
    #[error("Invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    /// Versioned envelope shorter than its version header
    #[error("Invalid value encoding: {0}")]
    InvalidValueEncoding(String),

    /// A segment does not fit the 32-bit signed length prefix
    #[error("Key segment too long: {0} bytes")]
    KeyTooLong(usize),

    /// A present range key encoded to zero bytes, which is reserved for "absent"
    #[error("Range key encodes to zero bytes, which is reserved for an absent range key")]
    EmptyRangeKey,
}

impl Error {
    pub(crate) fn closed(what: impl Into<String>) -> Self {
        Error::Closed(what.into())
    }
}
