//! Key encoding, comparison and value envelopes.
//!
//! This module handles the binary format for composite keys and provides the
//! stable on-disk encoding shared by every backend.

pub mod compare;
pub mod key;
pub mod version;

pub use compare::{compare_composite, compare_hash, compare_keys, compare_versioned, Comparator};
pub use key::{decode_key, encode_key, KeyParts};
pub use version::{decode_versioned, encode_versioned};
