//! Byte comparators over raw segments and composite keys.
//!
//! The composite order is hash segment first, range segment second, each
//! compared on the decoded sub-slice rather than on the whole blob. Backends
//! install [`compare_keys`] as their native ordering so that a single sorted
//! structure serves every query.

use crate::encoding::key::{decode_key, hash_segment, KeyParts};
use crate::encoding::version::VERSION_LEN;
use std::cmp::Ordering;

/// Ordering over encoded segment bytes.
pub type Comparator = fn(&[u8], &[u8]) -> Ordering;

/// Lexicographic compare on raw bytes. Empty sorts before any non-empty value.
pub fn compare_hash(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Compares two composite keys.
///
/// Hash segments are compared with `hash_cmp`. When they are equal and
/// `range_cmp` is supplied, range segments decide; an absent range segment
/// sorts before any present one. Without `range_cmp`, equal hash segments
/// make the keys equal, which answers "is this key still in hash group X".
///
/// Keys that fail to decode are ordered after well-formed keys and among
/// themselves by raw bytes, keeping the order total.
pub fn compare_composite(
    k1: &[u8],
    k2: &[u8],
    hash_cmp: Comparator,
    range_cmp: Option<Comparator>,
) -> Ordering {
    let Some(range_cmp) = range_cmp else {
        return match (hash_segment(k1), hash_segment(k2)) {
            (Ok(h1), Ok(h2)) => hash_cmp(h1, h2),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => k1.cmp(k2),
        };
    };

    match (decode_key(k1), decode_key(k2)) {
        (Ok(p1), Ok(p2)) => compare_parts(&p1, &p2, hash_cmp, range_cmp),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => k1.cmp(k2),
    }
}

fn compare_parts(
    p1: &KeyParts<'_>,
    p2: &KeyParts<'_>,
    hash_cmp: Comparator,
    range_cmp: Comparator,
) -> Ordering {
    hash_cmp(p1.hash, p2.hash).then_with(|| match (p1.range, p2.range) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(r1), Some(r2)) => range_cmp(r1, r2),
    })
}

/// The native key order shared by every backend.
pub fn compare_keys(k1: &[u8], k2: &[u8]) -> Ordering {
    compare_composite(k1, k2, compare_hash, Some(compare_hash))
}

/// True when both keys carry the same hash segment.
pub fn same_hash(k1: &[u8], k2: &[u8]) -> bool {
    compare_composite(k1, k2, compare_hash, None) == Ordering::Equal
}

/// Compares two versioned envelopes by payload, ignoring the version header.
///
/// Envelopes shorter than the header compare as empty payloads.
pub fn compare_versioned(a: &[u8], b: &[u8], inner: Comparator) -> Ordering {
    fn payload(bytes: &[u8]) -> &[u8] {
        bytes.get(VERSION_LEN..).unwrap_or_default()
    }
    inner(payload(a), payload(b))
}
