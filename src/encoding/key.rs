//! Composite key encoding and decoding.
//!
//! Keys are encoded with a length prefix per segment so that segment bytes
//! can contain any value and a key is never a prefix of a longer key with the
//! same hash segment:
//!
//! Composite key: [hash_len][hash_bytes][range_len][range_bytes]
//!
//! Both lengths are 4-byte big-endian signed integers. `range_len == 0`
//! encodes an absent range key.

use crate::error::EncodingError;
use std::convert::TryInto;

pub type Result<T> = std::result::Result<T, EncodingError>;

/// Size of each segment length prefix in bytes.
pub const LENGTH_PREFIX: usize = 4;

/// The two segments of a decoded composite key, still in encoded form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyParts<'a> {
    pub hash: &'a [u8],
    pub range: Option<&'a [u8]>,
}

fn segment_len(segment: &[u8]) -> Result<i32> {
    segment
        .len()
        .try_into()
        .map_err(|_| EncodingError::KeyTooLong(segment.len()))
}

/// Encodes a composite key with the format: [hash_len][hash][range_len][range]
///
/// # Arguments
/// * `hash` - Encoded hash key bytes
/// * `range` - Encoded range key bytes, or `None` for "no range key"
///
/// # Returns
/// Encoded key bytes. `encode_key(hash, None)` sorts before every other key
/// of the same hash and is used as the lower bound of hash scans.
pub fn encode_key(hash: &[u8], range: Option<&[u8]>) -> Result<Vec<u8>> {
    let hash_len = segment_len(hash)?;
    let range = range.unwrap_or_default();
    if range.is_empty() {
        return Ok(encode_segments(hash_len, hash, 0, range));
    }
    let range_len = segment_len(range)?;
    Ok(encode_segments(hash_len, hash, range_len, range))
}

/// Like [`encode_key`], but a present range key must not be empty.
///
/// Used on the write path where an empty range segment would silently turn
/// into an absent range key.
pub fn encode_row_key(hash: &[u8], range: Option<&[u8]>) -> Result<Vec<u8>> {
    if matches!(range, Some(bytes) if bytes.is_empty()) {
        return Err(EncodingError::EmptyRangeKey);
    }
    encode_key(hash, range)
}

fn encode_segments(hash_len: i32, hash: &[u8], range_len: i32, range: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 * LENGTH_PREFIX + hash.len() + range.len());

    buf.extend_from_slice(&hash_len.to_be_bytes());
    buf.extend_from_slice(hash);

    buf.extend_from_slice(&range_len.to_be_bytes());
    buf.extend_from_slice(range);

    buf
}

/// Builds the smallest key that sorts after every key of `hash`.
///
/// No byte string sorts strictly between `hash` and `hash ++ [0x00]`, so the
/// absent-range key of that successor is a tight exclusive upper bound for
/// the hash group. Reverse scans seek here and step back once.
pub fn hash_upper_bound(hash: &[u8]) -> Result<Vec<u8>> {
    let mut successor = Vec::with_capacity(hash.len() + 1);
    successor.extend_from_slice(hash);
    successor.push(0);
    encode_key(&successor, None)
}

fn read_len(encoded: &[u8], at: usize) -> Result<usize> {
    let bytes: [u8; LENGTH_PREFIX] = encoded
        .get(at..at + LENGTH_PREFIX)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| {
            EncodingError::InvalidKeyEncoding(format!("Missing length prefix at offset {}", at))
        })?;

    let len = i32::from_be_bytes(bytes);
    usize::try_from(len).map_err(|_| {
        EncodingError::InvalidKeyEncoding(format!("Negative segment length {}", len))
    })
}

fn read_segment(encoded: &[u8], at: usize) -> Result<(&[u8], usize)> {
    let len = read_len(encoded, at)?;
    let start = at + LENGTH_PREFIX;
    let segment = encoded.get(start..start + len).ok_or_else(|| {
        EncodingError::InvalidKeyEncoding(format!(
            "Segment of {} bytes at offset {} overruns key of {} bytes",
            len,
            start,
            encoded.len()
        ))
    })?;
    Ok((segment, start + len))
}

/// Decodes a composite key into its hash and range segments.
pub fn decode_key(encoded: &[u8]) -> Result<KeyParts<'_>> {
    let (hash, next) = read_segment(encoded, 0)?;
    let (range, end) = read_segment(encoded, next)?;

    if end != encoded.len() {
        return Err(EncodingError::InvalidKeyEncoding(format!(
            "{} trailing bytes after range segment",
            encoded.len() - end
        )));
    }

    Ok(KeyParts {
        hash,
        range: if range.is_empty() { None } else { Some(range) },
    })
}

/// Extracts only the hash segment of a composite key.
pub fn hash_segment(encoded: &[u8]) -> Result<&[u8]> {
    read_segment(encoded, 0).map(|(hash, _)| hash)
}

/// Extracts the range segment of a composite key; `None` when absent.
pub fn range_segment(encoded: &[u8]) -> Result<Option<&[u8]>> {
    decode_key(encoded).map(|parts| parts.range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_key_layout() {
        let encoded = encode_key(b"user", Some(b"42")).unwrap();

        assert_eq!(&encoded[0..4], &4i32.to_be_bytes());
        assert_eq!(&encoded[4..8], b"user");
        assert_eq!(&encoded[8..12], &2i32.to_be_bytes());
        assert_eq!(&encoded[12..], b"42");
    }

    #[test]
    fn test_encode_key_absent_range() {
        let encoded = encode_key(b"user", None).unwrap();
        assert_eq!(encoded.len(), 4 + 4 + 4);
        assert_eq!(&encoded[8..], &0i32.to_be_bytes());
    }

    #[test]
    fn test_decode_key_round_trip() {
        let encoded = encode_key(b"hash", Some(b"range")).unwrap();
        let parts = decode_key(&encoded).unwrap();
        assert_eq!(parts.hash, b"hash");
        assert_eq!(parts.range, Some(&b"range"[..]));

        let encoded = encode_key(b"", None).unwrap();
        let parts = decode_key(&encoded).unwrap();
        assert_eq!(parts.hash, b"");
        assert_eq!(parts.range, None);
    }

    #[test]
    fn test_segments_may_contain_prefix_bytes() {
        // Segment bytes that look like length prefixes must not confuse decoding
        let hash = [0u8, 0, 0, 1, 0xff];
        let range = [0u8, 0, 0, 0];
        let encoded = encode_key(&hash, Some(&range)).unwrap();

        assert_eq!(hash_segment(&encoded).unwrap(), &hash);
        assert_eq!(range_segment(&encoded).unwrap(), Some(&range[..]));
    }

    #[test]
    fn test_decode_key_rejects_malformed() {
        assert!(decode_key(b"").is_err());
        assert!(decode_key(&[0, 0, 0, 9, 1]).is_err());
        assert!(decode_key(&(-1i32).to_be_bytes()).is_err());

        let mut trailing = encode_key(b"a", Some(b"b")).unwrap();
        trailing.push(7);
        assert!(matches!(
            decode_key(&trailing),
            Err(EncodingError::InvalidKeyEncoding(_))
        ));
    }

    #[test]
    fn test_encode_row_key_rejects_empty_range() {
        assert_eq!(
            encode_row_key(b"a", Some(b"")),
            Err(EncodingError::EmptyRangeKey)
        );
        assert!(encode_row_key(b"a", None).is_ok());
        // The scan-side encoder treats an empty range as absent
        assert_eq!(
            encode_key(b"a", Some(b"")).unwrap(),
            encode_key(b"a", None).unwrap()
        );
    }

    #[test]
    fn test_hash_upper_bound() {
        let bound = hash_upper_bound(b"ab").unwrap();
        assert_eq!(hash_segment(&bound).unwrap(), b"ab\0");
        assert_eq!(range_segment(&bound).unwrap(), None);
    }

    mod properties {
        use super::super::*;
        use crate::encoding::compare::{compare_hash, compare_keys};
        use proptest::prelude::*;
        use std::cmp::Ordering;

        fn arb_segment() -> impl Strategy<Value = Vec<u8>> {
            prop::collection::vec(any::<u8>(), 0..16)
        }

        fn arb_range() -> impl Strategy<Value = Option<Vec<u8>>> {
            prop::option::of(prop::collection::vec(any::<u8>(), 1..16))
        }

        fn encode(hash: &[u8], range: &Option<Vec<u8>>) -> Vec<u8> {
            encode_key(hash, range.as_deref()).unwrap()
        }

        proptest! {
            #[test]
            fn decode_inverts_encode(hash in arb_segment(), range in arb_range()) {
                let encoded = encode(&hash, &range);
                let parts = decode_key(&encoded).unwrap();
                prop_assert_eq!(parts.hash, &hash[..]);
                prop_assert_eq!(parts.range, range.as_deref());
            }

            #[test]
            fn hash_order_dominates_range(
                h1 in arb_segment(),
                h2 in arb_segment(),
                r1 in arb_range(),
                r2 in arb_range()
            ) {
                let by_hash = compare_hash(&h1, &h2);
                prop_assume!(by_hash != Ordering::Equal);
                prop_assert_eq!(compare_keys(&encode(&h1, &r1), &encode(&h2, &r2)), by_hash);
            }

            #[test]
            fn absent_range_sorts_first(hash in arb_segment(), range in arb_range()) {
                prop_assume!(range.is_some());
                let bare = encode(&hash, &None);
                prop_assert_eq!(compare_keys(&bare, &encode(&hash, &range)), Ordering::Less);
            }

            #[test]
            fn same_hash_keys_are_prefix_free(
                hash in arb_segment(),
                r1 in arb_range(),
                r2 in arb_range()
            ) {
                prop_assume!(r1 != r2);
                let k1 = encode(&hash, &r1);
                let k2 = encode(&hash, &r2);
                prop_assert!(!k2.starts_with(&k1));
                prop_assert!(!k1.starts_with(&k2));
            }

            #[test]
            fn upper_bound_follows_whole_group(hash in arb_segment(), range in arb_range()) {
                let bound = hash_upper_bound(&hash).unwrap();
                prop_assert_eq!(compare_keys(&encode(&hash, &range), &bound), Ordering::Less);
            }
        }
    }
}
