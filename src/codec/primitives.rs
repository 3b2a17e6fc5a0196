//! Order-preserving codecs for primitive key types.

use super::{Codec, CodecError, DefaultCodec};
use std::convert::TryInto;

/// Identity codec over raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl Codec for BytesCodec {
    type Item = Vec<u8>;

    fn encode(&self, item: &Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(item.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(bytes.to_vec())
    }
}

/// UTF-8 string codec. Byte order matches `str` ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec for StringCodec {
    type Item = String;

    fn encode(&self, item: &String) -> Result<Vec<u8>, CodecError> {
        Ok(item.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, CodecError> {
        Ok(std::str::from_utf8(bytes)?.to_owned())
    }
}

fn fixed<const N: usize>(codec: &'static str, bytes: &[u8]) -> Result<[u8; N], CodecError> {
    bytes.try_into().map_err(|_| CodecError::InvalidLength {
        codec,
        expected: N,
        actual: bytes.len(),
    })
}

/// Big-endian `u32` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct U32Codec;

impl Codec for U32Codec {
    type Item = u32;

    fn encode(&self, item: &u32) -> Result<Vec<u8>, CodecError> {
        Ok(item.to_be_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<u32, CodecError> {
        fixed::<4>("U32Codec", bytes).map(u32::from_be_bytes)
    }
}

/// Big-endian `u64` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct U64Codec;

impl Codec for U64Codec {
    type Item = u64;

    fn encode(&self, item: &u64) -> Result<Vec<u8>, CodecError> {
        Ok(item.to_be_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<u64, CodecError> {
        fixed::<8>("U64Codec", bytes).map(u64::from_be_bytes)
    }
}

/// `i64` codec with the sign bit flipped so negative values sort first.
#[derive(Debug, Clone, Copy, Default)]
pub struct I64Codec;

const SIGN_BIT: u64 = 1 << 63;

impl Codec for I64Codec {
    type Item = i64;

    fn encode(&self, item: &i64) -> Result<Vec<u8>, CodecError> {
        Ok(((*item as u64) ^ SIGN_BIT).to_be_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<i64, CodecError> {
        let raw = u64::from_be_bytes(fixed::<8>("I64Codec", bytes)?);
        Ok((raw ^ SIGN_BIT) as i64)
    }
}

impl DefaultCodec for Vec<u8> {
    type Codec = BytesCodec;
}

impl DefaultCodec for String {
    type Codec = StringCodec;
}

impl DefaultCodec for u32 {
    type Codec = U32Codec;
}

impl DefaultCodec for u64 {
    type Codec = U64Codec;
}

impl DefaultCodec for i64 {
    type Codec = I64Codec;
}
