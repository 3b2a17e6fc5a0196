//! Codec wrapper that stores values inside the versioned envelope.

use super::{Codec, CodecError};
use crate::encoding::version::{decode_versioned, encode_versioned};

/// A value tagged with a caller-managed version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: i64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new(version: i64, value: T) -> Self {
        Self { version, value }
    }
}

/// Wraps an inner codec with the `[version:i64 BE][payload]` envelope.
#[derive(Debug, Clone, Default)]
pub struct VersionedCodec<C> {
    inner: C,
}

impl<C: Codec> VersionedCodec<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Codec> Codec for VersionedCodec<C> {
    type Item = Versioned<C::Item>;

    fn encode(&self, item: &Self::Item) -> Result<Vec<u8>, CodecError> {
        let payload = self.inner.encode(&item.value)?;
        Ok(encode_versioned(item.version, &payload))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Self::Item, CodecError> {
        let (version, payload) = decode_versioned(bytes)?;
        Ok(Versioned {
            version,
            value: self.inner.decode(payload)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringCodec;

    #[test]
    fn test_versioned_codec() {
        let codec = VersionedCodec::new(StringCodec);
        let item = Versioned::new(3, "draft".to_string());

        let bytes = codec.encode(&item).unwrap();
        assert_eq!(&bytes[..8], &3i64.to_be_bytes());
        assert_eq!(&bytes[8..], b"draft");
        assert_eq!(codec.decode(&bytes).unwrap(), item);
    }

    #[test]
    fn test_versioned_codec_short_input() {
        let codec = VersionedCodec::new(StringCodec);
        assert!(matches!(
            codec.decode(b"abc"),
            Err(CodecError::Envelope(_))
        ));
    }
}
