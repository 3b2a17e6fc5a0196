//! Serde-backed value codec using bincode.
//!
//! Bincode output is not order-preserving, so this codec is meant for row
//! values, not for hash or range keys.

use super::{Codec, CodecError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

pub struct BincodeCodec<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> BincodeCodec<T> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for BincodeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BincodeCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BincodeCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BincodeCodec<{}>", std::any::type_name::<T>())
    }
}

impl<T> Codec for BincodeCodec<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    type Item = T;

    fn encode(&self, item: &T) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(item).map_err(|err| CodecError::Serialization(err.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        bincode::deserialize(bytes).map_err(|err| CodecError::Serialization(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Reading {
        sensor: String,
        celsius: f64,
        tags: Vec<String>,
    }

    #[test]
    fn test_bincode_codec_struct() {
        let codec = BincodeCodec::<Reading>::new();
        let reading = Reading {
            sensor: "north".to_string(),
            celsius: 21.5,
            tags: vec!["roof".to_string()],
        };

        let bytes = codec.encode(&reading).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), reading);
    }

    #[test]
    fn test_bincode_codec_truncated() {
        let codec = BincodeCodec::<Reading>::new();
        let reading = Reading {
            sensor: "south".to_string(),
            celsius: -3.0,
            tags: Vec::new(),
        };
        let bytes = codec.encode(&reading).unwrap();

        assert!(matches!(
            codec.decode(&bytes[..bytes.len() / 2]),
            Err(CodecError::Serialization(_))
        ));
    }
}
