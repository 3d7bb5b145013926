//! CBOR encoding through serde.

use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes any serde-serializable value to CBOR bytes.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn to_cbor<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buf)
}

/// Decodes exactly one CBOR item from `bytes`.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid encoding of `T`, or if
/// bytes remain after the item.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    let mut reader = bytes;
    let value = ciborium::de::from_reader(&mut reader).map_err(|e| match e {
        ciborium::de::Error::Io(_) => CodecError::UnexpectedEof,
        other => CodecError::decoding_failed(other.to_string()),
    })?;

    if !reader.is_empty() {
        return Err(CodecError::TrailingBytes {
            remaining: reader.len(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Locator {
        host: String,
        port: u16,
    }

    #[test]
    fn struct_roundtrip() {
        let value = Locator {
            host: "line.constant.prefix".into(),
            port: 8080,
        };
        let bytes = to_cbor(&value).unwrap();
        let decoded: Locator = from_cbor(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn truncated_input_is_eof() {
        let bytes = to_cbor("a longer text value").unwrap();
        let result: CodecResult<String> = from_cbor(&bytes[..bytes.len() - 3]);
        assert_eq!(result, Err(CodecError::UnexpectedEof));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = to_cbor(&7u32).unwrap();
        bytes.push(0x00);
        let result: CodecResult<u32> = from_cbor(&bytes);
        assert_eq!(result, Err(CodecError::TrailingBytes { remaining: 1 }));
    }

    #[test]
    fn wrong_type_is_decoding_failure() {
        let bytes = to_cbor("text").unwrap();
        let result: CodecResult<u64> = from_cbor(&bytes);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }
}
