//! Value codec for storing arbitrary values as opaque Redis blobs.
//!
//! Values are encoded as JSON bytes so that anything implementing the serde
//! traits can be stored and read back. An encoded value is never empty.

use crate::{RedkitError, RedkitResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

/// Encodes a value into bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> RedkitResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        error!(error = %e, "Failed to encode value");
        RedkitError::Codec(format!("Failed to encode value: {}", e))
    })
}

/// Decodes bytes produced by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> RedkitResult<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        error!(error = %e, len = bytes.len(), "Failed to decode value");
        RedkitError::Codec(format!("Failed to decode value: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        user_id: u64,
        roles: Vec<String>,
        attributes: BTreeMap<String, String>,
    }

    #[test]
    fn test_struct_survives_encoding() {
        let mut attributes = BTreeMap::new();
        attributes.insert("locale".to_string(), "zh-CN".to_string());
        let session = Session {
            user_id: 42,
            roles: vec!["admin".to_string()],
            attributes,
        };

        let bytes = encode(&session).unwrap();
        let decoded: Session = decode(&bytes).unwrap();
        assert_eq!(decoded, session);
    }

    #[test]
    fn test_encoded_unit_is_not_empty() {
        assert!(!encode(&()).unwrap().is_empty());
        assert!(!encode("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode::<Session>(b"\x00\x01not json").unwrap_err();
        assert_eq!(err.error_code(), "CODEC_ERROR");
    }

    #[test]
    fn test_decode_wrong_shape_fails() {
        let bytes = encode(&"just a string").unwrap();
        assert!(decode::<Session>(&bytes).is_err());
    }
}
