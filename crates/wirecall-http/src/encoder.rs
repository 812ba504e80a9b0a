//! Pluggable request body encoders.

use bytes::Bytes;
use serde::Serialize;

use crate::error::EncodingError;

/// Serializes a structured value into a request body.
pub trait RequestEncoder: Send + Sync {
    /// Encode `value` into bytes.
    fn encode<T>(&self, value: &T) -> Result<Bytes, EncodingError>
    where
        T: Serialize + ?Sized;

    /// `Content-Type` to send with encoded bodies.
    fn content_type(&self) -> Option<&str> {
        None
    }
}

/// JSON encoder backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder {
    pretty: bool,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit indented JSON.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl RequestEncoder for JsonEncoder {
    fn encode<T>(&self, value: &T) -> Result<Bytes, EncodingError>
    where
        T: Serialize + ?Sized,
    {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        Ok(Bytes::from(bytes))
    }

    fn content_type(&self) -> Option<&str> {
        Some("application/json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::{Error as _, Serializer};
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct TestData {
        message: String,
        value: i32,
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("refusing to serialize"))
        }
    }

    #[test]
    fn test_json_encoder() {
        let data = TestData {
            message: "hello".to_string(),
            value: 42,
        };
        let bytes = JsonEncoder::new().encode(&data).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["message"], "hello");
        assert_eq!(parsed["value"], 42);
    }

    #[test]
    fn test_pretty_json_encoder() {
        let mut map = HashMap::new();
        map.insert("key", 1);
        let bytes = JsonEncoder::pretty().encode(&map).unwrap();
        assert!(std::str::from_utf8(&bytes).unwrap().contains('\n'));
    }

    #[test]
    fn test_unsized_values() {
        let bytes = JsonEncoder::new().encode("text").unwrap();
        assert_eq!(&bytes[..], b"\"text\"");
    }

    #[test]
    fn test_encoding_failure() {
        let err = JsonEncoder::new().encode(&Unserializable).unwrap_err();
        assert!(err.to_string().contains("refusing to serialize"));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(JsonEncoder::new().content_type(), Some("application/json"));
    }
}
