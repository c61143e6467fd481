//! JSON-based codecs

use super::{Codec, CodecError};
use crate::session::Payload;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Bare JSON codec
///
/// # Example
///
/// ```rust
/// use session_redis_core::codec::{Codec, JsonCodec};
/// use session_redis_core::Payload;
///
/// let bytes = JsonCodec.encode(&Payload::new()).unwrap();
/// assert_eq!(bytes, b"{}");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
	fn name(&self) -> &'static str {
		"json"
	}

	fn encode(&self, payload: &Payload) -> Result<Vec<u8>, CodecError> {
		serde_json::to_vec(payload).map_err(|e| CodecError::Encode(e.to_string()))
	}

	fn decode(&self, bytes: &[u8]) -> Result<Payload, CodecError> {
		// A stored `null` is what an unset map encodes to; read it as empty
		let payload: Option<Payload> =
			serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
		Ok(payload.unwrap_or_default())
	}
}

/// Standard base64 over JSON text
///
/// Keeps stored values printable for backends and tooling that expect text.
///
/// # Example
///
/// ```rust
/// use session_redis_core::codec::{Base64JsonCodec, Codec};
/// use session_redis_core::Payload;
///
/// let bytes = Base64JsonCodec.encode(&Payload::new()).unwrap();
/// assert_eq!(bytes, b"e30=");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64JsonCodec;

impl Codec for Base64JsonCodec {
	fn name(&self) -> &'static str {
		"base64+json"
	}

	fn encode(&self, payload: &Payload) -> Result<Vec<u8>, CodecError> {
		let json = JsonCodec.encode(payload)?;
		Ok(STANDARD.encode(json).into_bytes())
	}

	fn decode(&self, bytes: &[u8]) -> Result<Payload, CodecError> {
		let json = STANDARD
			.decode(bytes)
			.map_err(|e| CodecError::Decode(e.to_string()))?;
		JsonCodec.decode(&json)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;
	use serde_json::json;

	#[fixture]
	fn mushroom() -> Payload {
		let mut payload = Payload::new();
		payload.insert("name".to_string(), json!("mushroom"));
		payload.insert("num".to_string(), json!(99));
		payload
	}

	#[rstest]
	fn test_base64_json_matches_stored_record_format(mushroom: Payload) {
		// Act
		let bytes = Base64JsonCodec.encode(&mushroom).unwrap();

		// Assert
		let json = STANDARD.decode(&bytes).unwrap();
		assert_eq!(json, br#"{"name":"mushroom","num":99}"#);
	}

	#[rstest]
	fn test_decode_preserves_numeric_types(mushroom: Payload) {
		let bytes = Base64JsonCodec.encode(&mushroom).unwrap();

		let decoded = Base64JsonCodec.decode(&bytes).unwrap();

		assert!(decoded["num"].is_u64());
		assert_eq!(decoded["num"].as_u64(), Some(99));
		assert_eq!(decoded, mushroom);
	}

	#[rstest]
	fn test_float_survives_round_trip() {
		let mut payload = Payload::new();
		payload.insert("total".to_string(), json!(59.99));

		let decoded = JsonCodec.decode(&JsonCodec.encode(&payload).unwrap()).unwrap();

		assert_eq!(decoded["total"].as_f64(), Some(59.99));
	}

	#[rstest]
	fn test_null_record_decodes_to_empty_payload() {
		assert!(JsonCodec.decode(b"null").unwrap().is_empty());
		assert!(Base64JsonCodec.decode(b"bnVsbA==").unwrap().is_empty());
	}

	#[rstest]
	#[case::not_base64(b"%%%not-base64%%%".as_slice())]
	#[case::not_json(b"bm90IGpzb24=".as_slice())]
	#[case::json_array(b"WzEsMl0=".as_slice())]
	fn test_base64_json_rejects_corrupt_records(#[case] bytes: &[u8]) {
		let result = Base64JsonCodec.decode(bytes);

		assert!(matches!(result, Err(CodecError::Decode(_))));
	}

	#[rstest]
	fn test_json_rejects_truncated_record() {
		let result = JsonCodec.decode(br#"{"name":"mush"#);

		assert!(matches!(result, Err(CodecError::Decode(_))));
	}
}
