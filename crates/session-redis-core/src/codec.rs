//! Session payload codecs
//!
//! A codec turns a [`Payload`] into the bytes written to the backend and back.
//! Every codec must round trip: `decode(encode(p)) == p`.
//!
//! ## Available Codecs
//!
//! - **Base64 JSON** (default): standard base64 over JSON text, the record
//!   format used by existing deployments of the Redis session store
//! - **JSON**: bare JSON text
//! - **MessagePack** (feature: `messagepack`): compact binary encoding
//!
//! ## Example
//!
//! ```rust
//! use session_redis_core::codec::{Base64JsonCodec, Codec};
//! use session_redis_core::Payload;
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut payload = Payload::new();
//! payload.insert("num".to_string(), json!(99));
//!
//! let codec = Base64JsonCodec;
//! let bytes = codec.encode(&payload)?;
//! assert_eq!(codec.decode(&bytes)?, payload);
//! # Ok(())
//! # }
//! ```

use crate::session::Payload;
use thiserror::Error;

mod json;
pub use json::{Base64JsonCodec, JsonCodec};

#[cfg(feature = "messagepack")]
mod messagepack;
#[cfg(feature = "messagepack")]
pub use messagepack::MessagePackCodec;

/// Codec errors
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CodecError {
	/// The payload could not be encoded
	#[error("Failed to encode session payload: {0}")]
	Encode(String),

	/// The stored bytes are not a valid payload
	#[error("Failed to decode session payload: {0}")]
	Decode(String),
}

/// Converts session payloads to and from their stored representation
pub trait Codec: Send + Sync {
	/// Short format name for logs
	fn name(&self) -> &'static str;

	/// Encode a payload to bytes
	fn encode(&self, payload: &Payload) -> Result<Vec<u8>, CodecError>;

	/// Decode bytes to a payload
	fn decode(&self, bytes: &[u8]) -> Result<Payload, CodecError>;
}

/// Check whether `current` differs from the `baseline` captured at load time
///
/// Compares decoded values structurally, so two payloads holding the same
/// entries are equal regardless of key order.
///
/// # Examples
///
/// ```
/// use session_redis_core::codec::changed;
/// use session_redis_core::Payload;
/// use serde_json::json;
///
/// let mut baseline = Payload::new();
/// baseline.insert("a".to_string(), json!(1));
/// let mut current = baseline.clone();
/// assert!(!changed(&baseline, &current));
///
/// current.insert("a".to_string(), json!(2));
/// assert!(changed(&baseline, &current));
/// ```
pub fn changed(baseline: &Payload, current: &Payload) -> bool {
	baseline != current
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::*;
	use serde_json::{Value, json};

	fn payload(value: Value) -> Payload {
		match value {
			Value::Object(map) => map,
			other => panic!("expected object, got {}", other),
		}
	}

	#[rstest]
	fn test_changed_ignores_key_order() {
		// Arrange
		let mut first = Payload::new();
		first.insert("a".to_string(), json!(1));
		first.insert("b".to_string(), json!({"x": [1, 2]}));
		let mut second = Payload::new();
		second.insert("b".to_string(), json!({"x": [1, 2]}));
		second.insert("a".to_string(), json!(1));

		// Act & Assert
		assert!(!changed(&first, &second));
	}

	#[rstest]
	#[case(json!({"a": 1}), json!({"a": 1.5}))]
	#[case(json!({"a": 1}), json!({"a": "1"}))]
	#[case(json!({"a": 1}), json!({"a": 1, "b": null}))]
	#[case(json!({"a": [1, 2]}), json!({"a": [2, 1]}))]
	#[case(json!({}), json!({"a": false}))]
	fn test_changed_detects_differences(#[case] baseline: Value, #[case] current: Value) {
		assert!(changed(&payload(baseline), &payload(current)));
	}

	fn arb_value() -> impl Strategy<Value = Value> {
		let leaf = prop_oneof![
			Just(Value::Null),
			any::<bool>().prop_map(Value::Bool),
			any::<i64>().prop_map(|n| json!(n)),
			any::<u64>().prop_map(|n| json!(n)),
			"[a-zA-Z0-9 _-]{0,16}".prop_map(Value::String),
		];
		leaf.prop_recursive(3, 32, 4, |inner| {
			prop_oneof![
				prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
				prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
					.prop_map(|m| Value::Object(m.into_iter().collect())),
			]
		})
	}

	fn arb_payload() -> impl Strategy<Value = Payload> {
		prop::collection::btree_map("[a-zA-Z_]{1,8}", arb_value(), 0..6)
			.prop_map(|m| m.into_iter().collect())
	}

	proptest! {
		#[test]
		fn prop_base64_json_round_trip(p in arb_payload()) {
			let codec = Base64JsonCodec;
			let bytes = codec.encode(&p).unwrap();
			prop_assert_eq!(codec.decode(&bytes).unwrap(), p);
		}

		#[test]
		fn prop_json_round_trip(p in arb_payload()) {
			let codec = JsonCodec;
			let bytes = codec.encode(&p).unwrap();
			prop_assert_eq!(codec.decode(&bytes).unwrap(), p);
		}

		#[cfg(feature = "messagepack")]
		#[test]
		fn prop_messagepack_round_trip(p in arb_payload()) {
			let codec = MessagePackCodec;
			let bytes = codec.encode(&p).unwrap();
			prop_assert_eq!(codec.decode(&bytes).unwrap(), p);
		}
	}
}
