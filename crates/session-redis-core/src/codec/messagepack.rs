//! MessagePack codec

use super::{Codec, CodecError};
use crate::session::Payload;

/// MessagePack codec
///
/// Maps are written with field names so records stay self-describing.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePackCodec;

impl Codec for MessagePackCodec {
	fn name(&self) -> &'static str {
		"messagepack"
	}

	fn encode(&self, payload: &Payload) -> Result<Vec<u8>, CodecError> {
		rmp_serde::to_vec_named(payload).map_err(|e| CodecError::Encode(e.to_string()))
	}

	fn decode(&self, bytes: &[u8]) -> Result<Payload, CodecError> {
		rmp_serde::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
	}
}
