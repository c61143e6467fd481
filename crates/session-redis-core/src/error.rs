//! Session engine error types

use crate::codec::CodecError;
use crate::config::ConfigError;
use session_redis_backends::BackendError;
use thiserror::Error;

/// Errors surfaced by session load, save and rotation
///
/// Corrupt records and failed cookie signatures never show up here: both
/// fall back to a fresh session.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SessionError {
	/// The secure random source could not supply identifier bytes
	#[error("Entropy unavailable: {0}")]
	EntropyUnavailable(String),

	/// The backend failed or timed out
	#[error("Session backend unavailable: {0}")]
	BackendUnavailable(#[from] BackendError),

	/// The payload could not be encoded
	#[error("Session encoding error: {0}")]
	Encoding(#[from] CodecError),

	/// The store could not be built from its options
	#[error("Session store configuration error: {0}")]
	Config(#[from] ConfigError),
}

/// Result type for session engine operations
pub type Result<T> = std::result::Result<T, SessionError>;
