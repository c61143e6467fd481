//! Session identifier generation
//!
//! Identifiers are 128 random bits laid out as an RFC 4122 version 4 UUID and
//! rendered as 32 lowercase hex digits with no hyphens. The version and
//! variant bits carry no security meaning; they only keep the value readable
//! by ordinary UUID parsers.

use crate::error::{Result, SessionError};
use std::fmt;
use thiserror::Error;
use uuid::{Builder, Uuid};

/// Number of random bytes in an identifier
const ID_BYTES: usize = 16;

/// Failure reported by an [`EntropySource`]
#[derive(Debug, Error)]
#[error("{0}")]
pub struct EntropyError(pub String);

/// Source of cryptographically secure random bytes
pub trait EntropySource {
	/// Fill `dest` and return the number of bytes written
	fn fill(&mut self, dest: &mut [u8]) -> std::result::Result<usize, EntropyError>;
}

/// Operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
	fn fill(&mut self, dest: &mut [u8]) -> std::result::Result<usize, EntropyError> {
		getrandom::getrandom(dest).map_err(|e| EntropyError(e.to_string()))?;
		Ok(dest.len())
	}
}

/// Opaque session identifier
///
/// # Examples
///
/// ```
/// use session_redis_core::SessionId;
///
/// let id = SessionId::generate().unwrap();
/// assert_eq!(id.as_str().len(), 32);
/// assert_eq!(&id.as_str()[12..13], "4");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
	/// Generate a new identifier from the operating system CSPRNG
	pub fn generate() -> Result<Self> {
		Self::generate_with(&mut OsEntropy)
	}

	/// Generate a new identifier from the given source
	///
	/// A source error or a short fill is reported as
	/// [`SessionError::EntropyUnavailable`]; there is no fallback.
	pub fn generate_with<E: EntropySource + ?Sized>(source: &mut E) -> Result<Self> {
		let mut bytes = [0u8; ID_BYTES];
		let filled = source
			.fill(&mut bytes)
			.map_err(|e| SessionError::EntropyUnavailable(e.to_string()))?;
		if filled != ID_BYTES {
			return Err(SessionError::EntropyUnavailable(format!(
				"short read: {} of {} bytes",
				filled, ID_BYTES
			)));
		}

		let uuid = Builder::from_random_bytes(bytes).into_uuid();
		Ok(Self(uuid.simple().to_string()))
	}

	/// Accept an identifier received from a client
	///
	/// Only the 32 lowercase hex digits [`generate`](Self::generate) emits
	/// are accepted; anything else could name an arbitrary backend key.
	///
	/// # Examples
	///
	/// ```
	/// use session_redis_core::SessionId;
	///
	/// assert!(SessionId::parse("ffffffffffff4fffbfffffffffffffff").is_some());
	/// assert!(SessionId::parse("app:config").is_none());
	/// assert!(SessionId::parse("FFFFFFFFFFFF4FFFBFFFFFFFFFFFFFFF").is_none());
	/// ```
	pub fn parse(value: &str) -> Option<Self> {
		if value.len() != ID_BYTES * 2 {
			return None;
		}
		let canonical = Uuid::try_parse(value).ok()?.simple().to_string();
		(canonical == value).then_some(Self(canonical))
	}

	/// Identifier text as carried in the cookie and used as the backend key
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<String> for SessionId {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl From<&str> for SessionId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

impl AsRef<str> for SessionId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for SessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
