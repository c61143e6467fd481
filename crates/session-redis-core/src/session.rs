//! Session entity
//!
//! A [`Session`] is one request's view of a named session: its identifier,
//! its payload, and the payload as it was loaded. It is created by
//! [`SessionStore::load`](crate::SessionStore::load), mutated by application
//! code, and handed back to [`SessionStore::save`](crate::SessionStore::save).
//! Only the encoded payload is ever persisted.

use crate::codec::{CodecError, changed};
use crate::error::Result;
use crate::identifier::SessionId;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Session payload: string keys to JSON values
pub type Payload = Map<String, Value>;

/// One named session for the current request
///
/// # Examples
///
/// ```
/// use session_redis_core::{InMemoryBackend, CookieJar, SessionStore, StoreOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SessionStore::new(InMemoryBackend::new(), StoreOptions::default());
/// let jar = CookieJar::new();
///
/// let mut session = store.load("Sess", &jar).await?;
/// assert!(session.is_fresh());
///
/// session.insert("user_id", "123465")?;
/// session.insert("age", 18)?;
/// assert_eq!(session.get::<i64>("age"), Some(18));
/// assert!(session.is_dirty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Session {
	name: String,
	id: SessionId,
	payload: Payload,
	/// Payload as loaded; `None` until the session has been persisted
	baseline: Option<Payload>,
	signed: bool,
	/// Identifier changed by rotation; must be written even if unchanged
	rotated: bool,
	/// Persisted identifier replaced by rotation, deleted after the next write
	previous_id: Option<SessionId>,
}

impl Session {
	/// A session that has never been persisted
	pub(crate) fn fresh(name: &str, id: SessionId, signed: bool) -> Self {
		Self {
			name: name.to_string(),
			id,
			payload: Payload::new(),
			baseline: None,
			signed,
			rotated: false,
			previous_id: None,
		}
	}

	/// A session hydrated from a stored record
	pub(crate) fn hydrated(name: &str, id: SessionId, payload: Payload, signed: bool) -> Self {
		Self {
			name: name.to_string(),
			id,
			baseline: Some(payload.clone()),
			payload,
			signed,
			rotated: false,
			previous_id: None,
		}
	}

	/// Session name, which is also the cookie name
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Current identifier
	pub fn id(&self) -> &SessionId {
		&self.id
	}

	/// Whether the identifier cookie is signed
	pub fn is_signed(&self) -> bool {
		self.signed
	}

	/// Whether this session was minted for this request rather than loaded
	pub fn is_fresh(&self) -> bool {
		self.baseline.is_none()
	}

	/// Whether a save would write to the backend
	///
	/// A fresh session is dirty once its payload is non-empty. A hydrated one
	/// is dirty when its payload differs from what was loaded; putting a value
	/// back to its loaded state makes it clean again. A rotated identifier is
	/// always dirty.
	pub fn is_dirty(&self) -> bool {
		if self.rotated {
			return true;
		}
		match &self.baseline {
			Some(baseline) => changed(baseline, &self.payload),
			None => !self.payload.is_empty(),
		}
	}

	/// Typed value for `key`
	///
	/// Returns `None` when the key is missing or holds a value of another
	/// shape.
	pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
		self.payload
			.get(key)
			.and_then(|v| serde_json::from_value(v.clone()).ok())
	}

	/// Raw value for `key`
	pub fn get_value(&self, key: &str) -> Option<&Value> {
		self.payload.get(key)
	}

	/// Store a serializable value, returning the previous one
	pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<Option<Value>> {
		let value = serde_json::to_value(value).map_err(|e| CodecError::Encode(e.to_string()))?;
		Ok(self.payload.insert(key.into(), value))
	}

	/// Store a raw value, returning the previous one
	pub fn insert_value(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
		self.payload.insert(key.into(), value)
	}

	/// Remove `key`, returning its value
	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.payload.remove(key)
	}

	/// Remove every entry
	pub fn clear(&mut self) {
		self.payload.clear();
	}

	/// Check whether `key` is present
	pub fn contains_key(&self, key: &str) -> bool {
		self.payload.contains_key(key)
	}

	/// Entry keys
	pub fn keys(&self) -> impl Iterator<Item = &String> {
		self.payload.keys()
	}

	/// Number of entries
	pub fn len(&self) -> usize {
		self.payload.len()
	}

	/// Check whether the payload is empty
	pub fn is_empty(&self) -> bool {
		self.payload.is_empty()
	}

	/// Whole payload
	pub fn payload(&self) -> &Payload {
		&self.payload
	}

	/// Mutable access to the whole payload
	pub fn payload_mut(&mut self) -> &mut Payload {
		&mut self.payload
	}

	/// Record that the current payload is what the backend now holds
	pub(crate) fn mark_saved(&mut self) {
		self.baseline = Some(self.payload.clone());
		self.rotated = false;
		self.previous_id = None;
	}

	/// Identifier of the stored record this session moved away from
	pub(crate) fn previous_id(&self) -> Option<&SessionId> {
		self.previous_id.as_ref()
	}

	/// Swap in a new identifier, returning the old one
	///
	/// The first persisted identifier is remembered until the next save, so
	/// rotating twice still retires the record that actually exists.
	pub(crate) fn rotate(&mut self, id: SessionId) -> SessionId {
		self.rotated = true;
		let old = std::mem::replace(&mut self.id, id);
		if !self.is_fresh() && self.previous_id.is_none() {
			self.previous_id = Some(old.clone());
		}
		old
	}
}
