//! Session store engine
//!
//! Ties the pieces together: the cookie transport yields an identifier, the
//! backend yields the stored bytes, and the codec turns them into a
//! [`Session`]. Saving runs the same path backwards, but only when the
//! session actually changed.

use crate::codec::{Base64JsonCodec, Codec};
use crate::config::StoreOptions;
use crate::cookie::{CookieJar, CookieTransport};
use crate::error::Result;
use crate::identifier::SessionId;
use crate::session::Session;
use http::HeaderMap;
use session_redis_backends::{BackendError, SessionBackend};
use std::future::Future;
use std::sync::Arc;

#[cfg(feature = "redis-backend")]
use session_redis_backends::RedisBackend;

/// Result of [`SessionStore::save`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
	/// The payload was written and the cookie queued
	Saved,
	/// Nothing changed; no backend write, no cookie
	Unchanged,
}

/// Loads and saves sessions against a backend
///
/// Cloning is cheap and shares the backend, so one store can serve every
/// request.
///
/// # Examples
///
/// ```
/// use session_redis_core::{CookieJar, InMemoryBackend, SaveOutcome, SessionStore, StoreOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SessionStore::new(InMemoryBackend::new(), StoreOptions::default());
///
/// let mut jar = CookieJar::new();
/// let mut session = store.load("Sess", &jar).await?;
/// session.insert("name", "mushroom")?;
/// assert_eq!(store.save(&mut session, &mut jar).await?, SaveOutcome::Saved);
///
/// // Nothing changed since the last save
/// assert_eq!(store.save(&mut session, &mut jar).await?, SaveOutcome::Unchanged);
/// # Ok(())
/// # }
/// ```
pub struct SessionStore<B> {
	backend: Arc<B>,
	codec: Arc<dyn Codec>,
	options: Arc<StoreOptions>,
}

impl<B> Clone for SessionStore<B> {
	fn clone(&self) -> Self {
		Self {
			backend: Arc::clone(&self.backend),
			codec: Arc::clone(&self.codec),
			options: Arc::clone(&self.options),
		}
	}
}

impl<B: SessionBackend> SessionStore<B> {
	/// Create a store over `backend` using the base64 JSON codec
	pub fn new(backend: B, options: StoreOptions) -> Self {
		Self::from_arc(Arc::new(backend), options)
	}

	/// Create a store over a shared backend
	pub fn from_arc(backend: Arc<B>, options: StoreOptions) -> Self {
		Self {
			backend,
			codec: Arc::new(Base64JsonCodec),
			options: Arc::new(options),
		}
	}

	/// Replace the payload codec
	///
	/// Records written with another codec will fail to decode and load as
	/// fresh sessions.
	pub fn with_codec<C: Codec + 'static>(mut self, codec: C) -> Self {
		self.codec = Arc::new(codec);
		self
	}

	/// Store configuration
	pub fn options(&self) -> &StoreOptions {
		&self.options
	}

	/// Underlying backend
	pub fn backend(&self) -> &B {
		&self.backend
	}

	/// Whether identifier cookies are signed
	pub fn is_signed(&self) -> bool {
		self.options.is_signed()
	}

	/// Cookie jar for a request, able to verify and sign with this store's keys
	pub fn cookie_jar(&self, headers: &HeaderMap) -> CookieJar {
		let jar = CookieJar::from_headers(headers);
		match self.options.signer() {
			Some(signer) => jar.with_signer(signer),
			None => jar,
		}
	}

	/// Load the session called `name`
	///
	/// An absent, malformed, unknown, badly signed or undecodable identifier
	/// yields a fresh session with a new identifier. Malformed identifiers
	/// never reach the backend. Only backend failures and an exhausted
	/// entropy source are errors.
	pub async fn load<T>(&self, name: &str, transport: &T) -> Result<Session>
	where
		T: CookieTransport + ?Sized,
	{
		let signed = self.is_signed();

		let Some(raw) = transport.get(name, signed).filter(|v| !v.is_empty()) else {
			tracing::debug!(session = name, "no session cookie, starting fresh session");
			return self.fresh(name, signed);
		};
		let Some(id) = SessionId::parse(&raw) else {
			tracing::debug!(session = name, "malformed session identifier, starting fresh session");
			return self.fresh(name, signed);
		};
		let key = self.backend_key(&id);

		let Some(bytes) = self.bounded(self.backend.get(&key)).await? else {
			tracing::debug!(session = name, "unknown or expired session, starting fresh session");
			return self.fresh(name, signed);
		};

		match self.codec.decode(&bytes) {
			Ok(payload) => {
				tracing::debug!(session = name, entries = payload.len(), "session loaded");
				Ok(Session::hydrated(name, id, payload, signed))
			}
			Err(e) => {
				tracing::warn!(
					session = name,
					codec = self.codec.name(),
					error = %e,
					"discarding undecodable session record"
				);
				self.fresh(name, signed)
			}
		}
	}

	/// Persist `session` if it changed and queue its identifier cookie
	///
	/// Every write resets the record TTL and the cookie `Max-Age`. After a
	/// [`regenerate`](Self::regenerate), the record under the old identifier
	/// is deleted once the new one is written.
	pub async fn save<T>(&self, session: &mut Session, transport: &mut T) -> Result<SaveOutcome>
	where
		T: CookieTransport + ?Sized,
	{
		if !session.is_dirty() {
			tracing::debug!(session = session.name(), "session unchanged, skipping write");
			return Ok(SaveOutcome::Unchanged);
		}

		let bytes = self.codec.encode(session.payload())?;
		let expiration = self.options.expiration();
		let key = self.backend_key(session.id());
		self.bounded(self.backend.set(&key, &bytes, expiration)).await?;

		if let Some(previous) = session.previous_id() {
			let previous_key = self.backend_key(previous);
			self.bounded(self.backend.delete(&previous_key)).await?;
			tracing::debug!(session = session.name(), "retired previous session record");
		}

		transport.set(
			session.name(),
			session.id().as_str(),
			&self.options.cookie_options(session.is_signed()),
		);
		session.mark_saved();

		tracing::debug!(
			session = session.name(),
			bytes = bytes.len(),
			ttl_secs = expiration.as_secs(),
			"session saved"
		);
		Ok(SaveOutcome::Saved)
	}

	/// Give `session` a new identifier
	///
	/// The payload moves to the new identifier on the next
	/// [`save`](Self::save), which always writes and then deletes the old
	/// record. Until then the old record stays loadable.
	pub async fn regenerate(&self, session: &mut Session) -> Result<()> {
		let id = SessionId::generate()?;
		session.rotate(id);

		tracing::debug!(session = session.name(), "session identifier regenerated");
		Ok(())
	}

	/// Delete the session record and expire its cookie
	pub async fn destroy<T>(&self, session: Session, transport: &mut T) -> Result<()>
	where
		T: CookieTransport + ?Sized,
	{
		if !session.is_fresh() {
			let key = self.backend_key(session.id());
			self.bounded(self.backend.delete(&key)).await?;
		}
		transport.remove(
			session.name(),
			&self.options.cookie_options(session.is_signed()),
		);

		tracing::debug!(session = session.name(), "session destroyed");
		Ok(())
	}

	fn fresh(&self, name: &str, signed: bool) -> Result<Session> {
		Ok(Session::fresh(name, SessionId::generate()?, signed))
	}

	fn backend_key(&self, id: &SessionId) -> String {
		format!("{}{}", self.options.key_prefix, id)
	}

	/// Run a backend call under the configured timeout
	async fn bounded<R, F>(&self, operation: F) -> Result<R>
	where
		F: Future<Output = session_redis_backends::Result<R>>,
	{
		let limit = self.options.operation_timeout;
		match tokio::time::timeout(limit, operation).await {
			Ok(result) => Ok(result?),
			Err(_) => {
				tracing::warn!(timeout = ?limit, "session backend call timed out");
				Err(BackendError::Timeout(limit).into())
			}
		}
	}
}

#[cfg(feature = "redis-backend")]
impl SessionStore<RedisBackend> {
	/// Create a store backed by the Redis server described by `options`
	///
	/// No connection is opened until the first load or save.
	pub fn connect(options: StoreOptions) -> Result<Self> {
		let backend = RedisBackend::new(options.redis_url()?)?;
		tracing::info!(addr = %options.addr, db = options.db, "session store configured");
		Ok(Self::new(backend, options))
	}
}

impl<B> std::fmt::Debug for SessionStore<B> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionStore")
			.field("codec", &self.codec.name())
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}
