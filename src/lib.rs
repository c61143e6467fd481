//! # Session Redis
//!
//! Server-side sessions for stateless request/response cycles. The client
//! holds a short random identifier in a cookie; the session payload lives in
//! an expiring key-value store such as Redis.
//!
//! ## Core Principles
//!
//! - **Lazy**: a session is fetched when asked for and written only when it
//!   changed
//! - **Expiring**: every write resets the record TTL and the cookie `Max-Age`
//! - **Forgiving**: unknown, expired, tampered or corrupt sessions become
//!   fresh ones instead of errors
//! - **Explicit**: no global client; a [`SessionStore`] is built and passed
//!   around like any other handle
//!
//! ## Feature Flags
//!
//! - `redis-backend` - Redis backend over a deadpool connection pool
//! - `messagepack` - MessagePack payload codec
//! - `full` - All of the above
//!
//! ## Quick Example
//!
//! ```rust
//! use session_redis::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SessionStore::new(
//! 	InMemoryBackend::new(),
//! 	StoreOptions::new().with_keys(["keyxxx"]),
//! );
//!
//! let mut jar = store.cookie_jar(&http::HeaderMap::new());
//! let mut session = store.load("cookiekey", &jar).await?;
//! session.insert("name", "mushroom")?;
//!
//! if store.save(&mut session, &mut jar).await? == SaveOutcome::Saved {
//! 	for header in jar.set_cookie_headers() {
//! 		println!("Set-Cookie: {}", header);
//! 	}
//! }
//! # Ok(())
//! # }
//! ```

/// Key-value backends holding encoded sessions
pub mod backends {
	pub use session_redis_backends::*;
}

/// Identifiers, codecs, cookies and the store engine
pub mod core {
	pub use session_redis_core::*;
}

pub use session_redis_core::codec;
pub use session_redis_core::{
	BackendError, Base64JsonCodec, Codec, CodecError, ConfigError, CookieJar, CookieOptions,
	CookieSigner, CookieTransport, InMemoryBackend, JsonCodec, Payload, SameSite, SaveOutcome,
	Session, SessionBackend, SessionError, SessionId, SessionStore, StoreOptions,
};

#[cfg(feature = "messagepack")]
pub use session_redis_core::MessagePackCodec;
#[cfg(feature = "redis-backend")]
pub use session_redis_core::RedisBackend;

/// Everything needed to load and save sessions
pub mod prelude {
	pub use crate::{
		CookieJar, CookieTransport, InMemoryBackend, Payload, SaveOutcome, Session, SessionBackend,
		SessionError, SessionStore, StoreOptions,
	};

	#[cfg(feature = "redis-backend")]
	pub use crate::RedisBackend;
}
