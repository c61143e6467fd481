//! # Session Redis Core
//!
//! Session lifecycle engine for server-side sessions.
//!
//! A client keeps a short random identifier in a cookie. The session payload,
//! a map of JSON values, lives in an expiring key-value backend under that
//! identifier. This crate mints identifiers, encodes payloads, signs cookies
//! and decides when a session actually needs to be written back.
//!
//! ## Request Flow
//!
//! 1. [`SessionStore::load`] reads the identifier cookie through a
//!    [`CookieTransport`] and fetches the record from the backend
//! 2. Application code reads and mutates the [`Session`]
//! 3. [`SessionStore::save`] writes the record and refreshes the cookie only
//!    when the payload changed
//!
//! A missing cookie, an unknown or expired identifier, a bad signature or an
//! undecodable record all produce a fresh, empty session rather than an
//! error.
//!
//! ## Example
//!
//! ```rust
//! use session_redis_core::{CookieJar, InMemoryBackend, SessionStore, StoreOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SessionStore::new(
//! 	InMemoryBackend::new(),
//! 	StoreOptions::new().with_keys(["keyxxx"]),
//! );
//!
//! // First request: no cookie yet
//! let mut response = store.cookie_jar(&http::HeaderMap::new());
//! let mut session = store.load("cookiekey", &response).await?;
//! session.insert("name", "mushroom")?;
//! session.insert("num", 99)?;
//! store.save(&mut session, &mut response).await?;
//!
//! // Second request carries the cookies set by the first
//! let mut headers = http::HeaderMap::new();
//! let cookies: Vec<String> = response
//! 	.outgoing()
//! 	.iter()
//! 	.map(|c| format!("{}={}", c.name(), c.value()))
//! 	.collect();
//! headers.insert(http::header::COOKIE, cookies.join("; ").parse()?);
//!
//! let request = store.cookie_jar(&headers);
//! let session = store.load("cookiekey", &request).await?;
//! assert_eq!(session.get::<u64>("num"), Some(99));
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `redis-backend` | disabled | [`SessionStore::connect`] over a pooled Redis backend |
//! | `messagepack` | disabled | MessagePack payload codec |

pub mod codec;
pub mod config;
pub mod cookie;
pub mod error;
pub mod identifier;
pub mod session;
pub mod signer;
pub mod store;

pub use codec::{Base64JsonCodec, Codec, CodecError, JsonCodec};
#[cfg(feature = "messagepack")]
pub use codec::MessagePackCodec;
pub use config::{ConfigError, StoreOptions};
pub use error::{Result, SessionError};
pub use identifier::{EntropyError, EntropySource, OsEntropy, SessionId};
pub use self::cookie::{CookieJar, CookieOptions, CookieTransport, SameSite};
pub use session::{Payload, Session};
pub use signer::CookieSigner;
pub use store::{SaveOutcome, SessionStore};

pub use session_redis_backends::{BackendError, InMemoryBackend, SessionBackend};
#[cfg(feature = "redis-backend")]
pub use session_redis_backends::RedisBackend;
