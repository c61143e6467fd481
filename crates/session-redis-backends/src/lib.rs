//! # Session Redis Backends
//!
//! Key-value stores that hold encoded session payloads under an expiring key.
//!
//! The session engine only needs two things from a store: fetch the bytes
//! stored under a key, and write bytes under a key with a time-to-live. Every
//! write resets the TTL. Removal and existence checks are used when a session
//! is rotated or destroyed.
//!
//! ## Backends
//!
//! - **In-memory** (always available): per-process store, useful for tests and
//!   single-node deployments
//! - **Redis** (feature: `redis-backend`): pooled connections via deadpool-redis
//!
//! ## Example
//!
//! ```rust
//! use session_redis_backends::{InMemoryBackend, SessionBackend};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = InMemoryBackend::new();
//!
//! backend.set("5f0c", b"payload", Duration::from_secs(60)).await?;
//! assert_eq!(backend.get("5f0c").await?, Some(b"payload".to_vec()));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub mod error;
pub mod in_memory;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use error::{BackendError, Result};
pub use in_memory::InMemoryBackend;
#[cfg(feature = "redis-backend")]
pub use self::redis::RedisBackend;

/// Expiring key-value store holding encoded session payloads
#[async_trait]
pub trait SessionBackend: Send + Sync {
	/// Fetch the raw value stored under `key`
	///
	/// Returns `Ok(None)` when the key does not exist or has expired.
	async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

	/// Store `value` under `key`, expiring after `ttl`
	///
	/// Overwrites any previous value and restarts the expiration clock.
	async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

	/// Remove `key`; removing a missing key is not an error
	async fn delete(&self, key: &str) -> Result<()>;

	/// Check whether `key` currently holds a live value
	async fn exists(&self, key: &str) -> Result<bool>;
}

#[async_trait]
impl<B: SessionBackend + ?Sized> SessionBackend for Arc<B> {
	async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
		(**self).get(key).await
	}

	async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
		(**self).set(key, value, ttl).await
	}

	async fn delete(&self, key: &str) -> Result<()> {
		(**self).delete(key).await
	}

	async fn exists(&self, key: &str) -> Result<bool> {
		(**self).exists(key).await
	}
}
