//! Redis session backend
//!
//! Stores encoded payloads as plain Redis strings written with `SET .. EX`,
//! so the server discards a session once its TTL lapses without a refresh.

use crate::{BackendError, Result, SessionBackend};
use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Connection, Pool, Runtime};
use redis::AsyncCommands;
use std::time::Duration;

/// Redis session backend with connection pooling
///
/// Uses deadpool-redis so concurrent requests share a bounded set of
/// connections. Cloning shares the pool.
#[derive(Clone)]
pub struct RedisBackend {
	pool: Pool,
}

impl RedisBackend {
	/// Create a backend for the given connection URL
	///
	/// The URL carries address, password and database index, for example
	/// `redis://:secret@127.0.0.1:6379/2`. No connection is opened until the
	/// first command.
	///
	/// # Examples
	///
	/// ```no_run
	/// use session_redis_backends::RedisBackend;
	///
	/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let backend = RedisBackend::new("redis://127.0.0.1:6379/0")?;
	/// # Ok(())
	/// # }
	/// ```
	pub fn new(connection_url: impl Into<String>) -> Result<Self> {
		Self::with_pool_config(PoolConfig::from_url(connection_url))
	}

	/// Create a backend with custom pool configuration
	///
	/// # Examples
	///
	/// ```no_run
	/// use session_redis_backends::RedisBackend;
	/// use deadpool_redis::Config;
	///
	/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let mut config = Config::from_url("redis://127.0.0.1:6379");
	/// config.pool = Some(deadpool_redis::PoolConfig::new(32));
	///
	/// let backend = RedisBackend::with_pool_config(config)?;
	/// # Ok(())
	/// # }
	/// ```
	pub fn with_pool_config(config: PoolConfig) -> Result<Self> {
		let pool = config
			.create_pool(Some(Runtime::Tokio1))
			.map_err(|e| BackendError::Connection(format!("Failed to create Redis pool: {}", e)))?;

		Ok(Self { pool })
	}

	/// Get the connection pool
	pub fn pool(&self) -> &Pool {
		&self.pool
	}

	async fn connection(&self) -> Result<Connection> {
		self.pool.get().await.map_err(|e| {
			BackendError::Connection(format!("Failed to get connection from pool: {}", e))
		})
	}
}

impl std::fmt::Debug for RedisBackend {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RedisBackend")
			.field("pool_status", &self.pool.status())
			.finish()
	}
}

#[async_trait]
impl SessionBackend for RedisBackend {
	async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
		let mut conn = self.connection().await?;

		conn.get(key)
			.await
			.map_err(|e| BackendError::Command(format!("Failed to get value from Redis: {}", e)))
	}

	async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
		let mut conn = self.connection().await?;

		// EX takes whole seconds and rejects zero
		let seconds = ttl.as_secs().max(1);
		let _: () = conn
			.set_ex(key, value, seconds)
			.await
			.map_err(|e| BackendError::Command(format!("Failed to set value in Redis: {}", e)))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<()> {
		let mut conn = self.connection().await?;

		let _: () = conn.del(key).await.map_err(|e| {
			BackendError::Command(format!("Failed to delete value from Redis: {}", e))
		})?;

		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool> {
		let mut conn = self.connection().await?;

		conn.exists(key).await.map_err(|e| {
			BackendError::Command(format!("Failed to check key existence in Redis: {}", e))
		})
	}
}
