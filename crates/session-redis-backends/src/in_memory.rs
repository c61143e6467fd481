//! In-memory session backend
//!
//! Values live in a process-local map and are lost when the process exits.
//! Expired entries are hidden from reads immediately and dropped from memory
//! on the next write or an explicit [`InMemoryBackend::cleanup_expired`].

use crate::{Result, SessionBackend};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Deadline used when `now + ttl` does not fit in an [`Instant`]
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// Stored value with its deadline
#[derive(Debug, Clone)]
struct Entry {
	value: Vec<u8>,
	expires_at: Instant,
}

impl Entry {
	fn new(value: Vec<u8>, ttl: Duration) -> Self {
		let now = Instant::now();
		Self {
			value,
			expires_at: now.checked_add(ttl).unwrap_or(now + FAR_FUTURE),
		}
	}

	fn is_expired(&self) -> bool {
		Instant::now() >= self.expires_at
	}
}

/// In-memory session backend
///
/// Cloning is cheap; clones share the same underlying map.
///
/// # Examples
///
/// ```
/// use session_redis_backends::{InMemoryBackend, SessionBackend};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = InMemoryBackend::new();
/// backend.set("sid", br#"{"cart":3}"#, Duration::from_secs(1800)).await?;
/// assert!(backend.exists("sid").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
	store: Arc<RwLock<HashMap<String, Entry>>>,
	/// Drop expired entries on write once the map grows past this size
	cleanup_threshold: usize,
}

impl InMemoryBackend {
	/// Default number of entries before a write triggers lazy eviction
	const DEFAULT_CLEANUP_THRESHOLD: usize = 10_000;

	/// Create an empty backend
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(HashMap::new())),
			cleanup_threshold: Self::DEFAULT_CLEANUP_THRESHOLD,
		}
	}

	/// Set how many entries may accumulate before writes evict expired ones
	pub fn with_cleanup_threshold(mut self, threshold: usize) -> Self {
		self.cleanup_threshold = threshold;
		self
	}

	/// Remove every expired entry
	pub async fn cleanup_expired(&self) {
		let mut store = self.store.write().await;
		store.retain(|_, entry| !entry.is_expired());
	}

	/// Remaining lifetime of a live key
	///
	/// # Examples
	///
	/// ```
	/// use session_redis_backends::{InMemoryBackend, SessionBackend};
	/// use std::time::Duration;
	///
	/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let backend = InMemoryBackend::new();
	/// backend.set("sid", b"{}", Duration::from_secs(300)).await?;
	///
	/// let remaining = backend.ttl("sid").await.unwrap();
	/// assert!(remaining <= Duration::from_secs(300));
	/// assert_eq!(backend.ttl("missing").await, None);
	/// # Ok(())
	/// # }
	/// ```
	pub async fn ttl(&self, key: &str) -> Option<Duration> {
		let store = self.store.read().await;
		store
			.get(key)
			.filter(|entry| !entry.is_expired())
			.map(|entry| entry.expires_at.saturating_duration_since(Instant::now()))
	}

	/// Number of stored entries, including expired ones not yet evicted
	pub async fn len(&self) -> usize {
		self.store.read().await.len()
	}

	/// Check whether the backend holds no entries at all
	pub async fn is_empty(&self) -> bool {
		self.store.read().await.is_empty()
	}
}

impl Default for InMemoryBackend {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl SessionBackend for InMemoryBackend {
	async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
		let store = self.store.read().await;
		Ok(store
			.get(key)
			.filter(|entry| !entry.is_expired())
			.map(|entry| entry.value.clone()))
	}

	async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
		let mut store = self.store.write().await;
		store.insert(key.to_string(), Entry::new(value.to_vec(), ttl));

		if store.len() > self.cleanup_threshold {
			let before = store.len();
			store.retain(|_, entry| !entry.is_expired());
			tracing::debug!(
				evicted = before - store.len(),
				"evicted expired in-memory session entries"
			);
		}
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<()> {
		self.store.write().await.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool> {
		let store = self.store.read().await;
		Ok(store.get(key).is_some_and(|entry| !entry.is_expired()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;

	#[fixture]
	fn backend() -> InMemoryBackend {
		InMemoryBackend::new()
	}

	#[rstest]
	#[tokio::test]
	async fn test_set_and_get(backend: InMemoryBackend) {
		// Arrange
		let ttl = Duration::from_secs(60);

		// Act
		backend.set("a1", b"first", ttl).await.unwrap();

		// Assert
		assert_eq!(backend.get("a1").await.unwrap(), Some(b"first".to_vec()));
		assert_eq!(backend.get("missing").await.unwrap(), None);
	}

	#[rstest]
	#[tokio::test]
	async fn test_unbounded_ttl_keeps_value(backend: InMemoryBackend) {
		// Act
		backend.set("a1", b"v", Duration::MAX).await.unwrap();

		// Assert
		assert_eq!(backend.get("a1").await.unwrap(), Some(b"v".to_vec()));
		assert!(backend.exists("a1").await.unwrap());
		assert!(backend.ttl("a1").await.is_some_and(|ttl| ttl > Duration::from_secs(86_400)));
	}

	#[rstest]
	#[tokio::test]
	async fn test_set_overwrites_value(backend: InMemoryBackend) {
		backend.set("a1", b"first", Duration::from_secs(60)).await.unwrap();
		backend.set("a1", b"second", Duration::from_secs(60)).await.unwrap();

		assert_eq!(backend.get("a1").await.unwrap(), Some(b"second".to_vec()));
		assert_eq!(backend.len().await, 1);
	}

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_entry_expires_after_ttl(backend: InMemoryBackend) {
		// Arrange
		backend.set("a1", b"v", Duration::from_secs(10)).await.unwrap();

		// Act
		tokio::time::advance(Duration::from_secs(11)).await;

		// Assert
		assert_eq!(backend.get("a1").await.unwrap(), None);
		assert!(!backend.exists("a1").await.unwrap());
		assert_eq!(backend.ttl("a1").await, None);
	}

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_write_resets_ttl(backend: InMemoryBackend) {
		// Arrange
		backend.set("a1", b"v", Duration::from_secs(10)).await.unwrap();
		tokio::time::advance(Duration::from_secs(8)).await;

		// Act
		backend.set("a1", b"v", Duration::from_secs(10)).await.unwrap();
		tokio::time::advance(Duration::from_secs(8)).await;

		// Assert
		assert_eq!(backend.get("a1").await.unwrap(), Some(b"v".to_vec()));
		assert_eq!(backend.ttl("a1").await, Some(Duration::from_secs(2)));
	}

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_cleanup_expired(backend: InMemoryBackend) {
		backend.set("short", b"v", Duration::from_secs(1)).await.unwrap();
		backend.set("long", b"v", Duration::from_secs(100)).await.unwrap();
		tokio::time::advance(Duration::from_secs(2)).await;

		backend.cleanup_expired().await;

		assert_eq!(backend.len().await, 1);
		assert!(backend.exists("long").await.unwrap());
	}

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_lazy_eviction_past_threshold() {
		// Arrange
		let backend = InMemoryBackend::new().with_cleanup_threshold(2);
		backend.set("old1", b"v", Duration::from_secs(1)).await.unwrap();
		backend.set("old2", b"v", Duration::from_secs(1)).await.unwrap();
		tokio::time::advance(Duration::from_secs(2)).await;

		// Act
		backend.set("new", b"v", Duration::from_secs(60)).await.unwrap();

		// Assert
		assert_eq!(backend.len().await, 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete(backend: InMemoryBackend) {
		backend.set("a1", b"v", Duration::from_secs(60)).await.unwrap();

		backend.delete("a1").await.unwrap();
		backend.delete("never-existed").await.unwrap();

		assert!(backend.is_empty().await);
	}

	#[rstest]
	#[tokio::test]
	async fn test_clones_share_storage(backend: InMemoryBackend) {
		let clone = backend.clone();

		clone.set("shared", b"v", Duration::from_secs(60)).await.unwrap();

		assert!(backend.exists("shared").await.unwrap());
	}
}
