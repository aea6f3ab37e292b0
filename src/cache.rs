//! In-memory TTL response cache keyed by [`RequestKey`](crate::request::RequestKey).
//!
//! Expiry is enforced lazily on every read, so the periodic sweep only bounds memory growth.
//! The cache is an explicit object shared through `Arc`; tests build a fresh one per case.

// std
use std::sync::Weak;
// crates.io
use tokio::task::JoinHandle;
// self
use crate::{_prelude::*, obs};

/// Cached payload plus the bookkeeping needed for TTL checks.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedEntry {
	/// Cached payload.
	pub value: Value,
	/// Instant the entry was written.
	pub stored_at: OffsetDateTime,
	/// Lifetime of the entry.
	pub ttl: Duration,
}
impl CachedEntry {
	/// Returns `true` once more than `ttl` has elapsed since `stored_at`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now - self.stored_at > self.ttl
	}
}

/// Process-wide response cache with per-entry TTLs.
#[derive(Debug)]
pub struct ResponseCache {
	entries: RwLock<HashMap<String, CachedEntry>>,
	default_ttl: Duration,
}
impl ResponseCache {
	/// Default entry lifetime.
	pub const DEFAULT_TTL: Duration = Duration::minutes(5);

	/// Creates an empty cache using `default_ttl` for entries stored via [`ResponseCache::set`].
	pub fn new(default_ttl: Duration) -> Self {
		Self { entries: Default::default(), default_ttl }
	}

	/// TTL applied when none is supplied.
	pub fn default_ttl(&self) -> Duration {
		self.default_ttl
	}

	/// Returns the cached value if present and unexpired.
	pub fn get(&self, key: &str) -> Option<Value> {
		self.get_at(key, OffsetDateTime::now_utc())
	}

	/// Clock-explicit variant of [`ResponseCache::get`]; removes the entry when expired.
	pub fn get_at(&self, key: &str, now: OffsetDateTime) -> Option<Value> {
		{
			let entries = self.entries.read();

			match entries.get(key) {
				None => return None,
				Some(entry) if !entry.is_expired_at(now) => return Some(entry.value.clone()),
				Some(_) => {},
			}
		}

		let mut entries = self.entries.write();

		// Re-check under the write lock; another writer may have refreshed the entry.
		if entries.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
			entries.remove(key);
		}

		entries.get(key).map(|entry| entry.value.clone())
	}

	/// Stores `value` with the default TTL, replacing any existing entry.
	pub fn set(&self, key: impl Into<String>, value: Value) {
		self.set_at(key, value, self.default_ttl, OffsetDateTime::now_utc());
	}

	/// Stores `value` with an explicit TTL, replacing any existing entry.
	pub fn set_with_ttl(&self, key: impl Into<String>, value: Value, ttl: Duration) {
		self.set_at(key, value, ttl, OffsetDateTime::now_utc());
	}

	/// Clock-explicit variant of [`ResponseCache::set_with_ttl`].
	pub fn set_at(&self, key: impl Into<String>, value: Value, ttl: Duration, now: OffsetDateTime) {
		self.entries.write().insert(key.into(), CachedEntry { value, stored_at: now, ttl });
	}

	/// Removes a single entry; absent keys are ignored.
	pub fn delete(&self, key: &str) {
		self.entries.write().remove(key);
	}

	/// Removes every entry whose key starts with `prefix`, returning how many were dropped.
	pub fn delete_by_prefix(&self, prefix: &str) -> usize {
		let mut entries = self.entries.write();
		let before = entries.len();

		entries.retain(|key, _| !key.starts_with(prefix));

		before - entries.len()
	}

	/// Removes every expired entry, returning how many were dropped.
	pub fn sweep(&self) -> usize {
		self.sweep_at(OffsetDateTime::now_utc())
	}

	/// Clock-explicit variant of [`ResponseCache::sweep`].
	pub fn sweep_at(&self, now: OffsetDateTime) -> usize {
		let mut entries = self.entries.write();
		let before = entries.len();

		entries.retain(|_, entry| !entry.is_expired_at(now));

		before - entries.len()
	}

	/// Drops every entry.
	pub fn clear(&self) {
		self.entries.write().clear();
	}

	/// Number of physically stored entries, expired ones included.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Spawns a Tokio task that sweeps the cache every `every`.
	///
	/// The task holds a weak reference and exits once the cache is dropped. Must be called
	/// from within a Tokio runtime.
	pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
		let cache = Arc::downgrade(self);
		let period = every.unsigned_abs().max(std::time::Duration::from_millis(1));

		tokio::spawn(sweep_loop(cache, period))
	}
}
impl Default for ResponseCache {
	fn default() -> Self {
		Self::new(Self::DEFAULT_TTL)
	}
}

async fn sweep_loop(cache: Weak<ResponseCache>, period: std::time::Duration) {
	let mut ticker = tokio::time::interval(period);

	// The first tick completes immediately.
	ticker.tick().await;

	loop {
		ticker.tick().await;

		let Some(cache) = cache.upgrade() else { break };
		let removed = cache.sweep();

		if removed > 0 {
			obs::cache_swept(removed, cache.len());
		}
	}
}
