//! Offline mirror: last-known-good read snapshots plus the persistent queue of mutations made
//! while the backend was unreachable.
//!
//! The mirror is best-effort. Every storage failure is logged and swallowed so it never breaks
//! the caller's request flow. Queue mutations are serialized through an async mutex, so
//! interleaved enqueue/remove calls cannot lose each other's updates.

// self
use crate::{
	_prelude::*,
	obs,
	request::{Method, RequestBody, RequestKey, RequestOptions},
	store::{KeyValueStore, StoreError},
};

/// Storage key of the serialized pending queue.
pub const PENDING_QUEUE_KEY: &str = "offline:pending_requests";
/// Storage key prefix of per-endpoint snapshots.
pub const SNAPSHOT_KEY_PREFIX: &str = "offline:snapshot:";

/// Mutation recorded while offline; immutable once queued.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingRequest {
	/// Unique identifier.
	pub id: String,
	/// Verb to replay.
	pub method: Method,
	/// Relative API path.
	pub path: String,
	/// Payload to replay.
	pub body: Option<RequestBody>,
	/// Options captured at enqueue time.
	pub options: RequestOptions,
	/// Enqueue instant.
	#[serde(with = "time::serde::rfc3339")]
	pub enqueued_at: OffsetDateTime,
}
impl PendingRequest {
	/// Identity of the queued request.
	pub fn key(&self) -> RequestKey {
		RequestKey::new(self.method, &self.path)
	}
}

/// Snapshot store and pending queue over an opaque persistent key-value store.
#[derive(Clone)]
pub struct OfflineMirror {
	store: Arc<dyn KeyValueStore>,
	queue_guard: Arc<AsyncMutex<()>>,
}
impl OfflineMirror {
	/// Wraps the provided persistent store.
	pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
		Self { store, queue_guard: Default::default() }
	}

	/// Persists `value` as the snapshot for `key`, replacing the previous one.
	pub async fn save_snapshot(&self, key: &RequestKey, value: &Value) {
		let storage_key = snapshot_key(key);
		let result = match serde_json::to_string(value) {
			Ok(raw) => self.store.set(&storage_key, raw).await,
			Err(e) => Err(StoreError::serialization(e)),
		};

		if let Err(e) = result {
			obs::storage_failure("save_snapshot", &storage_key, &e);
		}
	}

	/// Returns the last snapshot stored for `key`.
	pub async fn read_snapshot(&self, key: &RequestKey) -> Option<Value> {
		let storage_key = snapshot_key(key);
		let raw = match self.store.get(&storage_key).await {
			Ok(raw) => raw?,
			Err(e) => {
				obs::storage_failure("read_snapshot", &storage_key, &e);

				return None;
			},
		};

		match serde_json::from_str(&raw) {
			Ok(value) => Some(value),
			Err(e) => {
				obs::storage_failure("read_snapshot", &storage_key, &e);

				None
			},
		}
	}

	/// Appends a mutation to the queue with a fresh id and timestamp.
	///
	/// The returned request is the one that was (or, on storage failure, would have been)
	/// persisted.
	pub async fn enqueue(
		&self,
		method: Method,
		path: &str,
		body: Option<RequestBody>,
		options: RequestOptions,
	) -> PendingRequest {
		let request = PendingRequest {
			id: generate_id(),
			method,
			path: path.to_owned(),
			body,
			options,
			enqueued_at: OffsetDateTime::now_utc(),
		};
		let _guard = self.queue_guard.lock().await;
		let mut queue = self.load_queue().await;

		queue.push(request.clone());
		self.persist_queue(&queue, "enqueue").await;

		request
	}

	/// Returns every queued request in FIFO order.
	pub async fn list_queued(&self) -> Vec<PendingRequest> {
		let _guard = self.queue_guard.lock().await;

		self.load_queue().await
	}

	/// Number of queued requests.
	pub async fn queued_len(&self) -> usize {
		self.list_queued().await.len()
	}

	/// Removes one queued request; unknown ids are ignored.
	pub async fn remove(&self, id: &str) {
		let _guard = self.queue_guard.lock().await;
		let mut queue = self.load_queue().await;
		let before = queue.len();

		queue.retain(|request| request.id != id);

		if queue.len() != before {
			self.persist_queue(&queue, "remove").await;
		}
	}

	/// Drops every queued request.
	pub async fn clear_queue(&self) {
		let _guard = self.queue_guard.lock().await;

		if let Err(e) = self.store.delete(PENDING_QUEUE_KEY).await {
			obs::storage_failure("clear_queue", PENDING_QUEUE_KEY, &e);
		}
	}

	async fn load_queue(&self) -> Vec<PendingRequest> {
		let raw = match self.store.get(PENDING_QUEUE_KEY).await {
			Ok(Some(raw)) => raw,
			Ok(None) => return Vec::new(),
			Err(e) => {
				obs::storage_failure("load_queue", PENDING_QUEUE_KEY, &e);

				return Vec::new();
			},
		};

		match serde_json::from_str(&raw) {
			Ok(queue) => queue,
			Err(e) => {
				obs::storage_failure("load_queue", PENDING_QUEUE_KEY, &e);

				Vec::new()
			},
		}
	}

	async fn persist_queue(&self, queue: &[PendingRequest], action: &'static str) {
		let result = match serde_json::to_string(queue) {
			Ok(raw) => self.store.set(PENDING_QUEUE_KEY, raw).await,
			Err(e) => Err(StoreError::serialization(e)),
		};

		if let Err(e) = result {
			obs::storage_failure(action, PENDING_QUEUE_KEY, &e);
		}
	}
}
impl Debug for OfflineMirror {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("OfflineMirror(..)")
	}
}

fn snapshot_key(key: &RequestKey) -> String {
	format!("{SNAPSHOT_KEY_PREFIX}{key}")
}

fn generate_id() -> String {
	let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;

	format!("{millis:x}-{:016x}", rand::random::<u64>())
}
