//! The request executor and everything it drives: token refresh, verb entry points, and
//! pending-queue replay.

pub mod refresh;
pub mod sync;

mod execute;
mod verbs;

pub use refresh::*;
pub use sync::*;

// self
use crate::{
	_prelude::*,
	auth::{CredentialVault, Credentials, TokenSecret},
	cache::ResponseCache,
	config::ClientConfig,
	http::ApiHttpClient,
	mirror::OfflineMirror,
	store::KeyValueStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestHttpClient>;

/// Resilient API client.
///
/// The client owns the transport, configuration, response cache, offline mirror, and
/// credential vault so each verb call can run the full cache → network → refresh → offline
/// state machine. Clones share every piece of state, including the single-flight refresh
/// guard and the replay guard.
pub struct ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// HTTP transport used for every outbound request.
	pub http_client: Arc<C>,
	/// Validated configuration.
	pub config: ClientConfig,
	/// Response cache shared with any other holder of the `Arc`.
	pub cache: Arc<ResponseCache>,
	/// Snapshot store and pending queue.
	pub mirror: OfflineMirror,
	/// Access/refresh token storage.
	pub credentials: CredentialVault,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh_guard: Arc<AsyncMutex<()>>,
	sync_guard: Arc<AsyncMutex<()>>,
}
impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a client that reuses the caller-provided transport.
	///
	/// `credential_store` is the secure store holding tokens; `offline_store` backs snapshots
	/// and the pending queue. A fresh response cache is created with the configured TTL.
	pub fn with_http_client(
		config: ClientConfig,
		credential_store: Arc<dyn KeyValueStore>,
		offline_store: Arc<dyn KeyValueStore>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		let cache = Arc::new(ResponseCache::new(config.default_cache_ttl));

		Self {
			http_client: http_client.into(),
			config,
			cache,
			mirror: OfflineMirror::new(offline_store),
			credentials: CredentialVault::new(credential_store),
			refresh_metrics: Default::default(),
			refresh_guard: Default::default(),
			sync_guard: Default::default(),
		}
	}

	/// Replaces the response cache, e.g. to share one cache between clients.
	pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
		self.cache = cache;

		self
	}

	/// Starts the periodic cache sweep using the configured interval.
	///
	/// Must be called from within a Tokio runtime.
	pub fn spawn_cache_sweeper(&self) -> tokio::task::JoinHandle<()> {
		self.cache.spawn_sweeper(self.config.sweep_interval)
	}

	/// Stores the token pair issued by the sign-in flow.
	pub async fn sign_in(
		&self,
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
	) -> Result<()> {
		let credentials = Credentials {
			access_token: Some(TokenSecret::new(access_token)),
			refresh_token: Some(TokenSecret::new(refresh_token)),
		};

		self.credentials.store(&credentials).await?;

		Ok(())
	}

	/// Clears both tokens and every cached response.
	///
	/// Offline snapshots and the pending queue are kept.
	pub async fn sign_out(&self) -> Result<()> {
		self.cache.clear();
		self.credentials.clear().await?;

		Ok(())
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestHttpClient> {
	/// Creates a new client backed by a reqwest transport honoring the configured timeout.
	pub fn new(
		config: ClientConfig,
		credential_store: Arc<dyn KeyValueStore>,
		offline_store: Arc<dyn KeyValueStore>,
	) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(config.request_timeout)?;

		Ok(Self::with_http_client(config, credential_store, offline_store, http_client))
	}
}
impl<C> Clone for ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			config: self.config.clone(),
			cache: self.cache.clone(),
			mirror: self.mirror.clone(),
			credentials: self.credentials.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh_guard: self.refresh_guard.clone(),
			sync_guard: self.sync_guard.clone(),
		}
	}
}
impl<C> Debug for ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("cached_entries", &self.cache.len())
			.finish()
	}
}
