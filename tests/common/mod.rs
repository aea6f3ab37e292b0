//! Fixtures shared by the integration suites.

#![allow(dead_code)]

// std
use std::{
	io::{Error as IoError, ErrorKind},
	sync::{
		Arc, Mutex,
		atomic::{AtomicBool, Ordering},
	},
};
// crates.io
use httpmock::MockServer;
// self
use resilient_api::{
	client::ApiClient,
	config::ClientConfig,
	error::TransportError,
	http::{ApiHttpClient, HttpFuture, HttpRequest, ReqwestHttpClient},
	reqwest::Client as ReqwestClient,
	store::{KeyValueStore, MemoryStore, StoreError, StoreFuture},
};

pub const ACCESS: &str = "access-1";
pub const REFRESH: &str = "refresh-1";

pub type TestClient = ApiClient<SwitchableTransport>;

/// Builds a reqwest transport that accepts the self-signed certificates produced by `httpmock`.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Reqwest transport with connectivity switches.
#[derive(Debug)]
pub struct SwitchableTransport {
	inner: ReqwestHttpClient,
	offline: AtomicBool,
	unreachable_path: Mutex<Option<String>>,
	drop_bodies: AtomicBool,
}
impl SwitchableTransport {
	pub fn new() -> Self {
		Self {
			inner: test_reqwest_http_client(),
			offline: AtomicBool::new(false),
			unreachable_path: Mutex::new(None),
			drop_bodies: AtomicBool::new(false),
		}
	}

	/// Fails every request as unreachable.
	pub fn set_offline(&self, offline: bool) {
		self.offline.store(offline, Ordering::SeqCst);
	}

	/// Fails requests to one absolute URL path (e.g. `/api/first`) as unreachable.
	pub fn set_unreachable_path(&self, path: Option<&str>) {
		*self.unreachable_path.lock().expect("Path switch lock should not be poisoned.") =
			path.map(ToOwned::to_owned);
	}

	/// Delivers requests to the server but loses the response body on the way back.
	pub fn set_drop_bodies(&self, drop_bodies: bool) {
		self.drop_bodies.store(drop_bodies, Ordering::SeqCst);
	}

	fn is_unreachable(&self, request: &HttpRequest) -> bool {
		self.offline.load(Ordering::SeqCst)
			|| self
				.unreachable_path
				.lock()
				.expect("Path switch lock should not be poisoned.")
				.as_deref()
				.is_some_and(|path| path == request.url.path())
	}
}
impl ApiHttpClient for SwitchableTransport {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		if self.is_unreachable(&request) {
			return Box::pin(async {
				Err(TransportError::unreachable(IoError::new(
					ErrorKind::NotConnected,
					"network is down",
				)))
			});
		}

		let drop_body = self.drop_bodies.load(Ordering::SeqCst);
		let response = self.inner.execute(request);

		Box::pin(async move {
			let response = response.await?;

			if drop_body {
				return Err(TransportError::body(
					response.status,
					IoError::new(ErrorKind::UnexpectedEof, "connection reset mid-body"),
				));
			}

			Ok(response)
		})
	}
}

/// Credential store whose reads can be made to fail, like a locked keychain.
#[derive(Clone, Debug, Default)]
pub struct FlakyStore {
	inner: MemoryStore,
	failing: Arc<AtomicBool>,
}
impl FlakyStore {
	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}
}
impl KeyValueStore for FlakyStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		if self.failing.load(Ordering::SeqCst) {
			return Box::pin(async {
				Err(StoreError::Backend { message: "keychain locked".into() })
			});
		}

		self.inner.get(key)
	}

	fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		self.inner.set(key, value)
	}

	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		self.inner.delete(key)
	}
}

/// Client plus handles on both of its stores.
pub struct Harness {
	pub client: TestClient,
	pub credential_store: FlakyStore,
	pub offline_store: MemoryStore,
}

pub fn build_harness(server: &MockServer) -> Harness {
	build_harness_with_store(server, MemoryStore::default())
}

/// Builds a client over an existing offline store, as after an app restart.
pub fn build_harness_with_store(server: &MockServer, offline_store: MemoryStore) -> Harness {
	let config = ClientConfig::builder(server.url("/api"))
		.build()
		.expect("Mock server URL should be a valid base URL.");
	let credential_store = FlakyStore::default();
	let client = ApiClient::with_http_client(
		config,
		Arc::new(credential_store.clone()),
		Arc::new(offline_store.clone()),
		Arc::new(SwitchableTransport::new()),
	);

	Harness { client, credential_store, offline_store }
}

pub async fn signed_in_harness(server: &MockServer) -> Harness {
	let harness = build_harness(server);

	harness.client.sign_in(ACCESS, REFRESH).await.expect("Seeding credentials should succeed.");

	harness
}

pub fn bearer(token: &str) -> String {
	format!("Bearer {token}")
}
