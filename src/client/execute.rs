//! Request executor state machine.
//!
//! One call walks: cache hit → authorized dispatch → (401 → single refresh → one retry) →
//! envelope check → side effects. When no response arrives at all, reads fall back to the
//! offline snapshot and mutations are queued for replay.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	client::ApiClient,
	error::ApiError,
	http::{ApiHttpClient, HttpRequest, HttpResponse},
	obs::{self, Operation, Outcome, RequestSpan},
	request::{Method, RequestBody, RequestKey, RequestOptions},
	response::{self, ApiOutcome, DataSource, Envelope, PENDING_MESSAGE},
};

/// How network-unreachable failures are handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
	/// Caller-issued request: fall back to snapshots or queue the mutation.
	Live,
	/// Queue replay: surface the network error so the entry stays queued.
	Replay,
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Executes one request through the cache, refresh, and offline machinery.
	///
	/// Returns [`ApiOutcome::Success`] (network, cache, or offline snapshot) or
	/// [`ApiOutcome::Pending`] for mutations queued while offline. Errors are
	/// [`Error::Auth`] (force sign-out), [`Error::Api`] (server rejection), or
	/// [`Error::Transport`] for reads with no snapshot to fall back to.
	pub async fn execute(
		&self,
		method: Method,
		path: &str,
		body: Option<RequestBody>,
		options: RequestOptions,
	) -> Result<ApiOutcome<Value>> {
		const OP: Operation = Operation::Execute;

		let key = RequestKey::new(method, path);
		let span = RequestSpan::new(OP, key.as_str());

		obs::record_outcome(OP, Outcome::Attempt);

		let result = span.instrument(self.run(method, path, body, options, Mode::Live)).await;
		let outcome = match &result {
			Ok(ApiOutcome::Success { source: DataSource::Network, .. }) => Outcome::Success,
			Ok(ApiOutcome::Success { source: DataSource::Cache, .. }) => Outcome::CacheHit,
			Ok(ApiOutcome::Success { source: DataSource::Offline, .. }) => Outcome::Offline,
			Ok(ApiOutcome::Pending { .. }) => Outcome::Pending,
			Err(_) => Outcome::Failure,
		};

		obs::record_outcome(OP, outcome);

		result
	}

	pub(crate) async fn run(
		&self,
		method: Method,
		path: &str,
		body: Option<RequestBody>,
		options: RequestOptions,
		mode: Mode,
	) -> Result<ApiOutcome<Value>> {
		let key = RequestKey::new(method, path);
		let use_cache = options.use_cache && method.is_read() && mode == Mode::Live;

		if use_cache {
			if let Some(data) = self.cache.get(key.as_str()) {
				return Ok(ApiOutcome::Success { data, source: DataSource::Cache });
			}
		}

		let url = self.config.endpoint(path)?;

		match self.dispatch_authorized(method, &url, body.as_ref()).await {
			Ok(envelope) => {
				let data = envelope.data;

				if method.is_read() {
					self.mirror.save_snapshot(&key, &data).await;

					if use_cache {
						let ttl = options.cache_ttl.unwrap_or_else(|| self.cache.default_ttl());

						self.cache.set_with_ttl(key.as_str(), data.clone(), ttl);
					}
				}
				for prefix in &options.invalidate {
					self.cache.delete_by_prefix(&RequestKey::read_prefix(prefix));
				}

				Ok(ApiOutcome::Success { data, source: DataSource::Network })
			},
			Err(e) if e.is_network() && mode == Mode::Live =>
				if method.is_read() {
					match self.mirror.read_snapshot(&key).await {
						Some(data) => {
							obs::offline_fallback(key.as_str());

							Ok(ApiOutcome::Success { data, source: DataSource::Offline })
						},
						None => Err(e),
					}
				} else {
					let pending = self.mirror.enqueue(method, path, body, options).await;

					obs::request_queued(key.as_str(), &pending.id);

					Ok(ApiOutcome::Pending {
						request_id: pending.id,
						message: PENDING_MESSAGE.into(),
					})
				},
			Err(e) => Err(e),
		}
	}

	/// Sends the request with the current access token, refreshing and retrying once on 401.
	///
	/// A second 401 after a successful refresh is returned as an [`ApiError`].
	async fn dispatch_authorized(
		&self,
		method: Method,
		url: &Url,
		body: Option<&RequestBody>,
	) -> Result<Envelope> {
		let token = self.credentials.access_token().await?;
		let mut response = self.send(method, url, token.clone(), body).await?;

		if response.is_unauthorized() {
			self.refresh(token.as_ref()).await?;

			let token = self.credentials.access_token().await?;

			response = self.send(method, url, token, body).await?;
		}

		interpret(response)
	}

	async fn send(
		&self,
		method: Method,
		url: &Url,
		bearer: Option<TokenSecret>,
		body: Option<&RequestBody>,
	) -> Result<HttpResponse> {
		let request = HttpRequest { method, url: url.clone(), bearer, body: body.cloned() };

		Ok(self.http_client.execute(request).await?)
	}
}

/// Classifies a received response into a payload or an [`ApiError`].
fn interpret(response: HttpResponse) -> Result<Envelope> {
	let status = response.status;

	if response.is_success() {
		let envelope = Envelope::parse(status, &response.body)?;

		if !envelope.success {
			return Err(ApiError::new(status, envelope.message_or_default(status)).into());
		}

		return Ok(envelope);
	}

	let message = match Envelope::parse(status, &response.body) {
		Ok(envelope) => envelope.message_or_default(status),
		Err(_) => plain_text_message(&response.body)
			.unwrap_or_else(|| response::default_failure_message(status)),
	};

	Err(ApiError::new(status, message).into())
}

fn plain_text_message(body: &[u8]) -> Option<String> {
	const MAX_LEN: usize = 200;

	let text = std::str::from_utf8(body).ok()?.trim();

	if text.is_empty() || text.len() > MAX_LEN || text.starts_with('<') {
		return None;
	}

	Some(text.to_owned())
}
