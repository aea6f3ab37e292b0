//! Transport primitives for API calls.
//!
//! [`ApiHttpClient`] is the client's only dependency on an HTTP stack. Implementations turn an
//! [`HttpRequest`] into an [`HttpResponse`] for any status code the server returns and reserve
//! [`TransportError::Unreachable`] for the cases where no response arrived at all (connection
//! failure, DNS failure, timeout). A body lost after the status line arrived is
//! [`TransportError::Body`] instead. The request executor relies on that split to choose between
//! the error path and the offline path.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::TransportError,
	request::{Method, RequestBody},
};
#[cfg(feature = "reqwest")]
use crate::{
	error::ConfigError,
	request::{MultipartPart, PartContent},
};

/// Boxed future returned by [`ApiHttpClient::execute`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports used by the request executor and refresh coordinator.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Dispatches the request and returns whatever response the server produced.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_>;
}

/// Fully resolved outbound request.
#[derive(Clone, Debug)]
pub struct HttpRequest {
	/// Verb.
	pub method: Method,
	/// Absolute URL.
	pub url: Url,
	/// Bearer credential placed in the `Authorization` header.
	pub bearer: Option<TokenSecret>,
	/// Optional payload.
	pub body: Option<RequestBody>,
}

/// Raw response as received from the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` when the server rejected the credentials.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that applies `timeout` to every request.
	pub fn with_timeout(timeout: Duration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout.unsigned_abs()).build()?;

		Ok(Self(client))
	}

	fn build(&self, request: HttpRequest) -> Result<reqwest::RequestBuilder, TransportError> {
		let mut builder = self.0.request(reqwest_method(request.method), request.url);

		if let Some(token) = &request.bearer {
			builder = builder.header(reqwest::header::AUTHORIZATION, token.bearer());
		}

		builder = match request.body {
			None => builder,
			Some(RequestBody::Json(value)) => builder
				.header(reqwest::header::CONTENT_TYPE, "application/json")
				.body(serde_json::to_vec(&value).map_err(TransportError::request)?),
			Some(RequestBody::Multipart(parts)) => builder.multipart(multipart_form(parts)?),
		};

		Ok(builder)
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			let response = self.build(request)?.send().await?;
			let status = response.status().as_u16();
			// The server has seen the request by now, so a lost body must not look like an outage.
		let body = response.bytes().await.map_err(|e| TransportError::body(status, e))?.to_vec();

			Ok(HttpResponse { status, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn reqwest_method(method: Method) -> reqwest::Method {
	match method {
		Method::Get => reqwest::Method::GET,
		Method::Post => reqwest::Method::POST,
		Method::Put => reqwest::Method::PUT,
		Method::Delete => reqwest::Method::DELETE,
		Method::Patch => reqwest::Method::PATCH,
	}
}

#[cfg(feature = "reqwest")]
fn multipart_form(parts: Vec<MultipartPart>) -> Result<reqwest::multipart::Form, TransportError> {
	let mut form = reqwest::multipart::Form::new();

	for MultipartPart { name, content } in parts {
		form = match content {
			PartContent::Text(value) => form.text(name, value),
			PartContent::File { file_name, mime, bytes } => {
				let part = reqwest::multipart::Part::bytes(bytes)
					.file_name(file_name)
					.mime_str(&mime)
					.map_err(TransportError::request)?;

				form.part(name, part)
			},
		};
	}

	Ok(form)
}
