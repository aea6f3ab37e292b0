//! Crate-level error types shared across the executor, refresh coordinator, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credentials are unusable; callers should force a fresh sign-in.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// The server understood the request and rejected it.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// No response was received (connection failure or timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Credential-store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Response payload did not match the requested type.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Encode(#[source] serde_json::Error),
}
impl Error {
	/// Returns `true` when the error demands a forced sign-out.
	pub fn is_auth(&self) -> bool {
		matches!(self, Self::Auth(_))
	}

	/// Returns `true` for application-level rejections carrying a server message.
	pub fn is_api(&self) -> bool {
		matches!(self, Self::Api(_))
	}

	/// Returns `true` when the backend could not be reached.
	pub fn is_network(&self) -> bool {
		matches!(self, Self::Transport(TransportError::Unreachable { .. }))
	}

	/// Server- or client-provided message suitable for display.
	pub fn user_message(&self) -> String {
		match self {
			Self::Api(e) => e.message.clone(),
			e => e.to_string(),
		}
	}
}

/// Terminal authentication failures raised by the refresh coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthError {
	/// No refresh token is stored; a refresh was never attempted.
	#[error("No refresh token is available.")]
	NoRefreshToken,
	/// The refresh endpoint rejected the stored refresh token.
	#[error("Session expired; sign in again.")]
	JwtExpired,
}
impl AuthError {
	/// Stable code matching the backend's error vocabulary.
	pub const fn code(self) -> &'static str {
		match self {
			Self::NoRefreshToken => "NO_REFRESH_TOKEN",
			Self::JwtExpired => "JWT_EXPIRED",
		}
	}
}

/// Application-level rejection (explicit `success: false` or non-2xx with a body).
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct ApiError {
	/// HTTP status code of the rejecting response.
	pub status: u16,
	/// Server-provided message, or a generic fallback.
	pub message: String,
}
impl ApiError {
	/// Builds a new error for the provided status and message.
	pub fn new(status: u16, message: impl Into<String>) -> Self {
		Self { status, message: message.into() }
	}
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// No response was received: connection refused, DNS failure, or timeout.
	#[error("Network is unreachable: {source}.")]
	Unreachable {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request could not be constructed by the transport.
	#[error("Request could not be built.")]
	Request {
		/// Transport-specific builder error.
		#[source]
		source: BoxError,
	},
	/// The server answered but its body was lost; the request may already have been applied.
	#[error("Response body could not be read (status {status}).")]
	Body {
		/// Status line that did arrive.
		status: u16,
		/// Transport-specific read error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific connectivity error.
	pub fn unreachable(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Unreachable { source: Box::new(src) }
	}

	/// Wraps a transport-specific request construction error.
	pub fn request(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Request { source: Box::new(src) }
	}

	/// Wraps a failure to read the body of a response whose status already arrived.
	pub fn body(status: u16, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Body { status, source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_builder() { Self::request(e) } else { Self::unreachable(e) }
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A URL could not be parsed or joined.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL or path.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses plain HTTP for a non-loopback host.
	#[error("Base URL must use HTTPS: {url}.")]
	InsecureBaseUrl {
		/// Offending base URL.
		url: String,
	},
	/// Base URL cannot carry relative paths (e.g. `mailto:`).
	#[error("Base URL `{url}` cannot be used as a base.")]
	CannotBeABase {
		/// Offending base URL.
		url: String,
	},
	/// Duration setting must be positive.
	#[error("The {setting} setting must be positive.")]
	NonPositiveDuration {
		/// Setting label.
		setting: &'static str,
	},
	/// Environment selector is not recognised.
	#[error("Unknown environment `{0}`.")]
	UnknownEnvironment(String),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Payload decoding failures at the deserialization boundary.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Response body was not valid JSON.
	#[error("Response body is not valid JSON (status {status}).")]
	Json {
		/// HTTP status of the response.
		status: u16,
		/// Underlying parser failure.
		#[source]
		source: serde_json::Error,
	},
	/// Payload did not match the requested type.
	#[error("Payload does not match the expected shape at `{path}`.")]
	Shape {
		/// Path to the offending field.
		path: String,
		/// Underlying deserialization failure.
		#[source]
		source: serde_json::Error,
	},
}
impl From<serde_path_to_error::Error<serde_json::Error>> for DecodeError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self::Shape { path, source: e.into_inner() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, ThisError)]
	#[error("connection refused")]
	struct Refused;

	#[test]
	fn type_guards_classify_variants() {
		let auth: Error = AuthError::JwtExpired.into();
		let api: Error = ApiError::new(422, "Challenge already completed").into();
		let net: Error = TransportError::unreachable(Refused).into();

		assert!(auth.is_auth() && !auth.is_api() && !auth.is_network());
		assert!(api.is_api() && !api.is_network());
		assert!(net.is_network() && !net.is_auth());
		assert!(!Error::from(TransportError::body(201, Refused)).is_network());
		assert_eq!(api.user_message(), "Challenge already completed");
	}

	#[test]
	fn auth_codes_match_backend_vocabulary() {
		assert_eq!(AuthError::NoRefreshToken.code(), "NO_REFRESH_TOKEN");
		assert_eq!(
			serde_json::to_string(&AuthError::JwtExpired)
				.expect("AuthError should serialize to JSON."),
			"\"JWT_EXPIRED\""
		);
	}
}
