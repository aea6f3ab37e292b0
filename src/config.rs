//! Client configuration: environment selection, base URL, and timing defaults.

pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Backend deployment the client talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
	/// Local backend served from the developer machine.
	Development,
	/// Pre-release backend.
	Staging,
	#[default]
	/// Live backend.
	Production,
}
impl Environment {
	/// Fixed absolute base URL for the environment.
	pub const fn base_url(self) -> &'static str {
		match self {
			Self::Development => "http://localhost:3000/api/",
			Self::Staging => "https://staging-api.skitrip.app/api/",
			Self::Production => "https://api.skitrip.app/api/",
		}
	}

	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Development => "development",
			Self::Staging => "staging",
			Self::Production => "production",
		}
	}
}
impl Display for Environment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Environment {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"development" | "dev" | "local" => Ok(Self::Development),
			"staging" | "stage" => Ok(Self::Staging),
			"production" | "prod" => Ok(Self::Production),
			other => Err(ConfigError::UnknownEnvironment(other.to_owned())),
		}
	}
}

/// Validated settings consumed by [`ApiClient`](crate::client::ApiClient).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Absolute base URL every relative path is joined onto; always ends with `/`.
	pub base_url: Url,
	/// Relative path of the credential refresh endpoint.
	pub refresh_path: String,
	/// Client-side timeout applied to every network call.
	pub request_timeout: Duration,
	/// TTL used when a read does not specify one.
	pub default_cache_ttl: Duration,
	/// Interval between background cache sweeps.
	pub sweep_interval: Duration,
}
impl ClientConfig {
	/// Default refresh endpoint path.
	pub const DEFAULT_REFRESH_PATH: &'static str = "/auth/refresh";
	/// Default per-request timeout.
	pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::seconds(15);
	/// Default response cache TTL.
	pub const DEFAULT_CACHE_TTL: Duration = Duration::minutes(5);
	/// Default background sweep interval.
	pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::minutes(10);

	/// Creates a builder for the provided base URL.
	pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Builds the default configuration for an environment.
	pub fn for_environment(environment: Environment) -> Result<Self, ConfigError> {
		Self::builder(environment.base_url()).build()
	}

	/// Resolves a relative API path against the base URL.
	///
	/// Leading slashes are ignored so `/trips` and `trips` resolve identically under any base
	/// path prefix.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		self.base_url
			.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidUrl { url: path.to_owned(), source })
	}

	/// Absolute URL of the refresh endpoint.
	pub fn refresh_endpoint(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.refresh_path)
	}
}
