//! Validating builder for [`ClientConfig`](crate::config::ClientConfig).

// self
use crate::{_prelude::*, config::ClientConfig, error::ConfigError};

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Raw base URL to validate.
	pub base_url: String,
	/// Relative refresh endpoint path.
	pub refresh_path: String,
	/// Client-side timeout applied to every network call.
	pub request_timeout: Duration,
	/// TTL used when a read does not specify one.
	pub default_cache_ttl: Duration,
	/// Interval between background cache sweeps.
	pub sweep_interval: Duration,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with defaults.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			refresh_path: ClientConfig::DEFAULT_REFRESH_PATH.into(),
			request_timeout: ClientConfig::DEFAULT_REQUEST_TIMEOUT,
			default_cache_ttl: ClientConfig::DEFAULT_CACHE_TTL,
			sweep_interval: ClientConfig::DEFAULT_SWEEP_INTERVAL,
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the per-request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the default cache TTL.
	pub fn default_cache_ttl(mut self, ttl: Duration) -> Self {
		self.default_cache_ttl = ttl;

		self
	}

	/// Overrides the background sweep interval.
	pub fn sweep_interval(mut self, interval: Duration) -> Self {
		self.sweep_interval = interval;

		self
	}

	/// Validates the settings and builds the config.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let mut base_url = Url::parse(&self.base_url)
			.map_err(|source| ConfigError::InvalidUrl { url: self.base_url.clone(), source })?;

		if base_url.cannot_be_a_base() {
			return Err(ConfigError::CannotBeABase { url: self.base_url });
		}

		match base_url.scheme() {
			"https" => {},
			"http" if is_loopback(&base_url) => {},
			_ => return Err(ConfigError::InsecureBaseUrl { url: self.base_url }),
		}

		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		for (setting, value) in [
			("request_timeout", self.request_timeout),
			("default_cache_ttl", self.default_cache_ttl),
			("sweep_interval", self.sweep_interval),
		] {
			if !value.is_positive() {
				return Err(ConfigError::NonPositiveDuration { setting });
			}
		}

		Ok(ClientConfig {
			base_url,
			refresh_path: self.refresh_path,
			request_timeout: self.request_timeout,
			default_cache_ttl: self.default_cache_ttl,
			sweep_interval: self.sweep_interval,
		})
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain == "localhost",
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rejects_plain_http_for_remote_hosts() {
		let err = ClientConfig::builder("http://api.example.com")
			.build()
			.expect_err("Plain HTTP should be rejected for remote hosts.");

		assert!(matches!(err, ConfigError::InsecureBaseUrl { .. }));

		ClientConfig::builder("http://127.0.0.1:8080")
			.build()
			.expect("Plain HTTP should be accepted for loopback hosts.");
	}

	#[test]
	fn rejects_non_positive_durations() {
		let err = ClientConfig::builder("https://api.example.com")
			.default_cache_ttl(Duration::ZERO)
			.build()
			.expect_err("Zero TTL should be rejected.");

		assert!(matches!(err, ConfigError::NonPositiveDuration { setting: "default_cache_ttl" }));
	}

	#[test]
	fn normalizes_trailing_slash() {
		let config = ClientConfig::builder("https://api.example.com/v2")
			.build()
			.expect("Config should build.");

		assert_eq!(config.base_url.as_str(), "https://api.example.com/v2/");
	}
}
