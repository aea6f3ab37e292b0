//! Response envelope parsing and the tri-state outcome handed back to callers.

// self
use crate::{_prelude::*, error::DecodeError};

/// Message returned with every [`ApiOutcome::Pending`].
pub const PENDING_MESSAGE: &str =
	"You're offline. The action was saved and will be sent once you're back online.";

/// Where a successful payload came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
	/// Fresh response from the backend.
	Network,
	/// Unexpired response cache entry.
	Cache,
	/// Last-known-good snapshot served while the backend is unreachable.
	Offline,
}

/// Tri-state result of a request that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiOutcome<T> {
	/// The request completed (or was answered from cache/snapshot).
	Success {
		/// Unwrapped payload.
		data: T,
		/// Payload origin; [`DataSource::Offline`] means it may be stale.
		source: DataSource,
	},
	/// A mutation was queued for replay because the backend was unreachable.
	Pending {
		/// Identifier of the queued request.
		request_id: String,
		/// Human-readable notice for the user.
		message: String,
	},
}
impl<T> ApiOutcome<T> {
	/// Returns `true` for [`ApiOutcome::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success { .. })
	}

	/// Returns `true` for [`ApiOutcome::Pending`].
	pub fn is_pending(&self) -> bool {
		matches!(self, Self::Pending { .. })
	}

	/// Returns `true` when the payload is an offline snapshot.
	pub fn is_offline(&self) -> bool {
		matches!(self, Self::Success { source: DataSource::Offline, .. })
	}

	/// Payload origin, if successful.
	pub fn source(&self) -> Option<DataSource> {
		match self {
			Self::Success { source, .. } => Some(*source),
			Self::Pending { .. } => None,
		}
	}

	/// Borrows the payload, if successful.
	pub fn data(&self) -> Option<&T> {
		match self {
			Self::Success { data, .. } => Some(data),
			Self::Pending { .. } => None,
		}
	}

	/// Consumes the outcome and returns the payload, if successful.
	pub fn into_data(self) -> Option<T> {
		match self {
			Self::Success { data, .. } => Some(data),
			Self::Pending { .. } => None,
		}
	}
}
impl ApiOutcome<Value> {
	/// Decodes the payload into `T`, reporting the failing field path on mismatch.
	pub fn decode<T>(self) -> Result<ApiOutcome<T>, DecodeError>
	where
		T: DeserializeOwned,
	{
		match self {
			Self::Success { data, source } => {
				let data = serde_path_to_error::deserialize(data)?;

				Ok(ApiOutcome::Success { data, source })
			},
			Self::Pending { request_id, message } => Ok(ApiOutcome::Pending { request_id, message }),
		}
	}
}

/// Explicit form of the backend's `{success, data, message}` wrapper.
///
/// Endpoints that omit `success` are treated as successful. When `data` is absent the whole
/// body is the payload, so endpoints outside the envelope convention still work.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
	/// Application-level success flag; `true` when omitted.
	pub success: bool,
	/// Unwrapped payload.
	pub data: Value,
	/// Server-provided message.
	pub message: Option<String>,
}
impl Envelope {
	/// Parses a raw response body. Blank bodies (e.g. `204 No Content`) yield a `null` payload.
	pub fn parse(status: u16, body: &[u8]) -> Result<Self, DecodeError> {
		if body.iter().all(u8::is_ascii_whitespace) {
			return Ok(Self { success: true, data: Value::Null, message: None });
		}

		let raw: Value =
			serde_json::from_slice(body).map_err(|source| DecodeError::Json { status, source })?;

		Self::from_value(raw)
	}

	/// Interprets an already-parsed JSON body.
	pub fn from_value(raw: Value) -> Result<Self, DecodeError> {
		if !raw.is_object() {
			return Ok(Self { success: true, data: raw, message: None });
		}

		let has_data = raw.get("data").is_some();
		// Only string messages count; payload objects may carry their own `message` field.
		let message = raw.get("message").and_then(Value::as_str).map(ToOwned::to_owned);
		let wire: WireEnvelope = serde_path_to_error::deserialize(&raw)?;
		let data = if has_data { wire.data.unwrap_or(Value::Null) } else { raw };

		Ok(Self { success: wire.success, data, message })
	}

	/// Server message, or a generic fallback for the status.
	pub fn message_or_default(&self, status: u16) -> String {
		self.message
			.clone()
			.filter(|message| !message.trim().is_empty())
			.unwrap_or_else(|| default_failure_message(status))
	}
}

#[derive(Deserialize)]
struct WireEnvelope {
	#[serde(default = "implicit_success")]
	success: bool,
	#[serde(default)]
	data: Option<Value>,
}

fn implicit_success() -> bool {
	true
}

/// Generic message used when the server supplied none.
pub(crate) fn default_failure_message(status: u16) -> String {
	format!("Request failed with status {status}.")
}
