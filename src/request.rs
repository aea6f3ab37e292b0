//! Request descriptions shared by the executor, the cache, and the pending queue.

// self
use crate::_prelude::*;

/// HTTP verbs exposed to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// Read; the only cache- and snapshot-eligible verb.
	Get,
	/// Create.
	Post,
	/// Replace.
	Put,
	/// Remove.
	Delete,
	/// Partial update.
	Patch,
}
impl Method {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Delete => "DELETE",
			Self::Patch => "PATCH",
		}
	}

	/// Returns `true` for read-class verbs.
	pub const fn is_read(self) -> bool {
		matches!(self, Self::Get)
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Deterministic identity of a request, shared by the response cache and offline mirror.
///
/// Rendered as `<VERB>:<path>`. Paths are used verbatim, so callers must pass a stable
/// spelling (including query string order).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey(String);
impl RequestKey {
	/// Derives the key for a verb + path pair.
	pub fn new(method: Method, path: &str) -> Self {
		Self(format!("{}:{path}", method.as_str()))
	}

	/// Cache-key prefix covering every read whose path starts with `path_prefix`.
	pub fn read_prefix(path_prefix: &str) -> String {
		format!("{}:{path_prefix}", Method::Get.as_str())
	}

	/// Returns the rendered key.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for RequestKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Display for RequestKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Outbound request payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RequestBody {
	/// `application/json` body.
	Json(Value),
	/// `multipart/form-data` body (photo uploads, challenge proofs).
	Multipart(Vec<MultipartPart>),
}
impl RequestBody {
	/// Serializes any value into a JSON body.
	pub fn json<T>(value: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		serde_json::to_value(value).map(Self::Json).map_err(Error::Encode)
	}

	/// Returns `true` for multipart bodies.
	pub fn is_multipart(&self) -> bool {
		matches!(self, Self::Multipart(_))
	}
}

/// One field of a multipart form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartPart {
	/// Form field name.
	pub name: String,
	/// Field content.
	pub content: PartContent,
}
impl MultipartPart {
	/// Builds a text field.
	pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self { name: name.into(), content: PartContent::Text(value.into()) }
	}

	/// Builds a file field.
	pub fn file(
		name: impl Into<String>,
		file_name: impl Into<String>,
		mime: impl Into<String>,
		bytes: Vec<u8>,
	) -> Self {
		Self {
			name: name.into(),
			content: PartContent::File { file_name: file_name.into(), mime: mime.into(), bytes },
		}
	}
}

/// Content of a multipart field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartContent {
	/// Plain text value.
	Text(String),
	/// Binary file.
	File {
		/// File name reported to the server.
		file_name: String,
		/// MIME type, e.g. `image/jpeg`.
		mime: String,
		/// Raw bytes.
		bytes: Vec<u8>,
	},
}

/// Per-call behavior switches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
	/// Serve and populate the response cache (reads only).
	pub use_cache: bool,
	/// TTL override for the cache entry written by this call.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cache_ttl: Option<Duration>,
	/// Path prefixes whose cached reads are evicted after this call succeeds.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub invalidate: Vec<String>,
}
impl Default for RequestOptions {
	fn default() -> Self {
		Self { use_cache: true, cache_ttl: None, invalidate: Vec::new() }
	}
}
impl RequestOptions {
	/// Options that bypass the response cache.
	pub fn no_cache() -> Self {
		Self { use_cache: false, ..Self::default() }
	}

	/// Toggles cache usage.
	pub fn with_cache(mut self, use_cache: bool) -> Self {
		self.use_cache = use_cache;

		self
	}

	/// Overrides the cache TTL.
	pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
		self.cache_ttl = Some(ttl);

		self
	}

	/// Adds one invalidation prefix.
	pub fn invalidate(mut self, path_prefix: impl Into<String>) -> Self {
		self.invalidate.push(path_prefix.into());

		self
	}

	/// Adds several invalidation prefixes.
	pub fn invalidate_all<I, S>(mut self, prefixes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.invalidate.extend(prefixes.into_iter().map(Into::into));

		self
	}
}
