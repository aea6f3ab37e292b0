//! Typed verb entry points used by screens.

// self
use crate::{
	_prelude::*,
	client::ApiClient,
	http::ApiHttpClient,
	request::{Method, MultipartPart, RequestBody, RequestOptions},
	response::ApiOutcome,
};

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Cached read with the default TTL.
	pub async fn get<T>(&self, path: &str) -> Result<ApiOutcome<T>>
	where
		T: DeserializeOwned,
	{
		self.get_with(path, true, None).await
	}

	/// Read with explicit cache controls.
	pub async fn get_with<T>(
		&self,
		path: &str,
		use_cache: bool,
		cache_ttl: Option<Duration>,
	) -> Result<ApiOutcome<T>>
	where
		T: DeserializeOwned,
	{
		let options = RequestOptions { use_cache, cache_ttl, invalidate: Vec::new() };

		self.call(Method::Get, path, None, options).await
	}

	/// JSON create.
	pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<ApiOutcome<T>>
	where
		T: DeserializeOwned,
		B: ?Sized + Serialize,
	{
		self.post_with(path, body, RequestOptions::no_cache()).await
	}

	/// JSON create with options, typically cache invalidation prefixes.
	pub async fn post_with<T, B>(
		&self,
		path: &str,
		body: &B,
		options: RequestOptions,
	) -> Result<ApiOutcome<T>>
	where
		T: DeserializeOwned,
		B: ?Sized + Serialize,
	{
		self.call(Method::Post, path, Some(RequestBody::json(body)?), options).await
	}

	/// Multipart create (photo and proof uploads).
	pub async fn post_multipart<T>(
		&self,
		path: &str,
		parts: Vec<MultipartPart>,
		options: RequestOptions,
	) -> Result<ApiOutcome<T>>
	where
		T: DeserializeOwned,
	{
		self.call(Method::Post, path, Some(RequestBody::Multipart(parts)), options).await
	}

	/// JSON replace.
	pub async fn put<T, B>(
		&self,
		path: &str,
		body: &B,
		options: RequestOptions,
	) -> Result<ApiOutcome<T>>
	where
		T: DeserializeOwned,
		B: ?Sized + Serialize,
	{
		self.call(Method::Put, path, Some(RequestBody::json(body)?), options).await
	}

	/// Delete.
	pub async fn delete<T>(&self, path: &str) -> Result<ApiOutcome<T>>
	where
		T: DeserializeOwned,
	{
		self.call(Method::Delete, path, None, RequestOptions::no_cache()).await
	}

	/// JSON partial update.
	pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<ApiOutcome<T>>
	where
		T: DeserializeOwned,
		B: ?Sized + Serialize,
	{
		self.call(Method::Patch, path, Some(RequestBody::json(body)?), RequestOptions::no_cache())
			.await
	}

	async fn call<T>(
		&self,
		method: Method,
		path: &str,
		body: Option<RequestBody>,
		options: RequestOptions,
	) -> Result<ApiOutcome<T>>
	where
		T: DeserializeOwned,
	{
		Ok(self.execute(method, path, body, options).await?.decode()?)
	}
}
