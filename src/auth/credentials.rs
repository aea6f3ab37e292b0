//! Access/refresh token persistence on top of an opaque secure key-value store.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{KeyValueStore, StoreError},
};

/// Storage key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Storage key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Snapshot of the stored token pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
	/// Bearer token attached to every API call.
	pub access_token: Option<TokenSecret>,
	/// Token exchanged at the refresh endpoint for a new access token.
	pub refresh_token: Option<TokenSecret>,
}

/// Typed view over the secure credential store.
#[derive(Clone)]
pub struct CredentialVault(Arc<dyn KeyValueStore>);
impl CredentialVault {
	/// Wraps the provided secure store.
	pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
		Self(store)
	}

	/// Loads both tokens.
	pub async fn load(&self) -> Result<Credentials, StoreError> {
		Ok(Credentials {
			access_token: self.access_token().await?,
			refresh_token: self.refresh_token().await?,
		})
	}

	/// Reads the current access token.
	pub async fn access_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		self.read(ACCESS_TOKEN_KEY).await
	}

	/// Reads the current refresh token.
	pub async fn refresh_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		self.read(REFRESH_TOKEN_KEY).await
	}

	/// Replaces the access token.
	pub async fn set_access_token(&self, token: &TokenSecret) -> Result<(), StoreError> {
		self.0.set(ACCESS_TOKEN_KEY, token.expose().to_owned()).await
	}

	/// Replaces the refresh token.
	pub async fn set_refresh_token(&self, token: &TokenSecret) -> Result<(), StoreError> {
		self.0.set(REFRESH_TOKEN_KEY, token.expose().to_owned()).await
	}

	/// Stores a full token pair, as issued by the sign-in flow.
	pub async fn store(&self, credentials: &Credentials) -> Result<(), StoreError> {
		match &credentials.access_token {
			Some(token) => self.set_access_token(token).await?,
			None => self.0.delete(ACCESS_TOKEN_KEY).await?,
		}
		match &credentials.refresh_token {
			Some(token) => self.set_refresh_token(token).await?,
			None => self.0.delete(REFRESH_TOKEN_KEY).await?,
		}

		Ok(())
	}

	/// Deletes both tokens.
	pub async fn clear(&self) -> Result<(), StoreError> {
		self.0.delete(ACCESS_TOKEN_KEY).await?;
		self.0.delete(REFRESH_TOKEN_KEY).await
	}

	async fn read(&self, key: &str) -> Result<Option<TokenSecret>, StoreError> {
		Ok(self.0.get(key).await?.filter(|value| !value.is_empty()).map(TokenSecret::new))
	}
}
impl Debug for CredentialVault {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("CredentialVault(..)")
	}
}
