//! Credential renewal with a single-flight guard.
//!
//! Callers that hit a 401 hand over the access token the server rejected. The first caller
//! through the guard calls the refresh endpoint; callers queued behind it notice the stored
//! access token has already changed and return without a second network call. A rejected
//! refresh token clears both stored tokens and surfaces [`AuthError::JwtExpired`], the
//! signal for a forced sign-out.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	client::ApiClient,
	error::AuthError,
	http::{ApiHttpClient, HttpRequest, HttpResponse},
	obs::{self, Operation, Outcome, RequestSpan},
	request::Method,
	response::Envelope,
};

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Forces a credential refresh regardless of the current access token.
	pub async fn refresh_access_token(&self) -> Result<()> {
		self.refresh(None).await
	}

	/// Refreshes credentials after `rejected` was refused, joining any refresh that completed
	/// while this caller waited for the guard.
	pub(crate) async fn refresh(&self, rejected: Option<&TokenSecret>) -> Result<()> {
		const OP: Operation = Operation::Refresh;

		let span = RequestSpan::new(OP, "refresh_access_token");

		obs::record_outcome(OP, Outcome::Attempt);

		let result = span
			.instrument(async move {
				self.refresh_metrics.record_attempt();

				let _singleflight = self.refresh_guard.lock().await;

				if let Some(rejected) = rejected {
					let current = self.credentials.access_token().await.inspect_err(|_| {
						self.refresh_metrics.record_failure();
					})?;

					match current {
						// The refresh this caller waited on was rejected and cleared the session.
						None => {
							self.refresh_metrics.record_failure();

							return Err(AuthError::JwtExpired.into());
						},
						Some(current) if &current != rejected => {
							self.refresh_metrics.record_joined();

							return Ok(());
						},
						Some(_) => {},
					}
				}

				self.renew().await.inspect(|_| self.refresh_metrics.record_success()).inspect_err(
					|_| {
						self.refresh_metrics.record_failure();
					},
				)
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(OP, Outcome::Success),
			Err(_) => obs::record_outcome(OP, Outcome::Failure),
		}

		result
	}

	async fn renew(&self) -> Result<()> {
		let refresh_token =
			self.credentials.refresh_token().await?.ok_or(AuthError::NoRefreshToken)?;
		let request = HttpRequest {
			method: Method::Post,
			url: self.config.refresh_endpoint()?,
			bearer: Some(refresh_token),
			body: None,
		};
		// Network failures propagate untouched; the refresh token was never rejected.
		let response = self.http_client.execute(request).await?;
		let Some(issued) = IssuedTokens::from_response(&response) else {
			if let Err(e) = self.credentials.clear().await {
				obs::storage_failure("clear_credentials", "credentials", &e);
			}

			return Err(AuthError::JwtExpired.into());
		};

		self.credentials.set_access_token(&issued.access_token).await?;

		if let Some(refresh_token) = &issued.refresh_token {
			self.credentials.set_refresh_token(refresh_token).await?;
		}

		Ok(())
	}
}

/// Tokens returned by the refresh endpoint.
#[derive(Debug)]
struct IssuedTokens {
	access_token: TokenSecret,
	refresh_token: Option<TokenSecret>,
}
impl IssuedTokens {
	fn from_response(response: &HttpResponse) -> Option<Self> {
		if !response.is_success() {
			return None;
		}

		let envelope = Envelope::parse(response.status, &response.body).ok()?;

		if !envelope.success {
			return None;
		}

		let access_token = token_field(&envelope.data, &["accessToken", "access_token"])?;
		let refresh_token = token_field(&envelope.data, &["refreshToken", "refresh_token"]);

		Some(Self { access_token, refresh_token })
	}
}

fn token_field(data: &Value, names: &[&str]) -> Option<TokenSecret> {
	names
		.iter()
		.find_map(|name| data.get(name)?.as_str())
		.filter(|token| !token.is_empty())
		.map(TokenSecret::new)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(status: u16, body: &str) -> HttpResponse {
		HttpResponse { status, body: body.as_bytes().to_vec() }
	}

	#[test]
	fn issued_tokens_accept_both_spellings() {
		let camel = IssuedTokens::from_response(&response(
			200,
			r#"{"success":true,"data":{"accessToken":"a-2","refreshToken":"r-2"}}"#,
		))
		.expect("camelCase tokens should parse.");
		let snake = IssuedTokens::from_response(&response(200, r#"{"access_token":"a-3"}"#))
			.expect("snake_case tokens should parse.");

		assert_eq!(camel.access_token.expose(), "a-2");
		assert_eq!(camel.refresh_token.as_ref().map(TokenSecret::expose), Some("r-2"));
		assert_eq!(snake.access_token.expose(), "a-3");
		assert!(snake.refresh_token.is_none());
	}

	#[test]
	fn rejected_refresh_responses_yield_nothing() {
		for (status, body) in [
			(401, r#"{"message":"jwt expired"}"#),
			(200, r#"{"success":false,"message":"jwt expired"}"#),
			(200, r#"{"success":true,"data":{}}"#),
			(200, r#"{"accessToken":""}"#),
		] {
			assert!(IssuedTokens::from_response(&response(status, body)).is_none(), "{body}");
		}
	}
}
