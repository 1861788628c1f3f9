//! Refresh-token grant.
//!
//! [`TokenClient::refresh_token`] builds the refresh URL (which carries the refresh token as a
//! query parameter) and POSTs `grant_type=refresh_token` with the client credentials. A
//! provider without a refresh endpoint fails before any network traffic. Failures are never
//! retried here since many providers rotate refresh tokens on use.

// self
use crate::{
	_prelude::*,
	endpoint::{self, OAuth2UrlParams},
	flows::{TokenClient, TokenResponse, common},
	http::{TokenHttpClient, TransportErrorMapper},
	obs::{self, FlowOutcome, FlowSpan},
	provider::{Operation, ProviderConfig, ProviderStrategy},
};

impl<C, M> TokenClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Trades `refresh_token` for a fresh token response.
	pub async fn refresh_token(
		&self,
		config: &ProviderConfig,
		strategy: &dyn ProviderStrategy,
		refresh_token: &str,
	) -> Result<TokenResponse> {
		const OPERATION: Operation = Operation::RefreshToken;

		let span = FlowSpan::new(OPERATION, "refresh_token");

		obs::record_flow_outcome(OPERATION, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let url = endpoint::build_url(
					config,
					&OAuth2UrlParams::from([("refresh_token".to_owned(), refresh_token.to_owned())]),
					OPERATION,
				)?;
				let mut body = BTreeMap::from([
					("client_id".to_owned(), config.credentials.client_id.clone()),
					("client_secret".to_owned(), config.credentials.client_secret.expose().to_owned()),
					("refresh_token".to_owned(), refresh_token.to_owned()),
				]);

				if let Some(grant_type) = OPERATION.grant_type() {
					body.insert("grant_type".to_owned(), grant_type.to_owned());
				}

				strategy.augment_request(OPERATION, &mut body);

				let request = common::token_request(&url, config.quirks.token_request_format, &body)
					.map_err(Error::TokenRefresh)?;
				let (response, meta) =
					self.send(OPERATION, request).await.map_err(Error::TokenRefresh)?;

				common::read_token_response(OPERATION, strategy, &response, meta.as_ref())
					.map_err(Error::TokenRefresh)
			})
			.await;

		obs::record_flow_outcome(OPERATION, FlowOutcome::of(&result));

		result
	}
}
