//! Authorization Code helpers: authorize URLs, callback handling, and code exchange.
//!
//! [`ProviderAdapter::authenticate`] seals a fresh [`OAuth2State`] and embeds it in the
//! authorize URL. [`ProviderAdapter::handle_callback`] validates the redirect (provider error,
//! code, state, provider match) before spending the single-use code in
//! [`TokenClient::exchange_code`].

// crates.io
use serde_json::Value;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::UserId,
	endpoint::{self, OAuth2UrlParams},
	flows::{ProviderAdapter, TokenClient, TokenResponse, common},
	http::{TokenHttpClient, TransportErrorMapper},
	obs::{self, FlowOutcome, FlowSpan},
	provider::{Operation, ProviderConfig, ProviderStrategy},
	state::{OAuth2State, StateCodecError},
};

/// Input for [`ProviderAdapter::authenticate`].
#[derive(Clone, Debug)]
pub struct AuthenticateRequest {
	/// User starting the login.
	pub user_id: UserId,
	/// Values carried inside the sealed state and returned with the callback.
	pub extra: BTreeMap<String, Value>,
	/// Extra authorize URL parameters; these override config defaults.
	pub params: OAuth2UrlParams,
}
impl AuthenticateRequest {
	/// Creates a request for `user_id` with no extras.
	pub fn new(user_id: UserId) -> Self {
		Self { user_id, extra: BTreeMap::new(), params: OAuth2UrlParams::new() }
	}

	/// Adds a value to the sealed state.
	pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.extra.insert(key.into(), value.into());

		self
	}

	/// Adds an authorize URL parameter.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(key.into(), value.into());

		self
	}
}

/// Query parameters of `GET /oauth/callback`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackQuery {
	/// Authorization code.
	pub code: Option<String>,
	/// Sealed state issued by [`ProviderAdapter::authenticate`].
	pub state: Option<String>,
	/// OAuth error returned instead of a code.
	pub error: Option<String>,
	/// Human-readable companion of `error`.
	pub error_description: Option<String>,
	/// Any other parameters the provider appended.
	#[serde(flatten)]
	pub extra: BTreeMap<String, String>,
}
impl CallbackQuery {
	/// Parses a raw query string (without the leading `?`). Repeated keys keep their first value.
	pub fn from_query_str(query: &str) -> Self {
		let mut parsed = Self::default();

		for (key, value) in form_urlencoded::parse(query.as_bytes()) {
			let slot = match key.as_ref() {
				"code" => Some(&mut parsed.code),
				"state" => Some(&mut parsed.state),
				"error" => Some(&mut parsed.error),
				"error_description" => Some(&mut parsed.error_description),
				_ => None,
			};

			match slot {
				Some(slot) =>
					if slot.is_none() {
						*slot = Some(value.into_owned());
					},
				None => {
					parsed.extra.entry(key.into_owned()).or_insert_with(|| value.into_owned());
				},
			}
		}

		parsed
	}
}

/// Result of a successful callback.
#[derive(Clone, Debug)]
pub struct CallbackOutcome {
	/// State recovered from the callback.
	pub state: OAuth2State,
	/// Raw provider token response.
	pub tokens: TokenResponse,
}

impl<C, M> ProviderAdapter<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Seals a fresh state and returns the provider's authorize URL.
	///
	/// Adds `response_type=code` unless the caller supplied one, and always sets `state`.
	pub fn authenticate(&self, request: AuthenticateRequest) -> Result<Url> {
		const OPERATION: Operation = Operation::Authorize;

		let _guard = FlowSpan::new(OPERATION, "authenticate").entered();

		obs::record_flow_outcome(OPERATION, FlowOutcome::Attempt);

		let result = self.authorize_url(request);

		obs::record_flow_outcome(OPERATION, FlowOutcome::of(&result));

		result
	}

	fn authorize_url(&self, request: AuthenticateRequest) -> Result<Url> {
		let mut state = OAuth2State::new(request.user_id, self.config.info.clone());

		state.extra = request.extra;

		let token = self.codec.encode(&state)?;
		let mut params = request.params;

		params.entry("response_type".to_owned()).or_insert_with(|| "code".to_owned());
		params.insert("state".to_owned(), token);

		endpoint::build_url(&self.config, &params, Operation::Authorize)
	}

	/// Validates the callback and exchanges its code for tokens.
	///
	/// Checks run in order and stop at the first failure: provider `error`, missing `code`,
	/// missing or unreadable `state`, state issued for another provider. No request is sent
	/// unless all of them pass.
	pub async fn handle_callback(&self, query: CallbackQuery) -> Result<CallbackOutcome> {
		if let Some(error) = query.error {
			return Err(Error::AuthorizationDenied { error, description: query.error_description });
		}

		let code = query.code.filter(|code| !code.is_empty()).ok_or(Error::MissingCode)?;
		let state = self.decode_state(query.state.as_deref())?;
		let tokens = self.token_client.exchange_code(&self.config, self.strategy.as_ref(), &code).await?;

		Ok(CallbackOutcome { state, tokens })
	}

	/// Opens a callback `state` and checks that it was issued for this provider.
	pub fn decode_state(&self, state: Option<&str>) -> Result<OAuth2State, StateCodecError> {
		let token = state.filter(|token| !token.is_empty()).ok_or(StateCodecError::Missing)?;
		let state = self.codec.decode(token)?;

		if state.provider_info != self.config.info {
			return Err(StateCodecError::ProviderMismatch {
				expected: self.config.info.clone(),
				found: state.provider_info,
			});
		}

		Ok(state)
	}
}

impl<C, M> TokenClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Trades an authorization code for tokens at the provider's token endpoint.
	///
	/// Codes are single-use, so failures are returned as-is and never retried.
	pub async fn exchange_code(
		&self,
		config: &ProviderConfig,
		strategy: &dyn ProviderStrategy,
		code: &str,
	) -> Result<TokenResponse> {
		const OPERATION: Operation = Operation::ExchangeCode;

		let span = FlowSpan::new(OPERATION, "exchange_code");

		obs::record_flow_outcome(OPERATION, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let url = endpoint::build_url(config, &OAuth2UrlParams::new(), OPERATION)?;
				let mut body = BTreeMap::from([
					("client_id".to_owned(), config.credentials.client_id.clone()),
					("client_secret".to_owned(), config.credentials.client_secret.expose().to_owned()),
					("redirect_uri".to_owned(), config.endpoints.callback.to_string()),
					("code".to_owned(), code.to_owned()),
				]);

				if let Some(grant_type) = OPERATION.grant_type() {
					body.insert("grant_type".to_owned(), grant_type.to_owned());
				}

				strategy.augment_request(OPERATION, &mut body);

				let request = common::token_request(&url, config.quirks.token_request_format, &body)
					.map_err(Error::TokenExchange)?;
				let (response, meta) =
					self.send(OPERATION, request).await.map_err(Error::TokenExchange)?;

				common::read_token_response(OPERATION, strategy, &response, meta.as_ref())
					.map_err(Error::TokenExchange)
			})
			.await;

		obs::record_flow_outcome(OPERATION, FlowOutcome::of(&result));

		result
	}
}
