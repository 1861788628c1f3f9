//! Provider operations: authorize, callback + code exchange, verification, and refresh.

pub mod auth_code;
pub mod common;
pub mod refresh;
pub mod token;
pub mod verify;

pub use auth_code::*;
pub use common::TokenClient;
pub use token::*;
pub use verify::*;

// self
use crate::{
	_prelude::*,
	http::{TokenHttpClient, TransportErrorMapper},
	provider::{ProviderConfig, ProviderStrategy},
	state::StateCodec,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

/// Adapter specialized for the crate's default reqwest transport stack.
#[cfg(feature = "reqwest")]
pub type ReqwestProviderAdapter = ProviderAdapter<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Composes one provider's config and strategy with the shared state codec and token client.
///
/// Every protocol step lives in shared code; an adapter only decides which
/// [`ProviderConfig`] and [`ProviderStrategy`] to feed it. Adapters are cheap to clone and
/// safe to share across tasks.
pub struct ProviderAdapter<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Immutable provider configuration.
	pub config: Arc<ProviderConfig>,
	/// Strategy responsible for provider-specific request and response adjustments.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// Codec sealing and opening state tokens.
	pub codec: Arc<StateCodec>,
	/// Transport used for exchange, verification, and refresh calls.
	pub token_client: TokenClient<C, M>,
}
impl<C, M> ProviderAdapter<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an adapter that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: impl Into<Arc<ProviderConfig>>,
		strategy: Arc<dyn ProviderStrategy>,
		codec: Arc<StateCodec>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			config: config.into(),
			strategy,
			codec,
			token_client: TokenClient::new(http_client, mapper),
		}
	}

	/// Trades a refresh token for a fresh token response.
	pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse> {
		self.token_client.refresh_token(&self.config, self.strategy.as_ref(), refresh_token).await
	}

	/// Asks the provider whether an access token is still valid.
	pub async fn verify_token(&self, access_token: &str) -> Result<VerificationResult> {
		self.token_client.verify_token(&self.config, self.strategy.as_ref(), access_token).await
	}
}
#[cfg(feature = "reqwest")]
impl ProviderAdapter<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates an adapter backed by a default reqwest transport with the standard timeout.
	pub fn new(
		config: impl Into<Arc<ProviderConfig>>,
		strategy: Arc<dyn ProviderStrategy>,
		codec: Arc<StateCodec>,
	) -> Self {
		Self::with_http_client(
			config,
			strategy,
			codec,
			ReqwestHttpClient::default(),
			ReqwestTransportErrorMapper,
		)
	}
}
impl<C, M> Clone for ProviderAdapter<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			config: Arc::clone(&self.config),
			strategy: Arc::clone(&self.strategy),
			codec: Arc::clone(&self.codec),
			token_client: self.token_client.clone(),
		}
	}
}
impl<C, M> Debug for ProviderAdapter<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderAdapter")
			.field("provider", &self.config.info)
			.field("codec", &self.codec)
			.finish()
	}
}
