//! Object-safe provider contract consumed by the HTTP surface and the registry.

// self
use crate::{
	_prelude::*,
	auth::ProviderInfo,
	flows::{
		AuthenticateRequest, CallbackOutcome, CallbackQuery, ProviderAdapter, TokenResponse,
		VerificationResult,
	},
	http::{TokenHttpClient, TransportErrorMapper},
};

/// Boxed future returned by [`OAuth2Provider`] operations.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Uniform contract every provider integration exposes.
///
/// Implementations hold no per-request state; every method may be called concurrently.
pub trait OAuth2Provider
where
	Self: Send + Sync,
{
	/// Provider and version this integration serves.
	fn info(&self) -> &ProviderInfo;

	/// Returns the authorize URL the user should be redirected to.
	fn authenticate(&self, request: AuthenticateRequest) -> Result<Url>;

	/// Validates a callback and exchanges its authorization code.
	fn handle_callback(&self, query: CallbackQuery) -> ProviderFuture<'_, CallbackOutcome>;

	/// Trades a refresh token for a fresh token response.
	fn refresh_token<'a>(&'a self, refresh_token: &'a str) -> ProviderFuture<'a, TokenResponse>;

	/// Reports whether an access token is still valid.
	fn verify_token<'a>(&'a self, access_token: &'a str)
	-> ProviderFuture<'a, VerificationResult>;
}
impl<C, M> OAuth2Provider for ProviderAdapter<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn info(&self) -> &ProviderInfo {
		&self.config.info
	}

	fn authenticate(&self, request: AuthenticateRequest) -> Result<Url> {
		ProviderAdapter::authenticate(self, request)
	}

	fn handle_callback(&self, query: CallbackQuery) -> ProviderFuture<'_, CallbackOutcome> {
		Box::pin(ProviderAdapter::handle_callback(self, query))
	}

	fn refresh_token<'a>(&'a self, refresh_token: &'a str) -> ProviderFuture<'a, TokenResponse> {
		Box::pin(ProviderAdapter::refresh_token(self, refresh_token))
	}

	fn verify_token<'a>(
		&'a self,
		access_token: &'a str,
	) -> ProviderFuture<'a, VerificationResult> {
		Box::pin(ProviderAdapter::verify_token(self, access_token))
	}
}
