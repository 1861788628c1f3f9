//! Provider configuration values shared read-only by every request for that provider.
//!
//! A [`ProviderConfig`] is built once at startup (through [`ProviderConfigBuilder`] or by
//! deserializing a config document, which runs the same validation) and then handed to
//! adapters behind an `Arc`. Nothing mutates it afterwards.

/// Builder API for assembling provider configs.
pub mod builder;
/// Operations a config can serve.
pub mod operation;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use operation::*;
pub use quirks::*;

// self
use crate::{
	_prelude::*,
	auth::{ProviderInfo, ScopeList, Secret},
	error::ConfigError,
};

/// OAuth client credentials issued by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret; redacted in debug output.
	pub client_secret: Secret,
}
impl ClientCredentials {
	/// Pairs a client identifier with its secret.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<Secret>) -> Self {
		Self { client_id: client_id.into(), client_secret: client_secret.into() }
	}
}

/// Endpoint set declared by a provider config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the user is redirected to.
	pub authorize: Url,
	/// Token endpoint used for code exchanges.
	pub token: Url,
	/// Redirect URI registered with the provider.
	pub callback: Url,
	/// Token verification endpoint, for providers that offer one.
	pub verify_token: Option<Url>,
	/// Refresh endpoint, for providers that support refresh tokens.
	pub refresh_token: Option<Url>,
}

/// Immutable provider configuration consumed by the URL builder, token client, and adapters.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ProviderConfigBuilder")]
pub struct ProviderConfig {
	/// Provider name and integration version.
	pub info: ProviderInfo,
	/// Client credentials.
	pub credentials: ClientCredentials,
	/// Scopes requested on the authorize URL, in order.
	pub scope: ScopeList,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// How long before expiry a token should be refreshed.
	pub token_refresh_buffer_seconds: u64,
	/// Fixed query parameters appended to every authorize URL.
	pub callback_url_params: BTreeMap<String, String>,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderConfig {
	/// Creates a new builder for the provided provider/version pair.
	pub fn builder(info: ProviderInfo) -> ProviderConfigBuilder {
		ProviderConfigBuilder::new(info)
	}

	/// Base URL for `operation`, or [`ConfigError::MissingEndpoint`] when the provider does not
	/// support it.
	pub fn endpoint(&self, operation: Operation) -> Result<&Url, ConfigError> {
		let url = match operation {
			Operation::Authorize => Some(&self.endpoints.authorize),
			Operation::ExchangeCode => Some(&self.endpoints.token),
			Operation::VerifyToken => self.endpoints.verify_token.as_ref(),
			Operation::RefreshToken => self.endpoints.refresh_token.as_ref(),
		};

		url.ok_or_else(|| ConfigError::MissingEndpoint {
			provider: self.info.to_string(),
			field: operation.endpoint_field(),
		})
	}

	/// Returns true when the provider can serve `operation`.
	pub fn supports(&self, operation: Operation) -> bool {
		self.endpoint(operation).is_ok()
	}

	/// Refresh buffer as a duration.
	pub fn token_refresh_buffer(&self) -> Duration {
		Duration::seconds(i64::try_from(self.token_refresh_buffer_seconds).unwrap_or(i64::MAX))
	}

	/// True once a token expiring at `expires_at` has entered the refresh buffer.
	pub fn refresh_due(&self, expires_at: OffsetDateTime, now: OffsetDateTime) -> bool {
		if now >= expires_at {
			return true;
		}

		expires_at - now <= self.token_refresh_buffer()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn provider_config(refresh: bool) -> ProviderConfig {
		let mut builder = ProviderConfig::builder(
			ProviderInfo::new("test", "v1").expect("Provider info fixture should be valid."),
		)
		.credentials(ClientCredentials::new("client", "secret"))
		.authorize_url(Url::parse("https://example.com/authorize").expect("URL should parse."))
		.token_url(Url::parse("https://example.com/token").expect("URL should parse."))
		.callback_url(Url::parse("https://app.example.com/cb").expect("URL should parse."))
		.token_refresh_buffer(Duration::minutes(5));

		if refresh {
			builder = builder
				.refresh_token_url(Url::parse("https://example.com/token").expect("URL should parse."));
		}

		builder.build().expect("Provider config fixture should build.")
	}

	#[test]
	fn endpoint_lookup_reports_missing_field() {
		let config = provider_config(false);

		assert!(config.supports(Operation::Authorize));
		assert!(config.supports(Operation::ExchangeCode));
		assert!(!config.supports(Operation::VerifyToken));

		let err = config.endpoint(Operation::RefreshToken).expect_err("Refresh URL is absent.");

		assert!(matches!(
			err,
			ConfigError::MissingEndpoint { field: "refresh_token_url", ref provider } if provider == "test/v1"
		));
		assert!(provider_config(true).supports(Operation::RefreshToken));
	}

	#[test]
	fn refresh_due_honors_buffer() {
		let config = provider_config(true);
		let now = OffsetDateTime::now_utc();

		assert!(config.refresh_due(now - Duration::seconds(1), now));
		assert!(config.refresh_due(now + Duration::minutes(4), now));
		assert!(config.refresh_due(now + Duration::minutes(5), now));
		assert!(!config.refresh_due(now + Duration::minutes(6), now));
	}

	#[test]
	fn credentials_debug_redacts_secret() {
		let config = provider_config(false);
		let rendered = format!("{:?}", config.credentials);

		assert!(rendered.contains("client"));
		assert!(!rendered.contains("\"secret\""));
	}
}
