// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, ProviderInfo, ScopeList, ScopeValidationError, Secret},
	provider::{
		ClientCredentials, ProviderConfig, ProviderEndpoints, ProviderQuirks, RequestFormat,
		VerifyTokenStyle,
	},
};

/// Errors raised while constructing or validating provider configs.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProviderConfigError {
	/// Provider name or version failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] IdentifierError),
	/// An endpoint could not be parsed as a URL.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidUrl {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Parser failure.
		#[source]
		source: url::ParseError,
	},
	/// Client identifier is missing or empty.
	#[error("Missing client id.")]
	MissingClientId,
	/// Client secret is missing or empty.
	#[error("Missing client secret.")]
	MissingClientSecret,
	/// Authorization endpoint is mandatory.
	#[error("Missing authorize URL.")]
	MissingAuthorizeUrl,
	/// Token endpoint is mandatory.
	#[error("Missing token URL.")]
	MissingTokenUrl,
	/// Registered redirect URI is mandatory.
	#[error("Missing callback URL.")]
	MissingCallbackUrl,
	/// Endpoints must use HTTPS outside of loopback hosts.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Configured scopes failed validation.
	#[error(transparent)]
	InvalidScope(#[from] ScopeValidationError),
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
	/// Query-style token verification needs a parameter name.
	#[error("Verify token query parameter name cannot be empty.")]
	EmptyVerifyTokenParam,
}

/// Builder for [`ProviderConfig`] values.
///
/// Also the shape of a provider entry in a configuration document; deserializing a
/// [`ProviderConfig`] goes through [`ProviderConfigBuilder::build`].
#[derive(Debug, Deserialize)]
pub struct ProviderConfigBuilder {
	/// Provider/version pair for the config being constructed.
	#[serde(flatten)]
	pub info: ProviderInfo,
	/// OAuth client identifier.
	#[serde(default)]
	pub client_id: Option<String>,
	/// OAuth client secret.
	#[serde(default)]
	pub client_secret: Option<Secret>,
	/// Requested scopes, validated on build.
	#[serde(default)]
	pub scope: Vec<String>,
	/// Authorization endpoint.
	#[serde(default)]
	pub authorize_url: Option<Url>,
	/// Token endpoint.
	#[serde(default)]
	pub token_url: Option<Url>,
	/// Redirect URI registered with the provider.
	#[serde(default)]
	pub callback_url: Option<Url>,
	/// Optional verification endpoint.
	#[serde(default)]
	pub verify_token_url: Option<Url>,
	/// Optional refresh endpoint.
	#[serde(default)]
	pub refresh_token_url: Option<Url>,
	/// Refresh buffer in seconds.
	#[serde(default)]
	pub token_refresh_buffer_seconds: u64,
	/// Fixed authorize URL parameters.
	#[serde(default)]
	pub callback_url_params: BTreeMap<String, String>,
	/// Provider-specific quirks.
	#[serde(default)]
	pub quirks: ProviderQuirks,
}
impl ProviderConfigBuilder {
	/// Creates a new builder seeded with the provided provider/version pair.
	pub fn new(info: ProviderInfo) -> Self {
		Self {
			info,
			client_id: None,
			client_secret: None,
			scope: Vec::new(),
			authorize_url: None,
			token_url: None,
			callback_url: None,
			verify_token_url: None,
			refresh_token_url: None,
			token_refresh_buffer_seconds: 0,
			callback_url_params: BTreeMap::new(),
			quirks: ProviderQuirks::default(),
		}
	}

	/// Sets both client credentials.
	pub fn credentials(mut self, credentials: ClientCredentials) -> Self {
		self.client_id = Some(credentials.client_id);
		self.client_secret = Some(credentials.client_secret);

		self
	}

	/// Replaces the requested scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scope = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the authorization endpoint.
	pub fn authorize_url(mut self, url: Url) -> Self {
		self.authorize_url = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_url(mut self, url: Url) -> Self {
		self.token_url = Some(url);

		self
	}

	/// Sets the registered redirect URI.
	pub fn callback_url(mut self, url: Url) -> Self {
		self.callback_url = Some(url);

		self
	}

	/// Sets the optional verification endpoint.
	pub fn verify_token_url(mut self, url: Url) -> Self {
		self.verify_token_url = Some(url);

		self
	}

	/// Sets the optional refresh endpoint.
	pub fn refresh_token_url(mut self, url: Url) -> Self {
		self.refresh_token_url = Some(url);

		self
	}

	/// Sets the refresh buffer; negative durations clamp to zero.
	pub fn token_refresh_buffer(mut self, buffer: Duration) -> Self {
		self.token_refresh_buffer_seconds = u64::try_from(buffer.whole_seconds()).unwrap_or(0);

		self
	}

	/// Adds a fixed authorize URL parameter.
	pub fn callback_url_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.callback_url_params.insert(key.into(), value.into());

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Overrides the scope delimiter.
	pub fn scope_delimiter(mut self, delimiter: char) -> Self {
		self.quirks.scope_delimiter = delimiter;

		self
	}

	/// Overrides the token request body encoding.
	pub fn token_request_format(mut self, format: RequestFormat) -> Self {
		self.quirks.token_request_format = format;

		self
	}

	/// Overrides how tokens are presented to the verification endpoint.
	pub fn verify_token_style(mut self, style: VerifyTokenStyle) -> Self {
		self.quirks.verify_token = style;

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<ProviderConfig, ProviderConfigError> {
		let client_id = self
			.client_id
			.filter(|id| !id.trim().is_empty())
			.ok_or(ProviderConfigError::MissingClientId)?;
		let client_secret = self
			.client_secret
			.filter(|secret| !secret.is_empty())
			.ok_or(ProviderConfigError::MissingClientSecret)?;
		let authorize = self.authorize_url.ok_or(ProviderConfigError::MissingAuthorizeUrl)?;
		let token = self.token_url.ok_or(ProviderConfigError::MissingTokenUrl)?;
		let callback = self.callback_url.ok_or(ProviderConfigError::MissingCallbackUrl)?;
		let config = ProviderConfig {
			info: self.info,
			credentials: ClientCredentials { client_id, client_secret },
			scope: ScopeList::new(self.scope)?,
			endpoints: ProviderEndpoints {
				authorize,
				token,
				callback,
				verify_token: self.verify_token_url,
				refresh_token: self.refresh_token_url,
			},
			token_refresh_buffer_seconds: self.token_refresh_buffer_seconds,
			callback_url_params: self.callback_url_params,
			quirks: self.quirks,
		};

		config.validate()?;

		Ok(config)
	}
}
impl TryFrom<ProviderConfigBuilder> for ProviderConfig {
	type Error = ProviderConfigError;

	fn try_from(builder: ProviderConfigBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}

impl ProviderConfig {
	/// Validates invariants for the config.
	fn validate(&self) -> Result<(), ProviderConfigError> {
		validate_endpoint("authorize", &self.endpoints.authorize)?;
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("callback", &self.endpoints.callback)?;

		if let Some(verify) = self.endpoints.verify_token.as_ref() {
			validate_endpoint("verify_token", verify)?;
		}
		if let Some(refresh) = self.endpoints.refresh_token.as_ref() {
			validate_endpoint("refresh_token", refresh)?;
		}

		validate_scope_delimiter(self.quirks.scope_delimiter)?;

		if matches!(&self.quirks.verify_token, VerifyTokenStyle::Query { param } if param.is_empty()) {
			return Err(ProviderConfigError::EmptyVerifyTokenParam);
		}

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderConfigError> {
	if url.scheme() == "https" || (url.scheme() == "http" && is_loopback(url)) {
		Ok(())
	} else {
		Err(ProviderConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}

fn validate_scope_delimiter(delimiter: char) -> Result<(), ProviderConfigError> {
	if delimiter.is_control() {
		Err(ProviderConfigError::InvalidScopeDelimiter { delimiter })
	} else {
		Ok(())
	}
}
