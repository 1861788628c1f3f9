//! Crate-level error types shared across the codec, URL builder, flows, and adapters.

// self
use crate::{_prelude::*, auth::ProviderInfo, provider::ProviderConfigError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Every hard failure propagates to the immediate caller untouched; nothing in this crate
/// retries. Verification failures never show up here, they are reported through
/// [`VerificationResult`](crate::flows::VerificationResult).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem (missing endpoint, invalid provider config).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The state token could not be produced or trusted.
	#[error(transparent)]
	StateCodec(#[from] crate::state::StateCodecError),
	/// Callback arrived without an authorization code.
	#[error("Callback request is missing the authorization code.")]
	MissingCode,
	/// Provider redirected back with an OAuth `error` instead of a code.
	#[error("Provider denied the authorization request: {error}.")]
	AuthorizationDenied {
		/// Provider-supplied OAuth `error` value.
		error: String,
		/// Provider-supplied `error_description`, when present.
		description: Option<String>,
	},
	/// Code-for-token exchange failed upstream. Codes are single-use; do not replay.
	#[error("Authorization code exchange failed.")]
	TokenExchange(#[source] UpstreamError),
	/// Refresh call failed upstream.
	#[error("Token refresh failed.")]
	TokenRefresh(#[source] UpstreamError),
	/// No adapter is registered for the provider named in a decoded state.
	#[error("No adapter is registered for provider {provider}.")]
	UnknownProvider {
		/// Provider and version carried by the state.
		provider: ProviderInfo,
	},
}
impl Error {
	/// Returns the coarse error category used for HTTP status mapping and retry decisions.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Config(_) => ErrorKind::Configuration,
			Self::StateCodec(_) => ErrorKind::StateCodec,
			Self::MissingCode => ErrorKind::MissingCode,
			Self::AuthorizationDenied { .. } => ErrorKind::AuthorizationDenied,
			Self::TokenExchange(_) => ErrorKind::TokenExchange,
			Self::TokenRefresh(_) => ErrorKind::TokenRefresh,
			Self::UnknownProvider { .. } => ErrorKind::UnknownProvider,
		}
	}

	/// True when the failure was caused by the inbound request rather than the server.
	pub fn is_client_fault(&self) -> bool {
		matches!(
			self.kind(),
			ErrorKind::StateCodec
				| ErrorKind::MissingCode
				| ErrorKind::AuthorizationDenied
				| ErrorKind::UnknownProvider
		)
	}

	/// Upstream failure details for exchange/refresh errors.
	pub fn upstream(&self) -> Option<&UpstreamError> {
		match self {
			Self::TokenExchange(e) | Self::TokenRefresh(e) => Some(e),
			_ => None,
		}
	}
}

/// Coarse categories for [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Required provider endpoint or setting is missing or invalid.
	Configuration,
	/// State token serialization, encryption, decryption, or parsing failed.
	StateCodec,
	/// Callback arrived without a code.
	MissingCode,
	/// Provider returned an OAuth error to the callback.
	AuthorizationDenied,
	/// Code exchange failed upstream.
	TokenExchange,
	/// Refresh failed upstream.
	TokenRefresh,
	/// State referenced an unregistered provider.
	UnknownProvider,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Provider does not declare the endpoint required by the requested operation.
	#[error("Provider {provider} has no `{field}` configured.")]
	MissingEndpoint {
		/// Provider identifier (`provider/version`).
		provider: String,
		/// Name of the missing configuration field.
		field: &'static str,
	},
	/// Provider configuration failed validation.
	#[error(transparent)]
	InvalidProvider(#[from] ProviderConfigError),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failure of a single upstream HTTP round trip (exchange, refresh, or verification).
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Provider answered with a non-success status, or a success status carrying an error body.
	#[error("Provider rejected the request{}.", fmt_rejection(*status, oauth_error.as_deref(), description.as_deref()))]
	Rejected {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// OAuth `error` field returned by the provider.
		oauth_error: Option<String>,
		/// OAuth `error_description` field returned by the provider.
		description: Option<String>,
		/// Truncated response body for non-JSON payloads.
		body_preview: Option<String>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// The bounded request timeout elapsed.
	#[error("Request timed out while calling the provider.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// DNS, TCP, or TLS failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
	/// Outbound request could not be assembled.
	#[error("HTTP request could not be constructed.")]
	InvalidRequest {
		/// Underlying builder failure.
		#[source]
		source: BoxError,
	},
	/// Provider answered 2xx with a body that is not a JSON object.
	#[error("Provider returned a malformed JSON body.")]
	MalformedBody {
		/// HTTP status code of the response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Any other transport failure.
	#[error("HTTP client error occurred while calling the provider: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl UpstreamError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}

	/// Wraps a request construction failure.
	pub fn invalid_request(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::InvalidRequest { source: Box::new(src) }
	}

	/// HTTP status returned upstream, when one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. } => *status,
			Self::MalformedBody { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Retry-After hint, when the provider sent one.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::Rejected { retry_after, .. } => *retry_after,
			_ => None,
		}
	}

	/// True when the bounded timeout elapsed.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}

fn fmt_rejection(status: Option<u16>, error: Option<&str>, description: Option<&str>) -> String {
	let mut buf = String::new();

	if let Some(status) = status {
		buf.push_str(&format!(" with HTTP {status}"));
	}

	match (error, description) {
		(Some(error), Some(description)) => buf.push_str(&format!(": {error} ({description})")),
		(Some(error), None) => buf.push_str(&format!(": {error}")),
		(None, Some(description)) => buf.push_str(&format!(": {description}")),
		(None, None) => {},
	}

	buf
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rejection_message_includes_status_and_oauth_error() {
		let err = UpstreamError::Rejected {
			status: Some(400),
			oauth_error: Some("invalid_grant".into()),
			description: Some("code already used".into()),
			body_preview: None,
			retry_after: None,
		};

		assert_eq!(
			err.to_string(),
			"Provider rejected the request with HTTP 400: invalid_grant (code already used)."
		);
		assert_eq!(err.status(), Some(400));
		assert!(!err.is_timeout());
	}

	#[test]
	fn kinds_separate_client_faults_from_upstream_failures() {
		assert!(Error::MissingCode.is_client_fault());
		assert_eq!(Error::MissingCode.kind(), ErrorKind::MissingCode);

		let err = Error::TokenRefresh(UpstreamError::Other { message: "boom".into() });

		assert!(!err.is_client_fault());
		assert_eq!(err.kind(), ErrorKind::TokenRefresh);
		assert!(err.upstream().is_some());

		let err = Error::from(ConfigError::MissingEndpoint {
			provider: "google/v2".into(),
			field: "refresh_token_url",
		});

		assert_eq!(err.kind(), ErrorKind::Configuration);
		assert_eq!(err.to_string(), "Provider google/v2 has no `refresh_token_url` configured.");
	}
}
