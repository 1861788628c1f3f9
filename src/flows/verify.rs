//! Access-token verification.
//!
//! Verification never fails because of the token or the provider: rejected tokens,
//! unreachable endpoints, and unreadable payloads all come back as a
//! [`VerificationResult`] with `is_valid == false` and a diagnostic [`VerificationFailure`].
//! Only a provider without a verification endpoint is reported as an error.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	endpoint::{self, OAuth2UrlParams},
	error::UpstreamError,
	flows::{TokenClient, common, token},
	http::{TokenHttpClient, TransportErrorMapper},
	obs::{self, FlowOutcome, FlowSpan},
	provider::{Operation, ProviderConfig, ProviderStrategy, VerifyTokenStyle},
};

/// Normalized outcome of a verification call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
	/// True when the provider vouched for the token.
	pub is_valid: bool,
	/// Remaining lifetime in seconds, when reported.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<i64>,
	/// Granted scopes; empty when the provider did not report any.
	#[serde(default)]
	pub scopes: Vec<String>,
	/// Why the token was reported invalid.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub failure: Option<VerificationFailure>,
}
impl VerificationResult {
	/// Invalid result carrying `failure`.
	pub fn invalid(failure: VerificationFailure) -> Self {
		Self { is_valid: false, expires_in: None, scopes: Vec::new(), failure: Some(failure) }
	}

	/// Interprets an introspection-style body.
	///
	/// `"active": false` marks the token invalid. `expires_in` may be a number or a numeric
	/// string. `scope` may be a whitespace-delimited string or an array of strings.
	pub fn from_introspection(body: &Map<String, Value>) -> Self {
		if body.get("active").and_then(Value::as_bool) == Some(false) {
			return Self::invalid(VerificationFailure::Inactive);
		}

		let scopes = match body.get("scope") {
			Some(Value::String(raw)) => raw.split_whitespace().map(str::to_owned).collect(),
			Some(Value::Array(items)) =>
				items.iter().filter_map(Value::as_str).map(str::to_owned).collect(),
			_ => Vec::new(),
		};

		Self {
			is_valid: true,
			expires_in: body.get("expires_in").and_then(token::json_seconds),
			scopes,
			failure: None,
		}
	}
}

/// Diagnostic attached to an invalid [`VerificationResult`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationFailure {
	/// Provider answered and refused the token.
	Rejected {
		/// HTTP status of the answer.
		status: u16,
		/// OAuth error or provider-specific reason, when supplied.
		reason: Option<String>,
	},
	/// Provider could not be reached (network failure or timeout).
	Unreachable {
		/// Transport failure description.
		message: String,
	},
	/// Provider answered 2xx with a body that is not a JSON object.
	Unreadable {
		/// Parsing failure description.
		message: String,
	},
	/// Provider reported the token as no longer active.
	Inactive,
}
impl From<UpstreamError> for VerificationFailure {
	fn from(err: UpstreamError) -> Self {
		match err {
			UpstreamError::Rejected { status, oauth_error, description, .. } => Self::Rejected {
				status: status.unwrap_or_default(),
				reason: oauth_error.or(description),
			},
			UpstreamError::MalformedBody { source, .. } =>
				Self::Unreadable { message: source.to_string() },
			other => Self::Unreachable { message: other.to_string() },
		}
	}
}

impl<C, M> TokenClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Asks the provider whether `access_token` is still valid.
	///
	/// The token travels as a query parameter or a bearer header depending on the config's
	/// [`VerifyTokenStyle`]. Errors only when the provider has no verification endpoint.
	pub async fn verify_token(
		&self,
		config: &ProviderConfig,
		strategy: &dyn ProviderStrategy,
		access_token: &str,
	) -> Result<VerificationResult> {
		const OPERATION: Operation = Operation::VerifyToken;

		let span = FlowSpan::new(OPERATION, "verify_token");

		obs::record_flow_outcome(OPERATION, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut params = OAuth2UrlParams::new();
				let bearer = match &config.quirks.verify_token {
					VerifyTokenStyle::Query { param } => {
						params.insert(param.clone(), access_token.to_owned());

						None
					},
					VerifyTokenStyle::Bearer => Some(access_token),
				};

				strategy.augment_request(OPERATION, &mut params);

				let url = endpoint::build_url(config, &params, OPERATION)?;
				let verification = match self.verify_at(&url, bearer, strategy).await {
					Ok(verification) => verification,
					Err(err) => VerificationResult::invalid(err.into()),
				};

				if let Some(failure) = &verification.failure {
					log_degraded(config, failure);
				}

				Ok(verification)
			})
			.await;
		let outcome = match &result {
			Ok(verification) if verification.is_valid => FlowOutcome::Success,
			_ => FlowOutcome::Failure,
		};

		obs::record_flow_outcome(OPERATION, outcome);

		result
	}

	async fn verify_at(
		&self,
		url: &Url,
		bearer: Option<&str>,
		strategy: &dyn ProviderStrategy,
	) -> Result<VerificationResult, UpstreamError> {
		let request = common::get_request(url, bearer)?;
		let (response, meta) = self.send(Operation::VerifyToken, request).await?;

		if !response.status().is_success() {
			return Err(common::rejection(&response, meta.as_ref()));
		}

		let body = common::read_object(&response)?;

		Ok(strategy.interpret_verification(&body))
	}
}

fn log_degraded(config: &ProviderConfig, failure: &VerificationFailure) {
	#[cfg(feature = "tracing")]
	tracing::warn!(provider = %config.info, ?failure, "Token verification degraded to invalid.");
	#[cfg(not(feature = "tracing"))]
	let _ = (config, failure);
}
