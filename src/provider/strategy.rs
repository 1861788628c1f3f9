//! Provider strategy hooks that customize token requests and response interpretation.
//!
//! Implementations decorate outgoing parameter maps and normalize provider payloads
//! without tying flows to any particular HTTP client.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	error::UpstreamError,
	flows::{TokenResponse, VerificationFailure, VerificationResult},
	provider::Operation,
};

/// Strategy hook that lets providers decorate requests and interpret responses.
///
/// Implementors must be `Send + Sync`, and the hooks only see crate-owned data so
/// downstream crates never depend on transport-specific structures. Every hook has a
/// default, so override only what a provider needs.
pub trait ProviderStrategy: Send + Sync {
	/// Adds or rewrites body/query parameters before a request is dispatched.
	fn augment_request(&self, _operation: Operation, _params: &mut BTreeMap<String, String>) {}

	/// Rejects 2xx token responses that still describe a failure.
	fn check_token_response(
		&self,
		_operation: Operation,
		_response: &TokenResponse,
	) -> Result<(), UpstreamError> {
		Ok(())
	}

	/// Normalizes a successful verification payload.
	fn interpret_verification(&self, body: &Map<String, Value>) -> VerificationResult {
		VerificationResult::from_introspection(body)
	}
}

/// Strategy for providers that follow RFC 6749 and answer verification with
/// introspection-style bodies (`expires_in`, `scope`, `active`).
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {}

/// Slack answers HTTP 200 for failures and flags them with `"ok": false`.
#[derive(Debug, Default)]
pub struct SlackProviderStrategy;
impl Display for SlackProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("slack-provider-strategy")
	}
}
impl ProviderStrategy for SlackProviderStrategy {
	fn check_token_response(
		&self,
		_operation: Operation,
		response: &TokenResponse,
	) -> Result<(), UpstreamError> {
		match slack_failure(response.as_map()) {
			Some(error) => Err(UpstreamError::Rejected {
				status: Some(200),
				oauth_error: Some(error),
				description: None,
				body_preview: None,
				retry_after: None,
			}),
			None => Ok(()),
		}
	}

	fn interpret_verification(&self, body: &Map<String, Value>) -> VerificationResult {
		match slack_failure(body) {
			Some(reason) => VerificationResult::invalid(VerificationFailure::Rejected {
				status: 200,
				reason: Some(reason),
			}),
			None => VerificationResult::from_introspection(body),
		}
	}
}

fn slack_failure(body: &Map<String, Value>) -> Option<String> {
	if body.get("ok").and_then(Value::as_bool) != Some(false) {
		return None;
	}

	Some(body.get("error").and_then(Value::as_str).unwrap_or("unknown_error").to_owned())
}
