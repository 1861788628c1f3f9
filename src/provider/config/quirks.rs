// self
use crate::_prelude::*;

/// Body encoding used for token and refresh requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestFormat {
	#[default]
	/// `application/x-www-form-urlencoded` (RFC 6749).
	Form,
	/// `application/json`.
	Json,
}
impl RequestFormat {
	/// MIME type sent in the `content-type` header.
	pub const fn content_type(self) -> &'static str {
		match self {
			RequestFormat::Form => "application/x-www-form-urlencoded",
			RequestFormat::Json => "application/json",
		}
	}
}

/// Where the access token goes when calling the verification endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum VerifyTokenStyle {
	/// Query parameter on the verify URL (`?access_token=...` by default).
	Query {
		/// Query parameter name.
		param: String,
	},
	/// `Authorization: Bearer` header; the verify URL carries no token.
	Bearer,
}
impl Default for VerifyTokenStyle {
	fn default() -> Self {
		Self::Query { param: "access_token".into() }
	}
}

/// Provider-specific quirks that influence how requests are shaped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
	/// Body encoding for token and refresh requests.
	pub token_request_format: RequestFormat,
	/// How the access token is presented to the verification endpoint.
	pub verify_token: VerifyTokenStyle,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self {
			scope_delimiter: ' ',
			token_request_format: RequestFormat::default(),
			verify_token: VerifyTokenStyle::default(),
		}
	}
}
