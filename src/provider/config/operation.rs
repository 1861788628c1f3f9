// self
use crate::_prelude::*;

/// Protocol operations the engine performs against a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
	/// Building the user-facing authorize URL.
	Authorize,
	/// Trading an authorization code for tokens.
	ExchangeCode,
	/// Introspecting an access token.
	VerifyToken,
	/// Trading a refresh token for a new access token.
	RefreshToken,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Authorize => "authorize",
			Operation::ExchangeCode => "exchange_code",
			Operation::VerifyToken => "verify_token",
			Operation::RefreshToken => "refresh_token",
		}
	}

	/// Name of the configuration field holding this operation's base URL.
	pub const fn endpoint_field(self) -> &'static str {
		match self {
			Operation::Authorize => "authorize_url",
			Operation::ExchangeCode => "token_url",
			Operation::VerifyToken => "verify_token_url",
			Operation::RefreshToken => "refresh_token_url",
		}
	}

	/// RFC 6749 `grant_type` sent with token endpoint calls, if any.
	pub const fn grant_type(self) -> Option<&'static str> {
		match self {
			Operation::ExchangeCode => Some("authorization_code"),
			Operation::RefreshToken => Some("refresh_token"),
			Operation::Authorize | Operation::VerifyToken => None,
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
