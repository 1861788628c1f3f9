//! Provider token payloads.

// crates.io
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// Raw JSON object returned by a token or refresh endpoint.
///
/// Shapes differ legitimately between providers, so the payload is forwarded untouched;
/// the accessors only read the handful of standard fields. `Debug` lists field names only so
/// tokens never end up in logs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenResponse(Map<String, Value>);
impl TokenResponse {
	/// Returns the raw value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// `access_token` field, when present as a string.
	pub fn access_token(&self) -> Option<&str> {
		self.get("access_token").and_then(Value::as_str)
	}

	/// `refresh_token` field, when present as a string.
	pub fn refresh_token(&self) -> Option<&str> {
		self.get("refresh_token").and_then(Value::as_str)
	}

	/// `token_type` field, when present as a string.
	pub fn token_type(&self) -> Option<&str> {
		self.get("token_type").and_then(Value::as_str)
	}

	/// Lifetime from `expires_in`, accepting numbers and numeric strings.
	pub fn expires_in(&self) -> Option<Duration> {
		self.get("expires_in").and_then(json_seconds).map(Duration::seconds)
	}

	/// Absolute expiry for a response received at `issued_at`.
	pub fn expires_at(&self, issued_at: OffsetDateTime) -> Option<OffsetDateTime> {
		self.expires_in().and_then(|lifetime| issued_at.checked_add(lifetime))
	}

	/// Borrows the raw object.
	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}

	/// Returns the raw object.
	pub fn into_map(self) -> Map<String, Value> {
		self.0
	}
}
impl From<Map<String, Value>> for TokenResponse {
	fn from(value: Map<String, Value>) -> Self {
		Self(value)
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenResponse").field(&self.0.keys().collect::<Vec<_>>()).finish()
	}
}

/// Reads a whole number of seconds from a JSON number or numeric string.
pub(crate) fn json_seconds(value: &Value) -> Option<i64> {
	match value {
		Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn response(value: Value) -> TokenResponse {
		serde_json::from_value(value).expect("Token response fixture should deserialize.")
	}

	#[test]
	fn accessors_read_standard_fields() {
		let tokens = response(json!({
			"access_token": "at",
			"refresh_token": "rt",
			"token_type": "Bearer",
			"expires_in": 3599,
			"id_token": "jwt"
		}));
		let now = OffsetDateTime::now_utc();

		assert_eq!(tokens.access_token(), Some("at"));
		assert_eq!(tokens.refresh_token(), Some("rt"));
		assert_eq!(tokens.token_type(), Some("Bearer"));
		assert_eq!(tokens.expires_in(), Some(Duration::seconds(3599)));
		assert_eq!(tokens.expires_at(now), Some(now + Duration::seconds(3599)));
		assert_eq!(tokens.get("id_token"), Some(&json!("jwt")));
	}

	#[test]
	fn expires_in_accepts_numeric_strings() {
		assert_eq!(response(json!({ "expires_in": "120" })).expires_in(), Some(Duration::seconds(120)));
		assert_eq!(response(json!({ "expires_in": "soon" })).expires_in(), None);
		assert_eq!(response(json!({})).expires_in(), None);
	}

	#[test]
	fn debug_hides_token_values() {
		let rendered = format!("{:?}", response(json!({ "access_token": "very-secret" })));

		assert!(rendered.contains("access_token"));
		assert!(!rendered.contains("very-secret"));
	}

	#[test]
	fn non_object_payloads_are_rejected() {
		assert!(serde_json::from_value::<TokenResponse>(json!(["a"])).is_err());
	}
}
