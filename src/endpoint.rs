//! Provider URL construction.
//!
//! [`build_url`] is pure: it merges parameters in a fixed priority order and emits every
//! key exactly once, sorted, so identical inputs always produce identical URLs.

// self
use crate::{
	_prelude::*,
	provider::{Operation, ProviderConfig},
};

/// Query parameters supplied by the caller; these override every default.
pub type OAuth2UrlParams = BTreeMap<String, String>;

/// Builds the URL for `operation` against `config`.
///
/// Parameters are merged from lowest to highest priority:
///
/// 1. query pairs already present on the configured base URL
/// 2. for [`Operation::Authorize`] only: `client_id`, `redirect_uri`, `scope` (joined with the scope
///    delimiter, omitted when empty), then the config's `callback_url_params`
/// 3. `params`
///
/// Fails with [`ConfigError::MissingEndpoint`](crate::error::ConfigError::MissingEndpoint) when
/// the provider does not declare the operation's endpoint.
pub fn build_url(
	config: &ProviderConfig,
	params: &OAuth2UrlParams,
	operation: Operation,
) -> Result<Url> {
	let mut url = config.endpoint(operation)?.clone();
	let mut merged = url.query_pairs().into_owned().collect::<BTreeMap<_, _>>();

	if operation == Operation::Authorize {
		merged.extend(authorize_defaults(config));
	}

	merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));

	if merged.is_empty() {
		url.set_query(None);
	} else {
		url.query_pairs_mut().clear().extend_pairs(merged.iter());
	}

	Ok(url)
}

fn authorize_defaults(config: &ProviderConfig) -> BTreeMap<String, String> {
	let mut defaults = BTreeMap::new();

	defaults.insert("client_id".to_owned(), config.credentials.client_id.clone());
	defaults.insert("redirect_uri".to_owned(), config.endpoints.callback.to_string());

	if let Some(scope) = config.scope.joined(config.quirks.scope_delimiter) {
		defaults.insert("scope".to_owned(), scope);
	}

	defaults.extend(config.callback_url_params.iter().map(|(k, v)| (k.clone(), v.clone())));

	defaults
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::ProviderInfo,
		error::ConfigError,
		provider::{ClientCredentials, ProviderConfigBuilder},
	};

	fn builder(authorize: &str) -> ProviderConfigBuilder {
		ProviderConfig::builder(
			ProviderInfo::new("google", "v2").expect("Provider info fixture should be valid."),
		)
		.credentials(ClientCredentials::new("X", "S"))
		.scopes(["a", "b"])
		.authorize_url(Url::parse(authorize).expect("URL should parse."))
		.token_url(Url::parse("https://p.example/token").expect("URL should parse."))
		.callback_url(Url::parse("https://app/cb").expect("URL should parse."))
		.refresh_token_url(Url::parse("https://p.example/token").expect("URL should parse."))
	}

	fn config() -> ProviderConfig {
		builder("https://p.example/auth")
			.callback_url_param("access_type", "offline")
			.build()
			.expect("Config fixture should build.")
	}

	fn query(url: &Url) -> BTreeMap<String, String> {
		url.query_pairs().into_owned().collect()
	}

	#[test]
	fn authorize_url_carries_defaults_and_state() {
		let params = OAuth2UrlParams::from([
			("state".to_owned(), "T".to_owned()),
			("response_type".to_owned(), "code".to_owned()),
		]);
		let url = build_url(&config(), &params, Operation::Authorize)
			.expect("Authorize URL should build.");

		assert_eq!(url.origin().ascii_serialization(), "https://p.example");
		assert_eq!(url.path(), "/auth");
		assert_eq!(
			query(&url),
			BTreeMap::from([
				("access_type".to_owned(), "offline".to_owned()),
				("client_id".to_owned(), "X".to_owned()),
				("redirect_uri".to_owned(), "https://app/cb".to_owned()),
				("response_type".to_owned(), "code".to_owned()),
				("scope".to_owned(), "a b".to_owned()),
				("state".to_owned(), "T".to_owned()),
			])
		);
		assert!(url.as_str().contains("scope=a+b"));
	}

	#[test]
	fn caller_params_override_defaults() {
		let params = OAuth2UrlParams::from([
			("client_id".to_owned(), "override".to_owned()),
			("access_type".to_owned(), "online".to_owned()),
		]);
		let url =
			build_url(&config(), &params, Operation::Authorize).expect("Authorize URL should build.");
		let pairs = url.query_pairs().collect::<Vec<_>>();

		assert_eq!(pairs.iter().filter(|(k, _)| k == "client_id").count(), 1);
		assert_eq!(query(&url).get("client_id").map(String::as_str), Some("override"));
		assert_eq!(query(&url).get("access_type").map(String::as_str), Some("online"));
	}

	#[test]
	fn base_url_query_pairs_are_lowest_priority() {
		let config = builder("https://p.example/auth?prompt=consent&client_id=base")
			.build()
			.expect("Config fixture should build.");
		let url = build_url(&config, &OAuth2UrlParams::new(), Operation::Authorize)
			.expect("Authorize URL should build.");

		assert_eq!(query(&url).get("prompt").map(String::as_str), Some("consent"));
		assert_eq!(query(&url).get("client_id").map(String::as_str), Some("X"));
	}

	#[test]
	fn empty_scope_is_omitted() {
		let config = builder("https://p.example/auth")
			.scopes(Vec::<String>::new())
			.build()
			.expect("Config fixture should build.");
		let url = build_url(&config, &OAuth2UrlParams::new(), Operation::Authorize)
			.expect("Authorize URL should build.");

		assert!(!query(&url).contains_key("scope"));
	}

	#[test]
	fn refresh_url_has_no_defaults() {
		let params = OAuth2UrlParams::from([("refresh_token".to_owned(), "r1".to_owned())]);
		let url = build_url(&config(), &params, Operation::RefreshToken)
			.expect("Refresh URL should build.");

		assert_eq!(url.as_str(), "https://p.example/token?refresh_token=r1");

		let url = build_url(&config(), &OAuth2UrlParams::new(), Operation::RefreshToken)
			.expect("Refresh URL should build.");

		assert_eq!(url.as_str(), "https://p.example/token");
	}

	#[test]
	fn missing_verify_endpoint_is_a_config_error() {
		let err = build_url(&config(), &OAuth2UrlParams::new(), Operation::VerifyToken)
			.expect_err("Verify URL is not configured.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::MissingEndpoint { field: "verify_token_url", .. })
		));
	}
}
