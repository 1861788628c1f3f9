#![cfg(all(feature = "aes-gcm", feature = "reqwest"))]

// std
use std::net::TcpListener;
// crates.io
use httpmock::prelude::*;
// self
use oauth2_bridge::{
	_preludet::*,
	auth::ProviderInfo,
	error::ConfigError,
	flows::{ProviderAdapter, VerificationFailure},
	http::ReqwestTransportErrorMapper,
	provider::{
		ClientCredentials, ProviderConfig, ProviderConfigBuilder, ProviderStrategy,
		SlackProviderStrategy, VerifyTokenStyle,
	},
};

fn builder(server: &MockServer) -> ProviderConfigBuilder {
	let info = ProviderInfo::new("mock-verify", "v1").expect("Provider info should be valid.");

	ProviderConfig::builder(info)
		.credentials(ClientCredentials::new("client-verify", "secret-verify"))
		.authorize_url(Url::parse(&server.url("/authorize")).expect("Authorize URL should parse."))
		.token_url(Url::parse(&server.url("/token")).expect("Token URL should parse."))
		.callback_url(
			Url::parse("https://app.example.com/oauth/callback").expect("Callback should parse."),
		)
}

fn adapter(config: ProviderConfig) -> ReqwestTestAdapter {
	build_reqwest_test_adapter(config, test_state_codec(test_cipher()))
}

#[tokio::test]
async fn query_style_verification_reports_lifetime_and_scopes() {
	let server = MockServer::start_async().await;
	let config = builder(&server)
		.verify_token_url(Url::parse(&server.url("/tokeninfo")).expect("Verify URL should parse."))
		.build()
		.expect("Config should build.");
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/tokeninfo").query_param("access_token", "at-1");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"expires_in\":\"3599\",\"scope\":\"openid email\"}");
		})
		.await;
	let result = adapter(config).verify_token("at-1").await.expect("Verification should run.");

	mock.assert_async().await;

	assert!(result.is_valid);
	assert_eq!(result.expires_in, Some(3599));
	assert_eq!(result.scopes, vec!["openid", "email"]);
	assert!(result.failure.is_none());
}

#[tokio::test]
async fn bearer_style_verification_sends_authorization_header() {
	let server = MockServer::start_async().await;
	let config = builder(&server)
		.verify_token_url(Url::parse(&server.url("/whoami")).expect("Verify URL should parse."))
		.verify_token_style(VerifyTokenStyle::Bearer)
		.build()
		.expect("Config should build.");
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/whoami").header("authorization", "Bearer at-2");
			then.status(200).header("content-type", "application/json").body("{\"id\":\"usr\"}");
		})
		.await;
	let result = adapter(config).verify_token("at-2").await.expect("Verification should run.");

	mock.assert_async().await;

	assert!(result.is_valid);
	assert!(result.scopes.is_empty());
	assert_eq!(result.expires_in, None);
}

#[tokio::test]
async fn rejected_tokens_are_invalid_not_errors() {
	let server = MockServer::start_async().await;
	let config = builder(&server)
		.verify_token_url(Url::parse(&server.url("/tokeninfo")).expect("Verify URL should parse."))
		.build()
		.expect("Config should build.");
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/tokeninfo");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_token\"}");
		})
		.await;
	let result = adapter(config).verify_token("expired").await.expect("Verification should run.");

	mock.assert_async().await;

	assert!(!result.is_valid);
	assert_eq!(
		result.failure,
		Some(VerificationFailure::Rejected { status: 400, reason: Some("invalid_token".into()) })
	);
}

#[tokio::test]
async fn unreachable_provider_degrades_to_invalid() {
	let server = MockServer::start_async().await;
	let port = TcpListener::bind("127.0.0.1:0")
		.and_then(|listener| listener.local_addr())
		.expect("Ephemeral port should be available.")
		.port();
	let config = builder(&server)
		.verify_token_url(
			Url::parse(&format!("http://127.0.0.1:{port}/tokeninfo"))
				.expect("Verify URL should parse."),
		)
		.build()
		.expect("Config should build.");
	let result = adapter(config).verify_token("at-3").await.expect("Verification should run.");

	assert!(!result.is_valid);
	assert!(matches!(result.failure, Some(VerificationFailure::Unreachable { .. })));
}

#[tokio::test]
async fn missing_verify_endpoint_is_a_config_error() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.any_request();
			then.status(200).body("{}");
		})
		.await;
	let config = builder(&server).build().expect("Config should build.");
	let err = adapter(config).verify_token("at-4").await.expect_err("No endpoint should fail.");

	assert!(matches!(
		err,
		Error::Config(ConfigError::MissingEndpoint { field: "verify_token_url", .. })
	));

	mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn slack_auth_test_failures_are_invalid() {
	let server = MockServer::start_async().await;
	let config = builder(&server)
		.verify_token_url(Url::parse(&server.url("/auth.test")).expect("Verify URL should parse."))
		.verify_token_style(VerifyTokenStyle::Bearer)
		.build()
		.expect("Config should build.");
	let strategy: Arc<dyn ProviderStrategy> = Arc::new(SlackProviderStrategy);
	let adapter: ReqwestTestAdapter = ProviderAdapter::with_http_client(
		config,
		strategy,
		test_state_codec(test_cipher()),
		test_reqwest_http_client(),
		ReqwestTransportErrorMapper,
	);
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth.test");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"ok\":false,\"error\":\"token_revoked\"}");
		})
		.await;
	let result = adapter.verify_token("revoked").await.expect("Verification should run.");

	assert!(!result.is_valid);
	assert_eq!(
		result.failure,
		Some(VerificationFailure::Rejected { status: 200, reason: Some("token_revoked".into()) })
	);
}
