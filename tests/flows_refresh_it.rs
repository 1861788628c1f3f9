#![cfg(all(feature = "aes-gcm", feature = "reqwest"))]

// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
// self
use oauth2_bridge::{
	_preludet::*,
	auth::ProviderInfo,
	error::{ConfigError, UpstreamError},
	flows::{ProviderAdapter, ReqwestProviderAdapter},
	http::ReqwestTransportErrorMapper,
	provider::{
		ClientCredentials, DefaultProviderStrategy, ProviderConfig, ProviderConfigBuilder,
		ProviderStrategy,
	},
};

const CLIENT_ID: &str = "client-refresh";
const CLIENT_SECRET: &str = "secret-refresh";

fn builder(server: &MockServer) -> ProviderConfigBuilder {
	let info = ProviderInfo::new("mock-refresh", "v1").expect("Provider info should be valid.");

	ProviderConfig::builder(info)
		.credentials(ClientCredentials::new(CLIENT_ID, CLIENT_SECRET))
		.authorize_url(Url::parse(&server.url("/authorize")).expect("Authorize URL should parse."))
		.token_url(Url::parse(&server.url("/token")).expect("Token URL should parse."))
		.callback_url(
			Url::parse("https://app.example.com/oauth/callback").expect("Callback should parse."),
		)
}

fn config_with_refresh(server: &MockServer) -> ProviderConfig {
	builder(server)
		.refresh_token_url(Url::parse(&server.url("/refresh")).expect("Refresh URL should parse."))
		.build()
		.expect("Config should build.")
}

#[tokio::test]
async fn refresh_posts_grant_and_returns_new_tokens() {
	let server = MockServer::start_async().await;
	let adapter =
		build_reqwest_test_adapter(config_with_refresh(&server), test_state_codec(test_cipher()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/refresh")
				.query_param("refresh_token", "rt-1")
				.header("content-type", "application/x-www-form-urlencoded")
				.body(format!(
					"client_id={CLIENT_ID}&client_secret={CLIENT_SECRET}&grant_type=refresh_token&refresh_token=rt-1"
				));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-2\",\"refresh_token\":\"rt-2\",\"expires_in\":1800}");
		})
		.await;
	let tokens = adapter.refresh_token("rt-1").await.expect("Refresh should succeed.");

	mock.assert_async().await;

	assert_eq!(tokens.access_token(), Some("access-2"));
	assert_eq!(tokens.refresh_token(), Some("rt-2"));
	assert_eq!(tokens.expires_in(), Some(Duration::minutes(30)));
}

#[tokio::test]
async fn refresh_rejection_carries_status_and_retry_hint() {
	let server = MockServer::start_async().await;
	let adapter =
		build_reqwest_test_adapter(config_with_refresh(&server), test_state_codec(test_cipher()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(429).header("retry-after", "17").body("slow down");
		})
		.await;
	let err = adapter.refresh_token("rt-1").await.expect_err("Throttled refresh should fail.");

	mock.assert_async().await;

	match err {
		Error::TokenRefresh(UpstreamError::Rejected {
			status,
			oauth_error,
			body_preview,
			retry_after,
			..
		}) => {
			assert_eq!(status, Some(429));
			assert!(oauth_error.is_none());
			assert_eq!(body_preview.as_deref(), Some("slow down"));
			assert_eq!(retry_after, Some(Duration::seconds(17)));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
}

#[tokio::test]
async fn missing_refresh_endpoint_fails_without_network() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.any_request();
			then.status(200).body("{}");
		})
		.await;
	let adapter = build_reqwest_test_adapter(
		builder(&server).build().expect("Config should build."),
		test_state_codec(test_cipher()),
	);
	let err = adapter.refresh_token("rt-1").await.expect_err("No endpoint should fail.");

	assert!(matches!(
		err,
		Error::Config(ConfigError::MissingEndpoint { ref provider, field: "refresh_token_url" })
			if provider == "mock-refresh/v1"
	));
	assert!(!err.is_client_fault());

	mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn slow_providers_time_out() {
	let server = MockServer::start_async().await;
	let strategy: Arc<dyn ProviderStrategy> = Arc::new(DefaultProviderStrategy);
	let adapter: ReqwestTestAdapter = ProviderAdapter::with_http_client(
		config_with_refresh(&server),
		strategy,
		test_state_codec(test_cipher()),
		test_reqwest_http_client().with_timeout(StdDuration::from_millis(100)),
		ReqwestTransportErrorMapper,
	);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(200).delay(StdDuration::from_secs(2)).body("{\"access_token\":\"late\"}");
		})
		.await;
	let err = adapter.refresh_token("rt-1").await.expect_err("Slow refresh should time out.");

	assert!(matches!(err, Error::TokenRefresh(ref upstream) if upstream.is_timeout()));
}

#[tokio::test]
async fn default_transport_does_not_follow_redirects() {
	let server = MockServer::start_async().await;
	let adapter = ReqwestProviderAdapter::new(
		config_with_refresh(&server),
		Arc::new(DefaultProviderStrategy),
		test_state_codec(test_cipher()),
	);
	let redirect = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(302).header("location", server.url("/elsewhere"));
		})
		.await;
	let elsewhere = server
		.mock_async(|when, then| {
			when.path("/elsewhere");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"hijacked\"}");
		})
		.await;
	let err = adapter.refresh_token("rt-1").await.expect_err("Redirects must not be followed.");

	redirect.assert_async().await;
	elsewhere.assert_hits_async(0).await;

	assert!(matches!(
		err,
		Error::TokenRefresh(UpstreamError::Rejected { status: Some(302), .. })
	));
}
