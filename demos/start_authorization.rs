//! Builds a Google authorize URL, then plays the redirect back through the shared callback
//! registry up to the point where the code would be exchanged.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use time::Duration;
use url::Url;
// self
use oauth2_bridge::{
	adapter::OAuth2Provider,
	auth::UserId,
	flows::{AuthenticateRequest, CallbackQuery, ReqwestProviderAdapter},
	provider::{ClientCredentials, DefaultProviderStrategy, presets},
	registry::ProviderRegistry,
	state::{AesGcmCipher, StateCodec},
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let codec = Arc::new(
		StateCodec::new(Arc::new(AesGcmCipher::new(&[42; 32]))).with_max_age(Duration::minutes(10)),
	);
	let config = presets::google_v2(
		ClientCredentials::new("demo-client", "demo-secret"),
		Url::parse("https://app.example.com/oauth/callback")?,
	)?
	.build()?;
	let google: Arc<dyn OAuth2Provider> =
		Arc::new(ReqwestProviderAdapter::new(config, Arc::new(DefaultProviderStrategy), codec.clone()));
	let registry = ProviderRegistry::new(codec.clone());

	registry.register(google.clone());

	let url = google.authenticate(
		AuthenticateRequest::new(UserId::new("user-123")?)
			.with_extra("returnTo", "/settings/integrations")
			.with_param("prompt", "consent"),
	)?;

	println!("Send your user to {url}.");

	// Simulate the provider redirecting back to `GET /oauth/callback`.
	let query = CallbackQuery::from_query_str(url.query().unwrap_or_default());
	let state = codec.decode(query.state.as_deref().unwrap_or_default())?;

	println!(
		"State for {} on {} carries {:?}.",
		state.user_id, state.provider_info, state.extra
	);
	println!("Registered providers: {:?}.", registry.providers());
	println!("With a real `code`, `registry.dispatch_callback(query)` performs the exchange.");

	Ok(())
}
