//! Ready-made configuration builders for common identity providers.
//!
//! Each preset fills in the provider's endpoints, default scopes, fixed authorize
//! parameters, refresh buffer, and quirks. Callers supply credentials and the registered
//! callback URL, may adjust the returned builder, and then call
//! [`ProviderConfigBuilder::build`]. Pair Slack configs with
//! [`SlackProviderStrategy`](crate::provider::SlackProviderStrategy).

// self
use crate::{
	_prelude::*,
	auth::ProviderInfo,
	provider::{ClientCredentials, ProviderConfigBuilder, ProviderConfigError, VerifyTokenStyle},
};

/// Google OAuth 2.0 (`google/v2`) requesting offline Drive access.
pub fn google_v2(
	credentials: ClientCredentials,
	callback_url: Url,
) -> Result<ProviderConfigBuilder, ProviderConfigError> {
	Ok(ProviderConfigBuilder::new(ProviderInfo::new("google", "v2")?)
		.credentials(credentials)
		.callback_url(callback_url)
		.scopes(["https://www.googleapis.com/auth/drive"])
		.authorize_url(parse("authorize", "https://accounts.google.com/o/oauth2/v2/auth")?)
		.token_url(parse("token", "https://accounts.google.com/o/oauth2/token")?)
		.verify_token_url(parse("verify_token", "https://oauth2.googleapis.com/tokeninfo")?)
		.refresh_token_url(parse("refresh_token", "https://oauth2.googleapis.com/token")?)
		.token_refresh_buffer(Duration::days(90))
		.callback_url_param("response_type", "code")
		.callback_url_param("access_type", "offline"))
}

/// Slack OAuth v2 (`slack/v2`) requesting a user token.
///
/// User scopes travel in `user_scope` rather than `scope`, and Slack joins scopes with commas.
pub fn slack_v2(
	credentials: ClientCredentials,
	callback_url: Url,
) -> Result<ProviderConfigBuilder, ProviderConfigError> {
	Ok(ProviderConfigBuilder::new(ProviderInfo::new("slack", "v2")?)
		.credentials(credentials)
		.callback_url(callback_url)
		.authorize_url(parse("authorize", "https://slack.com/oauth/v2/authorize")?)
		.token_url(parse("token", "https://slack.com/api/oauth.v2.access")?)
		.verify_token_url(parse("verify_token", "https://slack.com/api/auth.test")?)
		.refresh_token_url(parse("refresh_token", "https://slack.com/api/oauth.v2.access")?)
		.token_refresh_buffer(Duration::hours(12))
		.callback_url_param("user_scope", "openid,email,profile")
		.callback_url_param("response_type", "code")
		.callback_url_param("access_type", "offline")
		.scope_delimiter(',')
		.verify_token_style(VerifyTokenStyle::Bearer))
}

/// AWS Cognito hosted UI (`aws/v2`) served from `domain`, e.g.
/// `my-pool.auth.us-east-1.amazoncognito.com`.
pub fn aws_v2(
	domain: &str,
	credentials: ClientCredentials,
	callback_url: Url,
) -> Result<ProviderConfigBuilder, ProviderConfigError> {
	let base = parse("authorize", &format!("https://{domain}/"))?;
	let join = |endpoint: &'static str, path: &str| {
		base.join(path).map_err(|source| ProviderConfigError::InvalidUrl { endpoint, source })
	};

	Ok(ProviderConfigBuilder::new(ProviderInfo::new("aws", "v2")?)
		.credentials(credentials)
		.callback_url(callback_url)
		.scopes(["openid", "email", "profile"])
		.authorize_url(join("authorize", "oauth2/authorize")?)
		.token_url(join("token", "oauth2/token")?)
		.verify_token_url(join("verify_token", "oauth2/userInfo")?)
		.refresh_token_url(join("refresh_token", "oauth2/token")?)
		.token_refresh_buffer(Duration::minutes(5))
		.verify_token_style(VerifyTokenStyle::Bearer))
}

/// GitHub OAuth apps (`github/v1`). Tokens do not expire, so neither verification nor
/// refresh endpoints are configured.
pub fn github_v1(
	credentials: ClientCredentials,
	callback_url: Url,
) -> Result<ProviderConfigBuilder, ProviderConfigError> {
	Ok(ProviderConfigBuilder::new(ProviderInfo::new("github", "v1")?)
		.credentials(credentials)
		.callback_url(callback_url)
		.scopes(["read:user"])
		.authorize_url(parse("authorize", "https://github.com/login/oauth/authorize")?)
		.token_url(parse("token", "https://github.com/login/oauth/access_token")?))
}

/// Airtable OAuth (`airtable/v1`).
pub fn airtable_v1(
	credentials: ClientCredentials,
	callback_url: Url,
) -> Result<ProviderConfigBuilder, ProviderConfigError> {
	Ok(ProviderConfigBuilder::new(ProviderInfo::new("airtable", "v1")?)
		.credentials(credentials)
		.callback_url(callback_url)
		.scopes(["data.records:read", "schema.bases:read"])
		.authorize_url(parse("authorize", "https://airtable.com/oauth2/v1/authorize")?)
		.token_url(parse("token", "https://airtable.com/oauth2/v1/token")?)
		.verify_token_url(parse("verify_token", "https://api.airtable.com/v0/meta/whoami")?)
		.refresh_token_url(parse("refresh_token", "https://airtable.com/oauth2/v1/token")?)
		.token_refresh_buffer(Duration::minutes(5))
		.verify_token_style(VerifyTokenStyle::Bearer))
}

fn parse(endpoint: &'static str, raw: &str) -> Result<Url, ProviderConfigError> {
	Url::parse(raw).map_err(|source| ProviderConfigError::InvalidUrl { endpoint, source })
}
