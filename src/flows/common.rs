//! Shared plumbing for provider round trips (request assembly, response reading, rejections).

// crates.io
use oauth2::{
	HttpRequest, HttpResponse,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use serde_json::{Map, Value};
use url::form_urlencoded::Serializer as FormSerializer;
// self
use crate::{
	_prelude::*,
	error::UpstreamError,
	flows::TokenResponse,
	http::{self, ResponseMetadata, TokenHttpClient, TransportErrorMapper},
	provider::{Operation, ProviderStrategy, RequestFormat},
};

const BODY_PREVIEW_LIMIT: usize = 256;
const JSON: &str = "application/json";

/// Transport half of the engine: sends exchange, verification, and refresh requests.
///
/// Holds no provider state; every call receives the [`ProviderConfig`](crate::provider::ProviderConfig)
/// and [`ProviderStrategy`] it should use, so one client can serve any number of providers.
pub struct TokenClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
}
impl<C, M> TokenClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Pairs a transport with its error mapper.
	pub fn new(http_client: impl Into<Arc<C>>, transport_mapper: impl Into<Arc<M>>) -> Self {
		Self { http_client: http_client.into(), transport_mapper: transport_mapper.into() }
	}

	pub(crate) async fn send(
		&self,
		operation: Operation,
		request: HttpRequest,
	) -> Result<(HttpResponse, Option<ResponseMetadata>), UpstreamError> {
		http::send(self.http_client.as_ref(), self.transport_mapper.as_ref(), operation, request)
			.await
	}
}
impl<C, M> Clone for TokenClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: Arc::clone(&self.http_client),
			transport_mapper: Arc::clone(&self.transport_mapper),
		}
	}
}
impl<C, M> Debug for TokenClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenClient(..)")
	}
}

/// Builds a token-endpoint POST with the body encoded per `format`.
pub(crate) fn token_request(
	url: &Url,
	format: RequestFormat,
	params: &BTreeMap<String, String>,
) -> Result<HttpRequest, UpstreamError> {
	let body = match format {
		RequestFormat::Form => FormSerializer::new(String::new()).extend_pairs(params).finish().into_bytes(),
		RequestFormat::Json => serde_json::to_vec(params).map_err(UpstreamError::invalid_request)?,
	};

	Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(CONTENT_TYPE, format.content_type())
		.header(ACCEPT, JSON)
		.body(body)
		.map_err(UpstreamError::invalid_request)
}

/// Builds a GET, optionally presenting `bearer` in the `Authorization` header.
pub(crate) fn get_request(url: &Url, bearer: Option<&str>) -> Result<HttpRequest, UpstreamError> {
	let mut builder = Request::builder().method(Method::GET).uri(url.as_str()).header(ACCEPT, JSON);

	if let Some(token) = bearer {
		builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
	}

	builder.body(Vec::new()).map_err(UpstreamError::invalid_request)
}

/// Turns a token-endpoint response into a [`TokenResponse`] or an upstream failure.
pub(crate) fn read_token_response(
	operation: Operation,
	strategy: &dyn ProviderStrategy,
	response: &HttpResponse,
	meta: Option<&ResponseMetadata>,
) -> Result<TokenResponse, UpstreamError> {
	if !response.status().is_success() {
		return Err(rejection(response, meta));
	}

	let tokens = TokenResponse::from(read_object(response)?);

	strategy.check_token_response(operation, &tokens)?;

	Ok(tokens)
}

/// Parses a 2xx body as a JSON object.
pub(crate) fn read_object(response: &HttpResponse) -> Result<Map<String, Value>, UpstreamError> {
	let de = &mut serde_json::Deserializer::from_slice(response.body());

	serde_path_to_error::deserialize(de)
		.map_err(|source| UpstreamError::MalformedBody { status: response.status().as_u16(), source })
}

/// Describes a non-2xx response, pulling OAuth error fields out of JSON bodies.
pub(crate) fn rejection(response: &HttpResponse, meta: Option<&ResponseMetadata>) -> UpstreamError {
	let body = response.body();
	let parsed = serde_json::from_slice::<Map<String, Value>>(body).ok();
	let field = |key: &str| {
		parsed.as_ref().and_then(|map| map.get(key)).and_then(Value::as_str).map(str::to_owned)
	};
	let oauth_error = field("error");
	let description = field("error_description");
	let body_preview = if oauth_error.is_none() && description.is_none() && !body.is_empty() {
		Some(truncate_preview(&String::from_utf8_lossy(body)))
	} else {
		None
	};
	let retry_after = meta
		.and_then(|meta| meta.retry_after)
		.or_else(|| http::parse_retry_after(response.headers()));

	UpstreamError::Rejected {
		status: Some(response.status().as_u16()),
		oauth_error,
		description,
		body_preview,
		retry_after,
	}
}

fn truncate_preview(body: &str) -> String {
	if body.chars().count() <= BODY_PREVIEW_LIMIT {
		return body.to_owned();
	}

	let mut buf = body.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}
