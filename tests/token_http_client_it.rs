#![cfg(feature = "reqwest")]

// self
use oauth2_bridge::{
	_preludet::*,
	auth::ProviderInfo,
	error::UpstreamError,
	flows::{ProviderAdapter, VerificationFailure},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient, TransportErrorMapper},
	provider::{
		ClientCredentials, DefaultProviderStrategy, Operation, ProviderConfig, ProviderStrategy,
	},
	oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse},
	state::{CipherError, StateCipher, StateCodec},
};

#[derive(Debug)]
enum FakeTransportError {
	Throttled,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Throttled => write!(f, "Transport throttled."),
		}
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Copy)]
struct FakeHttpClient {
	retry_after: Duration,
}
impl FakeHttpClient {
	fn throttled(retry_after: Duration) -> Self {
		Self { retry_after }
	}
}
impl TokenHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot, retry_after: self.retry_after }
	}
}

struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
	retry_after: Duration,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, _request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();
		let retry_after = self.retry_after;

		Box::pin(async move {
			assert!(
				slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);
			slot.store(ResponseMetadata { status: Some(429), retry_after: Some(retry_after) });

			Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Throttled)))
		})
	}
}

#[derive(Clone, Default)]
struct RecordingTransportErrorMapper {
	calls: Arc<Mutex<Vec<(Operation, Option<ResponseMetadata>)>>>,
}
impl RecordingTransportErrorMapper {
	fn recorded(&self) -> Vec<(Operation, Option<ResponseMetadata>)> {
		self.calls.lock().clone()
	}
}
impl TransportErrorMapper<FakeTransportError> for RecordingTransportErrorMapper {
	fn map_transport_error(
		&self,
		operation: Operation,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<FakeTransportError>,
	) -> UpstreamError {
		self.calls.lock().push((operation, meta.cloned()));

		match err {
			HttpClientError::Reqwest(inner) => UpstreamError::Rejected {
				status: meta.and_then(|value| value.status),
				oauth_error: None,
				description: Some(inner.to_string()),
				body_preview: None,
				retry_after: meta.and_then(|value| value.retry_after),
			},
			HttpClientError::Io(inner) => UpstreamError::Io(inner),
			other => UpstreamError::Other { message: format!("{other:?}") },
		}
	}
}

struct PlainCipher;
impl StateCipher for PlainCipher {
	fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
		Ok(plaintext.to_vec())
	}

	fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
		Ok(ciphertext.to_vec())
	}
}

fn build_config() -> ProviderConfig {
	let info = ProviderInfo::new("mock-token-http", "v1").expect("Provider info should be valid.");

	ProviderConfig::builder(info)
		.credentials(ClientCredentials::new("throttled-client", "throttled-secret"))
		.authorize_url(
			Url::parse("https://mock.example.com/authorize").expect("Authorize URL should parse."),
		)
		.token_url(Url::parse("https://mock.example.com/token").expect("Token URL should parse."))
		.callback_url(
			Url::parse("https://app.example.com/oauth/callback").expect("Callback should parse."),
		)
		.refresh_token_url(
			Url::parse("https://mock.example.com/token").expect("Refresh URL should parse."),
		)
		.verify_token_url(
			Url::parse("https://mock.example.com/tokeninfo").expect("Verify URL should parse."),
		)
		.build()
		.expect("Provider config should build.")
}

fn build_adapter(
	retry_after: Duration,
	mapper: Arc<RecordingTransportErrorMapper>,
) -> ProviderAdapter<FakeHttpClient, RecordingTransportErrorMapper> {
	let strategy: Arc<dyn ProviderStrategy> = Arc::new(DefaultProviderStrategy);

	ProviderAdapter::with_http_client(
		build_config(),
		strategy,
		Arc::new(StateCodec::new(Arc::new(PlainCipher))),
		FakeHttpClient::throttled(retry_after),
		mapper,
	)
}

#[tokio::test]
async fn fake_token_http_client_surfaces_metadata() {
	let mapper = Arc::new(RecordingTransportErrorMapper::default());
	let adapter = build_adapter(Duration::seconds(5), mapper);
	let err = adapter.refresh_token("rt-1").await.expect_err("Request should be throttled.");

	match err {
		Error::TokenRefresh(UpstreamError::Rejected { status, retry_after, description, .. }) => {
			assert_eq!(status, Some(429));
			assert_eq!(retry_after, Some(Duration::seconds(5)));
			assert_eq!(description.as_deref(), Some("Transport throttled."));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
}

#[tokio::test]
async fn fake_mapper_captures_operation_and_metadata() {
	let mapper = Arc::new(RecordingTransportErrorMapper::default());
	let adapter = build_adapter(Duration::seconds(30), mapper.clone());

	adapter.refresh_token("rt-1").await.expect_err("Refresh should be throttled.");
	adapter
		.token_client
		.exchange_code(&adapter.config, adapter.strategy.as_ref(), "code-1")
		.await
		.expect_err("Exchange should be throttled.");

	let recorded = mapper.recorded();

	assert_eq!(recorded.len(), 2);
	assert_eq!(recorded[0].0, Operation::RefreshToken);
	assert_eq!(recorded[1].0, Operation::ExchangeCode);

	for (_, meta) in recorded {
		let meta = meta.expect("Mapper should receive captured metadata.");

		assert_eq!(meta.status, Some(429));
		assert_eq!(meta.retry_after, Some(Duration::seconds(30)));
	}
}

#[tokio::test]
async fn verification_through_custom_transport_degrades_to_invalid() {
	let mapper = Arc::new(RecordingTransportErrorMapper::default());
	let adapter = build_adapter(Duration::seconds(1), mapper.clone());
	let result = adapter.verify_token("at-1").await.expect("Verification should not error.");

	assert!(!result.is_valid);
	assert_eq!(
		result.failure,
		Some(VerificationFailure::Rejected {
			status: 429,
			reason: Some("Transport throttled.".into())
		})
	);
	assert_eq!(mapper.recorded()[0].0, Operation::VerifyToken);
}
