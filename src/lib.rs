//! Provider-agnostic OAuth 2.0 authorization-code engine: authorize URLs, sealed state
//! round-trips, code exchange, token verification, and refresh behind one adapter contract.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod adapter;
pub mod auth;
pub mod endpoint;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod provider;
pub mod registry;
pub mod state;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers shared by the crate's unit and integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		flows::ProviderAdapter,
		http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
		provider::{DefaultProviderStrategy, ProviderConfig, ProviderStrategy},
		state::{StateCipher, StateCodec},
	};

	/// Adapter type alias used by reqwest-backed integration tests.
	pub type ReqwestTestAdapter = ProviderAdapter<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a state codec over the provided cipher.
	pub fn test_state_codec(cipher: impl 'static + StateCipher) -> Arc<StateCodec> {
		Arc::new(StateCodec::new(Arc::new(cipher)))
	}

	/// Fixed-key AES-GCM cipher for tests.
	#[cfg(feature = "aes-gcm")]
	pub fn test_cipher() -> crate::state::AesGcmCipher {
		crate::state::AesGcmCipher::new(&[7; 32])
	}

	/// Constructs a [`ProviderAdapter`] backed by the default strategy, the reqwest transport
	/// used across integration tests, and the provided codec.
	pub fn build_reqwest_test_adapter(
		config: ProviderConfig,
		codec: Arc<StateCodec>,
	) -> ReqwestTestAdapter {
		let strategy: Arc<dyn ProviderStrategy> = Arc::new(DefaultProviderStrategy);

		ProviderAdapter::with_http_client(
			config,
			strategy,
			codec,
			test_reqwest_http_client(),
			ReqwestTransportErrorMapper,
		)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
