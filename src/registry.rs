//! Runtime registry routing the shared callback endpoint to the provider that issued the state.
//!
//! Every provider redirects to the same `GET /oauth/callback`; the only way to tell them apart
//! is the sealed state. [`ProviderRegistry::dispatch_callback`] opens the state with the shared
//! [`StateCodec`], looks up the matching [`OAuth2Provider`], and hands the query over.

// self
use crate::{
	_prelude::*,
	adapter::OAuth2Provider,
	auth::ProviderInfo,
	flows::{CallbackOutcome, CallbackQuery},
	state::{StateCodec, StateCodecError},
};

type ProviderMap = HashMap<ProviderInfo, Arc<dyn OAuth2Provider>>;

/// Thread-safe map of provider integrations keyed by [`ProviderInfo`].
#[derive(Clone)]
pub struct ProviderRegistry {
	codec: Arc<StateCodec>,
	providers: Arc<RwLock<ProviderMap>>,
}
impl ProviderRegistry {
	/// Creates an empty registry that opens callback states with `codec`.
	///
	/// Registered providers must seal their states with the same key.
	pub fn new(codec: Arc<StateCodec>) -> Self {
		Self { codec, providers: Default::default() }
	}

	/// Registers `provider`, returning the integration it replaced, if any.
	pub fn register(&self, provider: Arc<dyn OAuth2Provider>) -> Option<Arc<dyn OAuth2Provider>> {
		let info = provider.info().clone();

		#[cfg(feature = "tracing")]
		tracing::debug!(provider = %info, "Registering provider.");

		self.providers.write().insert(info, provider)
	}

	/// Returns the integration registered for `info`.
	pub fn get(&self, info: &ProviderInfo) -> Option<Arc<dyn OAuth2Provider>> {
		self.providers.read().get(info).cloned()
	}

	/// Lists registered providers in a stable order.
	pub fn providers(&self) -> Vec<ProviderInfo> {
		let mut infos = self.providers.read().keys().cloned().collect::<Vec<_>>();

		infos.sort();

		infos
	}

	/// Routes a callback to the provider named inside its state.
	///
	/// Provider errors and missing codes are reported before the state is touched, matching
	/// [`OAuth2Provider::handle_callback`]. No request is sent for an unknown provider.
	pub async fn dispatch_callback(&self, query: CallbackQuery) -> Result<CallbackOutcome> {
		if let Some(error) = &query.error {
			return Err(Error::AuthorizationDenied {
				error: error.clone(),
				description: query.error_description.clone(),
			});
		}
		if query.code.as_deref().is_none_or(str::is_empty) {
			return Err(Error::MissingCode);
		}

		let token =
			query.state.as_deref().filter(|token| !token.is_empty()).ok_or(StateCodecError::Missing)?;
		let state = self.codec.decode(token)?;
		let provider = self
			.get(&state.provider_info)
			.ok_or(Error::UnknownProvider { provider: state.provider_info })?;

		provider.handle_callback(query).await
	}
}
impl Debug for ProviderRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderRegistry").field("providers", &self.providers()).finish()
	}
}
