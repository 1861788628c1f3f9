//! Opaque, encrypted `state` values that survive the redirect round trip.
//!
//! A state token is produced by a fixed pipeline:
//!
//! ```text
//! OAuth2State --serialize--> JSON bytes --encrypt--> sealed bytes --encode--> URL-safe base64
//! ```
//!
//! and opened by running the inverse steps in reverse order. Every step is exposed as a
//! standalone function so callers can compose them, and each one fails with its own
//! [`StateCodecError`] variant. [`StateCodec`] runs the whole pipeline against a shared
//! [`StateCipher`].

pub mod cipher;

pub use cipher::*;

// crates.io
use base64::{
	Engine as _,
	engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use rand::{Rng, distr::Alphanumeric};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{ProviderInfo, UserId},
};

const NONCE_LEN: usize = 16;

/// Serialized field names an extra may not reuse.
pub const RESERVED_KEYS: [&str; 4] = ["userId", "providerInfo", "nonce", "issuedAt"];

/// Failures raised while producing or opening a state token.
#[derive(Debug, ThisError)]
pub enum StateCodecError {
	/// State could not be serialized.
	#[error("State could not be serialized.")]
	Serialize(#[source] serde_json::Error),
	/// The cipher refused to seal the state.
	#[error("State could not be encrypted.")]
	Encrypt(#[source] CipherError),
	/// An extra collides with a built-in state field.
	#[error("State extra `{key}` collides with a built-in state field.")]
	ReservedKey {
		/// Offending extra key.
		key: String,
	},
	/// Token contains characters outside the URL-safe base64 alphabet.
	#[error("State token contains characters outside the URL-safe base64 alphabet.")]
	InvalidEncoding,
	/// Token is not valid base64.
	#[error("State token is not valid base64.")]
	Base64(#[source] base64::DecodeError),
	/// Token was forged, corrupted, or sealed under another key.
	#[error("State could not be decrypted.")]
	Decrypt(#[source] CipherError),
	/// Decrypted bytes are not a well-formed state.
	#[error("Decrypted state is malformed.")]
	Deserialize(#[source] serde_path_to_error::Error<serde_json::Error>),
	/// Callback carried no state at all.
	#[error("Callback request is missing the state parameter.")]
	Missing,
	/// State was issued for a different provider than the one handling the callback.
	#[error("State was issued for provider {found}, expected {expected}.")]
	ProviderMismatch {
		/// Provider handling the callback.
		expected: ProviderInfo,
		/// Provider recorded in the state.
		found: ProviderInfo,
	},
	/// State is older than the configured maximum age.
	#[error("State expired {age} after issuance; the limit is {max_age}.")]
	Expired {
		/// Age of the state when it was decoded.
		age: Duration,
		/// Maximum accepted age.
		max_age: Duration,
	},
}

/// Data carried through the authorization redirect.
///
/// `nonce` and `issued_at` make every token unique and allow age checks; `extra` holds
/// caller-supplied values and is flattened into the serialized object, so its keys must stay
/// clear of [`RESERVED_KEYS`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2State {
	/// User who started the login.
	pub user_id: UserId,
	/// Provider the login was started against.
	pub provider_info: ProviderInfo,
	/// Random alphanumeric value.
	pub nonce: String,
	/// Issuance instant, serialized as unix seconds.
	#[serde(with = "time::serde::timestamp")]
	pub issued_at: OffsetDateTime,
	/// Caller-defined values.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}
impl OAuth2State {
	/// Creates a state for `user_id` against `provider_info`, stamped with a fresh nonce and the
	/// current time.
	pub fn new(user_id: UserId, provider_info: ProviderInfo) -> Self {
		let now = OffsetDateTime::now_utc();

		Self {
			user_id,
			provider_info,
			nonce: rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect(),
			issued_at: now.replace_nanosecond(0).unwrap_or(now),
			extra: BTreeMap::new(),
		}
	}

	/// Adds a caller-defined value.
	pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.extra.insert(key.into(), value.into());

		self
	}

	/// Age of the state at `now`.
	pub fn age(&self, now: OffsetDateTime) -> Duration {
		now - self.issued_at
	}
}

/// Runs the state pipeline against a shared cipher.
#[derive(Clone)]
pub struct StateCodec {
	cipher: Arc<dyn StateCipher>,
	max_age: Option<Duration>,
}
impl StateCodec {
	/// Creates a codec that accepts states of any age.
	pub fn new(cipher: Arc<dyn StateCipher>) -> Self {
		Self { cipher, max_age: None }
	}

	/// Rejects states older than `max_age` during decoding.
	pub fn with_max_age(mut self, max_age: Duration) -> Self {
		self.max_age = Some(max_age);

		self
	}

	/// Maximum accepted age, if any.
	pub fn max_age(&self) -> Option<Duration> {
		self.max_age
	}

	/// Serializes, encrypts, and encodes `state`.
	pub fn encode(&self, state: &OAuth2State) -> Result<String, StateCodecError> {
		let bytes = serialize(state)?;
		let sealed = encrypt(self.cipher.as_ref(), &bytes)?;

		Ok(encode(&sealed))
	}

	/// Decodes, decrypts, and deserializes `token`, then applies the age limit.
	pub fn decode(&self, token: &str) -> Result<OAuth2State, StateCodecError> {
		let sealed = decode(token)?;
		let bytes = decrypt(self.cipher.as_ref(), &sealed)?;
		let state = deserialize(&bytes)?;

		if let Some(max_age) = self.max_age {
			let age = state.age(OffsetDateTime::now_utc());

			if age > max_age {
				return Err(StateCodecError::Expired { age, max_age });
			}
		}

		Ok(state)
	}
}
impl Debug for StateCodec {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StateCodec").field("max_age", &self.max_age).finish()
	}
}

/// Serializes a state into JSON bytes.
///
/// Extras named after a built-in field are refused, since the flattened object would carry
/// the key twice and never deserialize.
pub fn serialize(state: &OAuth2State) -> Result<Vec<u8>, StateCodecError> {
	if let Some(key) = state.extra.keys().find(|key| RESERVED_KEYS.contains(&key.as_str())) {
		return Err(StateCodecError::ReservedKey { key: key.to_owned() });
	}

	serde_json::to_vec(state).map_err(StateCodecError::Serialize)
}

/// Seals serialized bytes with `cipher`.
pub fn encrypt(cipher: &dyn StateCipher, bytes: &[u8]) -> Result<Vec<u8>, StateCodecError> {
	cipher.encrypt(bytes).map_err(StateCodecError::Encrypt)
}

/// Encodes sealed bytes as unpadded URL-safe base64.
pub fn encode(sealed: &[u8]) -> String {
	URL_SAFE_NO_PAD.encode(sealed)
}

/// Decodes a URL-safe base64 token.
///
/// Only `A-Z a-z 0-9 - _` are accepted. The token is mapped back onto the standard alphabet
/// (`-` to `+`, `_` to `/`) and padded to a multiple of four before decoding.
pub fn decode(token: &str) -> Result<Vec<u8>, StateCodecError> {
	if !token.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_') {
		return Err(StateCodecError::InvalidEncoding);
	}

	let mut standard = token
		.chars()
		.map(|c| match c {
			'-' => '+',
			'_' => '/',
			c => c,
		})
		.collect::<String>();

	standard.extend(std::iter::repeat_n('=', (4 - standard.len() % 4) % 4));

	STANDARD.decode(standard).map_err(StateCodecError::Base64)
}

/// Opens sealed bytes with `cipher`.
pub fn decrypt(cipher: &dyn StateCipher, sealed: &[u8]) -> Result<Vec<u8>, StateCodecError> {
	cipher.decrypt(sealed).map_err(StateCodecError::Decrypt)
}

/// Parses decrypted bytes into a state.
pub fn deserialize(bytes: &[u8]) -> Result<OAuth2State, StateCodecError> {
	let de = &mut serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(de).map_err(StateCodecError::Deserialize)
}
