//! Encryption capability consumed by the state codec.

// crates.io
#[cfg(feature = "aes-gcm")]
use aes_gcm::{
	Aes256Gcm, Nonce,
	aead::{Aead, AeadCore, KeyInit, OsRng},
};
// self
use crate::{_prelude::*, error::BoxError};

/// Failure reported by a [`StateCipher`].
#[derive(Debug, ThisError)]
pub enum CipherError {
	/// Plaintext could not be encrypted.
	#[error("Encryption failed: {0}.")]
	Encrypt(String),
	/// Ciphertext was malformed, forged, or sealed under another key.
	#[error("Decryption failed: {0}.")]
	Decrypt(String),
	/// Failure raised by an external encryption backend.
	#[error(transparent)]
	Backend(BoxError),
}
impl CipherError {
	/// Wraps an error raised by an external encryption backend.
	pub fn backend(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Backend(Box::new(src))
	}
}

/// Symmetric, authenticated encryption used to seal state tokens.
///
/// `decrypt` must reject any ciphertext that was not produced by `encrypt` under the same key;
/// the codec relies on this for tamper detection. Implementations are shared across requests
/// and must be `Send + Sync`.
pub trait StateCipher: Send + Sync {
	/// Seals `plaintext`.
	fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

	/// Opens bytes previously produced by [`StateCipher::encrypt`].
	fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError>;
}

/// AES-256-GCM cipher; output is the random 96-bit nonce followed by the sealed payload.
#[cfg(feature = "aes-gcm")]
#[derive(Clone)]
pub struct AesGcmCipher {
	cipher: Aes256Gcm,
}
#[cfg(feature = "aes-gcm")]
impl AesGcmCipher {
	const NONCE_LEN: usize = 12;

	/// Creates a cipher from a 256-bit key.
	pub fn new(key: &[u8; 32]) -> Self {
		let key: [u8; 32] = *key;

		Self { cipher: Aes256Gcm::new(&key.into()) }
	}
}
#[cfg(feature = "aes-gcm")]
impl Debug for AesGcmCipher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("AesGcmCipher(..)")
	}
}
#[cfg(feature = "aes-gcm")]
impl StateCipher for AesGcmCipher {
	fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
		let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
		let sealed = self
			.cipher
			.encrypt(&nonce, plaintext)
			.map_err(|e| CipherError::Encrypt(format!("AES-GCM rejected the payload: {e}")))?;
		let mut out = Vec::with_capacity(Self::NONCE_LEN + sealed.len());

		out.extend_from_slice(&nonce);
		out.extend_from_slice(&sealed);

		Ok(out)
	}

	fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
		if ciphertext.len() <= Self::NONCE_LEN {
			return Err(CipherError::Decrypt("ciphertext is shorter than the nonce".into()));
		}

		let (nonce, sealed) = ciphertext.split_at(Self::NONCE_LEN);

		self.cipher
			.decrypt(Nonce::from_slice(nonce), sealed)
			.map_err(|e| CipherError::Decrypt(format!("AES-GCM authentication failed: {e}")))
	}
}

#[cfg(all(test, feature = "aes-gcm"))]
mod tests {
	// self
	use super::*;

	#[test]
	fn aes_gcm_round_trips_with_fresh_nonces() {
		let cipher = AesGcmCipher::new(&[7; 32]);
		let first = cipher.encrypt(b"payload").expect("Encryption should succeed.");
		let second = cipher.encrypt(b"payload").expect("Encryption should succeed.");

		assert_ne!(first, second, "Each seal must use a fresh nonce.");
		assert_eq!(cipher.decrypt(&first).expect("Decryption should succeed."), b"payload");
	}

	#[test]
	fn aes_gcm_rejects_tampering_and_foreign_keys() {
		let cipher = AesGcmCipher::new(&[7; 32]);
		let mut sealed = cipher.encrypt(b"payload").expect("Encryption should succeed.");

		assert!(AesGcmCipher::new(&[8; 32]).decrypt(&sealed).is_err());

		let last = sealed.len() - 1;

		sealed[last] ^= 0x01;

		assert!(matches!(cipher.decrypt(&sealed), Err(CipherError::Decrypt(_))));
		assert!(matches!(cipher.decrypt(&[0; 4]), Err(CipherError::Decrypt(_))));
	}
}
