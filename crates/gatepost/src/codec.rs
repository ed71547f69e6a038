//! Authenticated-encryption codec for session tokens.
//!
//! Turns an [`Identity`] into an opaque cookie-safe string and back,
//! detecting any tampering or corruption. A single AES-256-GCM key is
//! derived from the two on-disk secret keys via BLAKE3 with a domain
//! separation prefix; the logical cookie name rides along as associated
//! data, so a token minted for one cookie fails verification under another.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use thiserror::Error;

use crate::identity::Identity;
use crate::keys::SecretKeyPair;

const NONCE_LEN: usize = 12;
const KEY_DOMAIN: &[u8] = b"gatepost-session-v1:";

/// Failure to produce a token. Rare; indicates a bug or broken key material.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("could not serialize identity payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("could not seal identity payload")]
    Seal,
}

/// A session token failed authentication or did not parse.
///
/// Recoverable per request; the middleware rejects the request uniformly.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("token is not valid base64: {0}")]
    Transport(#[from] base64::DecodeError),

    #[error("token too short to carry a nonce")]
    Truncated,

    /// Covers a forged or corrupted token, a wrong key, and a cookie-name
    /// binding mismatch; GCM cannot tell these apart and neither can we.
    #[error("token failed authentication")]
    Verification,

    #[error("decrypted payload is not an identity record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("identity payload violates the anonymous-id invariant")]
    Inconsistent,
}

/// Encodes identity records to opaque tokens and back.
///
/// Holds only derived key material; cheap to construct once at server
/// construction and share behind an `Arc`.
pub struct TokenCodec {
    cipher: Aes256Gcm,
}

impl TokenCodec {
    pub fn new(keys: &SecretKeyPair) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(KEY_DOMAIN);
        hasher.update(keys.hash_key());
        hasher.update(keys.block_key());
        let derived: [u8; 32] = hasher.finalize().into();
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived)),
        }
    }

    /// Authenticate and encrypt `identity`, bound to the logical cookie
    /// `name`. Randomized: encoding the same record twice yields different
    /// tokens.
    pub fn encode(&self, name: &str, identity: &Identity) -> Result<String, EncodeError> {
        let payload = serde_json::to_vec(identity)?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &payload,
                    aad: name.as_bytes(),
                },
            )
            .map_err(|_| EncodeError::Seal)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Verify and decrypt `token` under the logical cookie `name`.
    ///
    /// Returns a fully populated record or an error; never a partial one.
    pub fn decode(&self, name: &str, token: &str) -> Result<Identity, DecodeError> {
        let sealed = URL_SAFE_NO_PAD.decode(token)?;
        if sealed.len() <= NONCE_LEN {
            return Err(DecodeError::Truncated);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);

        let payload = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: name.as_bytes(),
                },
            )
            .map_err(|_| DecodeError::Verification)?;

        let identity: Identity = serde_json::from_slice(&payload)?;
        if !identity.is_consistent() {
            return Err(DecodeError::Inconsistent);
        }
        Ok(identity)
    }
}
