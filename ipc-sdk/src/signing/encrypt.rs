//! Encryption of sensitive request fields (card number, expiry, CVC).
//!
//! The gateway expects RSA PKCS#1 v1.5 encryption with its public key, base64-encoded. The
//! padding is fixed by the gateway protocol and cannot be upgraded to OAEP from this side.

use base64::{Engine, engine::general_purpose::STANDARD};
use rsa::Pkcs1v15Encrypt;
use tracing::instrument;
use zeroize::Zeroizing;

use crate::{
    error::{IpcError, Result},
    signing::keys::{PrivateKey, PublicKey},
};

/// Encrypts a field value and returns the base64 ciphertext.
///
/// Encryption is randomized: the same plaintext yields a different ciphertext each call.
///
/// # Errors
///
/// Returns [`IpcError::Crypto`] if the plaintext is too long for the key (more than
/// `key_size - 11` bytes).
///
/// # Security
///
/// The plaintext is never logged.
///
/// # Examples
///
/// ```no_run
/// use ipc_sdk::signing::{encrypt::encrypt_field, keys::PublicKey};
///
/// # fn example() -> ipc_sdk::Result<()> {
/// let key = PublicKey::from_pem_file("gateway_cert.pem")?;
/// let pan = encrypt_field("4111111111111111", &key)?;
/// assert_ne!(pan, encrypt_field("4111111111111111", &key)?);
/// # Ok(())
/// # }
/// ```
#[instrument(skip_all, fields(plaintext_len = plaintext.len()))]
pub fn encrypt_field(plaintext: &str, key: &PublicKey) -> Result<String> {
    let mut rng = rand::thread_rng();
    let ciphertext = key
        .rsa()
        .encrypt(&mut rng, Pkcs1v15Encrypt, plaintext.as_bytes())
        .map_err(|e| IpcError::Crypto(format!("field encryption failed: {e}")))?;
    Ok(STANDARD.encode(ciphertext))
}

/// Decrypts a base64 ciphertext produced by [`encrypt_field`].
///
/// The plaintext is wiped from memory when the returned value is dropped.
///
/// # Errors
///
/// Returns [`IpcError::Crypto`] if the ciphertext is not valid base64, does not decrypt with
/// this key, or is not UTF-8.
pub fn decrypt_field(ciphertext_b64: &str, key: &PrivateKey) -> Result<Zeroizing<String>> {
    let ciphertext = STANDARD
        .decode(ciphertext_b64.trim())
        .map_err(|e| IpcError::Crypto(format!("ciphertext is not base64: {e}")))?;
    let plaintext = Zeroizing::new(
        key.rsa()
            .decrypt(Pkcs1v15Encrypt, &ciphertext)
            .map_err(|e| IpcError::Crypto(format!("field decryption failed: {e}")))?,
    );
    let text = std::str::from_utf8(&plaintext)
        .map_err(|_| IpcError::Crypto("decrypted field is not UTF-8".to_owned()))?;
    Ok(Zeroizing::new(text.to_owned()))
}
