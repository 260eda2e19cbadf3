//! Request signatures: RSA PKCS#1 v1.5 over SHA-256.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use rsa::{
    pkcs1v15::SigningKey,
    signature::{SignatureEncoding, Signer},
};
use sha2::Sha256;
use tracing::{debug, instrument};

use crate::{
    error::{IpcError, Result},
    params::{ParameterSet, SIGNATURE_FIELD},
    signing::{codec, keys::PrivateKey},
};

/// Signs canonical bytes and returns the base64 encoded detached signature.
///
/// The algorithm is fixed: RSA with PKCS#1 v1.5 padding over a SHA-256 digest.
///
/// # Errors
///
/// Returns [`IpcError::Crypto`] if the RSA operation fails.
///
/// # Examples
///
/// ```no_run
/// use ipc_sdk::signing::{codec, keys::PrivateKey, signer::sign};
///
/// # fn example() -> ipc_sdk::Result<()> {
/// let key = PrivateKey::from_pem_file("merchant_private.pem")?;
/// let canonical = codec::canonicalize_values(["X1", "10.00", "EUR"]);
/// let signature = sign(&canonical, &key)?;
/// # Ok(())
/// # }
/// ```
pub fn sign(canonical: &[u8], key: &PrivateKey) -> Result<String> {
    let signing_key = SigningKey::<Sha256>::new(key.rsa().clone());
    let signature = signing_key
        .try_sign(canonical)
        .map_err(|e| IpcError::Crypto(format!("RSA signing failed: {e}")))?;
    Ok(STANDARD.encode(signature.to_bytes()))
}

/// Signs parameter sets with the merchant private key.
///
/// Cheap to clone; the key is shared.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    key: Arc<PrivateKey>,
}

impl RequestSigner {
    /// Creates a signer for the given private key.
    #[must_use]
    pub fn new(key: PrivateKey) -> Self {
        Self { key: Arc::new(key) }
    }

    /// Creates a signer sharing an existing key.
    #[must_use]
    pub const fn from_shared(key: Arc<PrivateKey>) -> Self {
        Self { key }
    }

    /// Computes the signature over a parameter set.
    ///
    /// Any `Signature` field already present is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Crypto`] if signing fails.
    #[instrument(skip_all, fields(field_count = params.len()))]
    pub fn sign_params(&self, params: &ParameterSet) -> Result<String> {
        let canonical = codec::canonicalize(params);
        let signature = sign(&canonical, &self.key)?;
        debug!(canonical_len = canonical.len(), "parameter set signed");
        Ok(signature)
    }

    /// Returns a copy of `params` with `Signature` appended as the last field.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Crypto`] if signing fails.
    pub fn seal(&self, params: &ParameterSet) -> Result<ParameterSet> {
        let signature = self.sign_params(params)?;
        let mut sealed = params.clone();
        sealed.remove(SIGNATURE_FIELD);
        sealed.insert(SIGNATURE_FIELD, signature);
        Ok(sealed)
    }
}
