//! Request signing, response verification and field encryption.
//!
//! Every outbound request is signed with the merchant's RSA private key over a canonical string
//! built from the field values ([`codec`]). Every gateway response is verified with the
//! gateway's public key before any field is returned to the caller ([`verifier`]). Card data is
//! encrypted with the gateway's public key before it is signed ([`encrypt`]).
//!
//! # Examples
//!
//! ```no_run
//! use ipc_sdk::{
//!     params::ParameterSet,
//!     signing::{KeyMaterial, PrivateKey, PublicKey, SigningContext},
//! };
//!
//! # fn example() -> ipc_sdk::Result<()> {
//! let keys = KeyMaterial::default()
//!     .with_signing_key(PrivateKey::from_pem_file("merchant_private.pem")?)
//!     .with_verification_key(PublicKey::from_pem_file("gateway_cert.pem")?);
//! let context = SigningContext::new(keys, 1);
//!
//! let params: ParameterSet = [("OrderID", "X1"), ("Amount", "10.00")].into_iter().collect();
//! let sealed = context.signer()?.seal(&params)?;
//! assert!(sealed.is_signed());
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod encrypt;
pub mod keys;
pub mod signer;
pub mod verifier;

use std::sync::Arc;

pub use keys::{KeyMaterial, PrivateKey, PublicKey};
pub use signer::{RequestSigner, sign};
pub use verifier::{verify, verify_response};

use crate::{
    error::Result,
    response::{Response, ResponseEnvelope},
};

/// Keys plus the index under which the gateway knows the merchant's key pair.
///
/// Cheap to clone and immutable; rotate keys by building a new context.
#[derive(Debug, Clone)]
pub struct SigningContext {
    keys: Arc<KeyMaterial>,
    key_index: u32,
}

impl SigningContext {
    /// Creates a context from loaded keys.
    #[must_use]
    pub fn new(keys: KeyMaterial, key_index: u32) -> Self {
        Self { keys: Arc::new(keys), key_index }
    }

    /// Key material shared by this context.
    #[must_use]
    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    /// Index of the merchant key pair registered with the gateway.
    #[must_use]
    pub const fn key_index(&self) -> u32 {
        self.key_index
    }

    /// Signer bound to the merchant private key.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Key`](crate::IpcError::Key) if no private key is configured.
    pub fn signer(&self) -> Result<RequestSigner> {
        Ok(RequestSigner::from_shared(self.keys.shared_signing_key()?))
    }

    /// Encrypts a sensitive field with the encryption key.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Key`](crate::IpcError::Key) if no encryption key is configured, or
    /// [`IpcError::Crypto`](crate::IpcError::Crypto) if encryption fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        encrypt::encrypt_field(plaintext, self.keys.encryption_key()?)
    }

    /// Verifies a gateway response with the verification key.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Key`](crate::IpcError::Key) if no verification key is configured,
    /// otherwise the errors of [`verify_response`].
    pub fn verify_response(&self, envelope: ResponseEnvelope) -> Result<Response> {
        verifier::verify_response(envelope, self.keys.verification_key()?)
    }
}

#[cfg(test)]
mod tests {
    mod proptest_signatures;

    use super::*;
    use crate::{error::IpcError, params::ParameterSet};

    const MERCHANT_PRIVATE: &str = include_str!("../../tests/fixtures/merchant_private.pem");

    #[test]
    fn test_context_without_keys() {
        let context = SigningContext::new(KeyMaterial::default(), 1);
        assert!(matches!(context.signer(), Err(IpcError::Key(_))));
        assert!(matches!(context.encrypt("123"), Err(IpcError::Key(_))));
    }

    #[test]
    fn test_context_signs_with_merchant_key() {
        let key = PrivateKey::from_pem(MERCHANT_PRIVATE).unwrap();
        let keys = KeyMaterial::default().with_signing_key(key);
        let context = SigningContext::new(keys, 3);
        let params: ParameterSet = [("A", "1")].into_iter().collect();

        let signature = context.signer().unwrap().sign_params(&params).unwrap();
        let public = context.keys().signing_key().unwrap().public_key();
        assert!(verify(&codec::canonicalize(&params), &signature, &public));
        assert_eq!(context.key_index(), 3);
    }
}
