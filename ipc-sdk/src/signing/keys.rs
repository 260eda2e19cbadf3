//! RSA key material.
//!
//! Three independent keys take part in the protocol:
//!
//! - the merchant's **private signing key** (outbound signatures),
//! - the gateway's **public verification key** (inbound signatures),
//! - a **public encryption key** for sensitive card fields (often the same key as the
//!   verification key).
//!
//! Keys are parsed once and never mutated. Share them with [`Arc`] and publish a fresh
//! [`KeyMaterial`] to rotate keys.

use std::{fmt, path::Path, sync::Arc};

use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey},
    pkcs8::{DecodePrivateKey, DecodePublicKey},
    traits::PublicKeyParts,
};
use tracing::debug;
use x509_cert::{
    Certificate,
    der::{DecodePem, Encode},
};

use crate::error::{IpcError, Result};

/// Merchant private key used for request signatures.
#[derive(Clone)]
pub struct PrivateKey {
    inner: RsaPrivateKey,
}

impl PrivateKey {
    /// Parses a PEM encoded RSA private key (`RSA PRIVATE KEY` or `PRIVATE KEY`).
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Key`] if the PEM is not an RSA private key.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pem = pem.trim();
        let inner = if pem.contains("BEGIN RSA PRIVATE KEY") {
            RsaPrivateKey::from_pkcs1_pem(pem)
                .map_err(|e| IpcError::Key(format!("invalid PKCS#1 private key: {e}")))?
        } else {
            RsaPrivateKey::from_pkcs8_pem(pem)
                .map_err(|e| IpcError::Key(format!("invalid PKCS#8 private key: {e}")))?
        };
        debug!(bits = inner.size() * 8, "loaded private key");
        Ok(Self { inner })
    }

    /// Reads and parses a PEM private key file.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Key`] if the file cannot be read or parsed.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_pem(&read_pem(path.as_ref())?)
    }

    /// Returns the matching public key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey { inner: self.inner.to_public_key() }
    }

    pub(crate) const fn rsa(&self) -> &RsaPrivateKey {
        &self.inner
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey").field("bits", &(self.inner.size() * 8)).finish_non_exhaustive()
    }
}

/// Gateway public key used for response verification or field encryption.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: RsaPublicKey,
}

impl PublicKey {
    /// Parses a PEM encoded RSA public key.
    ///
    /// Accepts `PUBLIC KEY` (SPKI), `RSA PUBLIC KEY` (PKCS#1) and `CERTIFICATE` (X.509, the form
    /// the gateway distributes its key in).
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Key`] if the PEM holds no usable RSA public key.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pem = pem.trim();
        let inner = if pem.contains("BEGIN CERTIFICATE") {
            Self::from_certificate_pem(pem)?
        } else if pem.contains("BEGIN RSA PUBLIC KEY") {
            RsaPublicKey::from_pkcs1_pem(pem)
                .map_err(|e| IpcError::Key(format!("invalid PKCS#1 public key: {e}")))?
        } else {
            RsaPublicKey::from_public_key_pem(pem)
                .map_err(|e| IpcError::Key(format!("invalid public key: {e}")))?
        };
        debug!(bits = inner.size() * 8, "loaded public key");
        Ok(Self { inner })
    }

    /// Reads and parses a PEM public key or certificate file.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Key`] if the file cannot be read or parsed.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_pem(&read_pem(path.as_ref())?)
    }

    fn from_certificate_pem(pem: &str) -> Result<RsaPublicKey> {
        let certificate = Certificate::from_pem(pem)
            .map_err(|e| IpcError::Key(format!("invalid certificate: {e}")))?;
        let spki = certificate
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| IpcError::Key(format!("invalid certificate public key: {e}")))?;
        RsaPublicKey::from_public_key_der(&spki)
            .map_err(|e| IpcError::Key(format!("certificate does not hold an RSA key: {e}")))
    }

    pub(crate) const fn rsa(&self) -> &RsaPublicKey {
        &self.inner
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey").field("bits", &(self.inner.size() * 8)).finish()
    }
}

fn read_pem(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| IpcError::Key(format!("cannot read key file {}: {e}", path.display())))
}

/// Immutable set of keys held by the configuration.
///
/// Every key is optional at construction; the operation that needs a missing key fails with
/// [`IpcError::Key`].
#[derive(Debug, Clone, Default)]
pub struct KeyMaterial {
    signing_key: Option<Arc<PrivateKey>>,
    verification_key: Option<Arc<PublicKey>>,
    encryption_key: Option<Arc<PublicKey>>,
}

impl KeyMaterial {
    /// Creates key material from already parsed keys.
    #[must_use]
    pub fn new(
        signing_key: Option<PrivateKey>,
        verification_key: Option<PublicKey>,
        encryption_key: Option<PublicKey>,
    ) -> Self {
        Self {
            signing_key: signing_key.map(Arc::new),
            verification_key: verification_key.map(Arc::new),
            encryption_key: encryption_key.map(Arc::new),
        }
    }

    /// Returns a copy with the private signing key replaced.
    #[must_use]
    pub fn with_signing_key(mut self, key: PrivateKey) -> Self {
        self.signing_key = Some(Arc::new(key));
        self
    }

    /// Returns a copy with the gateway verification key replaced.
    #[must_use]
    pub fn with_verification_key(mut self, key: PublicKey) -> Self {
        self.verification_key = Some(Arc::new(key));
        self
    }

    /// Returns a copy with the encryption key replaced.
    #[must_use]
    pub fn with_encryption_key(mut self, key: PublicKey) -> Self {
        self.encryption_key = Some(Arc::new(key));
        self
    }

    /// Private signing key.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Key`] if no private key is configured.
    pub fn signing_key(&self) -> Result<&PrivateKey> {
        self.signing_key
            .as_deref()
            .ok_or_else(|| IpcError::Key("private signing key is not configured".to_owned()))
    }

    pub(crate) fn shared_signing_key(&self) -> Result<Arc<PrivateKey>> {
        self.signing_key
            .clone()
            .ok_or_else(|| IpcError::Key("private signing key is not configured".to_owned()))
    }

    /// Gateway public verification key.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Key`] if no verification key is configured.
    pub fn verification_key(&self) -> Result<&PublicKey> {
        self.verification_key
            .as_deref()
            .ok_or_else(|| IpcError::Key("gateway public key is not configured".to_owned()))
    }

    /// Public encryption key for sensitive fields.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Key`] if no encryption key is configured.
    pub fn encryption_key(&self) -> Result<&PublicKey> {
        self.encryption_key
            .as_deref()
            .ok_or_else(|| IpcError::Key("encryption public key is not configured".to_owned()))
    }

    /// Returns `true` when a private signing key is present.
    #[must_use]
    pub const fn has_signing_key(&self) -> bool {
        self.signing_key.is_some()
    }
}
