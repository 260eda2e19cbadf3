//! Error types for the IPC SDK.
//!
//! This module defines every error that can surface from building, signing, sending or
//! verifying an IPC request. All errors implement [`std::error::Error`] via
//! [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Input errors** ([`IpcError::Validation`]): a field failed a validator before signing
//! - **Key errors** ([`IpcError::Key`]): key material missing or unparsable
//! - **Trust errors** ([`IpcError::MissingSignature`], [`IpcError::SignatureMismatch`]):
//!   the gateway response cannot be trusted
//! - **Network errors** ([`IpcError::Http`], [`IpcError::Transport`]): communication failures
//! - **Protocol errors** ([`IpcError::InvalidResponse`]): the response was verified but does not
//!   match the request
//!
//! # Examples
//!
//! ```
//! use ipc_sdk::error::{IpcError, Result};
//!
//! fn require_order_id(order_id: &str) -> Result<&str> {
//!     if order_id.is_empty() {
//!         return Err(IpcError::Validation("Invalid OrderId".to_owned()));
//!     }
//!     Ok(order_id)
//! }
//! # assert!(require_order_id("").is_err());
//! ```

use thiserror::Error;

/// Result type alias for IPC operations.
pub type Result<T> = std::result::Result<T, IpcError>;

/// Errors that can occur while talking to the IPC gateway.
///
/// # Error Recovery
///
/// - **Validation errors** ([`Validation`](Self::Validation)): fix the input and retry
/// - **Key errors** ([`Key`](Self::Key), [`Config`](Self::Config)): fix the configuration; retrying
///   without a configuration change will fail again
/// - **Trust errors** ([`MissingSignature`](Self::MissingSignature),
///   [`SignatureMismatch`](Self::SignatureMismatch)): never act on the response data
/// - **Transient errors** ([`Http`](Self::Http)): retry policy belongs to the caller
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum IpcError {
    /// A request field failed validation before signing.
    ///
    /// No network call has been made when this error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use ipc_sdk::error::IpcError;
    ///
    /// let err = IpcError::Validation("Invalid Amount".to_owned());
    /// assert_eq!(err.to_string(), "Validation failed: Invalid Amount");
    /// ```
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Private, public or encryption key is missing or cannot be parsed.
    ///
    /// # Recovery
    ///
    /// Check the PEM files referenced by the configuration. Private keys are accepted as
    /// PKCS#1 or PKCS#8; public keys as SPKI, PKCS#1 or an X.509 certificate.
    #[error("Key error: {0}")]
    Key(String),

    /// The gateway response carried no `Signature` field.
    #[error("Missing response signature")]
    MissingSignature,

    /// The gateway response signature did not verify against the gateway public key.
    #[error("Response signature check failed")]
    SignatureMismatch,

    /// Transport layer misuse or configuration problem.
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP request failed.
    ///
    /// Wraps [`reqwest::Error`]: timeouts, connection failures, TLS errors.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be parsed, or a verified response does not match the request.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration is incomplete or malformed.
    #[error("Invalid config: {0}")]
    Config(String),

    /// A low-level cryptographic operation failed (encryption, signing, decoding).
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

impl IpcError {
    /// Returns `true` when the response must not be trusted for any business decision.
    ///
    /// # Examples
    ///
    /// ```
    /// use ipc_sdk::error::IpcError;
    ///
    /// assert!(IpcError::MissingSignature.is_untrusted_response());
    /// assert!(IpcError::SignatureMismatch.is_untrusted_response());
    /// assert!(!IpcError::Validation("x".into()).is_untrusted_response());
    /// ```
    #[must_use]
    pub const fn is_untrusted_response(&self) -> bool {
        matches!(self, Self::MissingSignature | Self::SignatureMismatch)
    }
}
