//! Request assembly.
//!
//! [`RequestAssembler`] collects fields in wire order, normalizes or encrypts each value as it
//! is added and signs the result once on [`finalize`](RequestAssembler::finalize).

use tracing::{debug, instrument};

use crate::{
    error::Result,
    params::{FieldValue, ParameterSet, SIGNATURE_FIELD},
    signing::{SigningContext, codec},
};

/// Builds the signed parameter set for one request.
///
/// # Examples
///
/// ```no_run
/// use ipc_sdk::{request::RequestAssembler, signing::SigningContext};
///
/// # fn example(context: &SigningContext) -> ipc_sdk::Result<()> {
/// let mut request = RequestAssembler::new(context.clone());
/// request.add_field("OrderID", "X1", false)?;
/// request.add_field("Amount", "10.00", false)?;
/// request.add_field("CardNumber", "4111111111111111", true)?;
///
/// let params = request.finalize()?;
/// assert_eq!(params.iter().last().map(|(name, _)| name), Some("Signature"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RequestAssembler {
    context: SigningContext,
    params: ParameterSet,
}

impl RequestAssembler {
    /// Starts an empty request signed with `context`.
    #[must_use]
    pub fn new(context: SigningContext) -> Self {
        Self { context, params: ParameterSet::new() }
    }

    /// Adds or replaces a field.
    ///
    /// Plain values are stored in escaped form (`&` becomes `&amp;`, and so on) without
    /// double-escaping. With `encrypt` set, the value is encrypted with the gateway key and the
    /// base64 ciphertext is stored and later signed.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Key`](crate::IpcError::Key) if `encrypt` is set but no encryption
    /// key is configured, or [`IpcError::Crypto`](crate::IpcError::Crypto) if encryption fails.
    pub fn add_field(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
        encrypt: bool,
    ) -> Result<&mut Self> {
        let wire = value.into().to_wire();
        let stored = if encrypt { self.context.encrypt(&wire)? } else { codec::normalize(&wire) };
        self.params.insert(name, stored);
        Ok(self)
    }

    /// Adds a field only when a value is present.
    ///
    /// # Errors
    ///
    /// Same as [`add_field`](Self::add_field).
    pub fn add_optional<V: Into<FieldValue>>(
        &mut self,
        name: &str,
        value: Option<V>,
        encrypt: bool,
    ) -> Result<&mut Self> {
        match value {
            Some(value) => self.add_field(name, value, encrypt),
            None => Ok(self),
        }
    }

    /// Fields added so far, unsigned.
    #[must_use]
    pub const fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Signs the current fields and returns them with `Signature` appended last.
    ///
    /// A `Signature` added earlier is dropped before signing.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Key`](crate::IpcError::Key) if no private key is configured, or
    /// [`IpcError::Crypto`](crate::IpcError::Crypto) if signing fails.
    #[instrument(skip_all, fields(field_count = self.params.len()))]
    pub fn finalize(&self) -> Result<ParameterSet> {
        let mut unsigned = self.params.clone();
        unsigned.remove(SIGNATURE_FIELD);
        let sealed = self.context.signer()?.seal(&unsigned)?;
        debug!("request finalized");
        Ok(sealed)
    }
}
