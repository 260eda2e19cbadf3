//! Gateway operations.
//!
//! Each operation is a small struct implementing [`Operation`]: it validates its own inputs
//! against an [`IpcConfig`], writes its fields in the order the gateway signs them and may
//! check the verified response against the request. [`IpcClient`](crate::client::IpcClient)
//! drives the rest.
//!
//! # Examples
//!
//! ```no_run
//! use ipc_sdk::{
//!     client::IpcClient,
//!     config::IpcConfig,
//!     operations::GetTxnStatus,
//! };
//!
//! # async fn example() -> ipc_sdk::Result<()> {
//! let config = IpcConfig::from_file("ipc.toml")?;
//! let client = IpcClient::new(config)?;
//! let response = client.execute(&GetTxnStatus::new("ORDER-1")).await?;
//! println!("status {:?}", response.status());
//! # Ok(())
//! # }
//! ```

mod card;
mod cart;
mod mandate;
mod purchase;
mod refund;
mod status;

use std::fmt;

pub use card::{Card, CardType};
pub use cart::{Cart, CartItem, CartItemType};
pub use mandate::{MandateAction, MandateManagement};
pub use purchase::IaPurchase;
pub use refund::{Refund, Reversal};
pub use status::{GetPaymentStatus, GetTxnLog, GetTxnStatus};

use crate::{
    config::IpcConfig,
    error::{IpcError, Result},
    request::RequestAssembler,
    response::{Response, ResponseFormat},
};

/// Protocol version from which partner and application ids are mandatory for some methods.
pub const PARTNER_REQUIRED_VERSION: &str = "1.4.1";

/// A single gateway method.
///
/// Implementations never perform I/O; they only describe the request and, optionally, judge
/// the verified response.
pub trait Operation: Send + Sync {
    /// Value of the `IPCmethod` field.
    fn method(&self) -> &'static str;

    /// Format the gateway is asked to reply in.
    fn output_format(&self) -> ResponseFormat;

    /// Checks configuration and inputs before anything is signed.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Validation`] naming the first invalid input.
    fn validate(&self, config: &IpcConfig) -> Result<()>;

    /// Writes the method-specific fields after the common header.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Key`] or [`IpcError::Crypto`] if a sensitive field cannot be
    /// encrypted.
    fn write_fields(&self, config: &IpcConfig, request: &mut RequestAssembler) -> Result<()>;

    /// Checks a verified response against the request.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::InvalidResponse`] if the response contradicts the request.
    fn check_response(&self, _response: &Response) -> Result<()> {
        Ok(())
    }
}

/// Writes the fields every request starts with.
///
/// # Errors
///
/// Never fails for plain text fields; the `Result` follows [`RequestAssembler::add_field`].
pub fn write_header(
    method: &str,
    config: &IpcConfig,
    request: &mut RequestAssembler,
) -> Result<()> {
    request
        .add_field("IPCmethod", method, false)?
        .add_field("IPCVersion", config.version(), false)?
        .add_field("IPCLanguage", config.language(), false)?
        .add_field("SID", config.sid(), false)?
        .add_field("WalletNumber", config.wallet(), false)?
        .add_field("KeyIndex", config.key_index(), false)?
        .add_field("Source", config.source(), false)?;
    Ok(())
}

/// Assembles the full unsigned request for `operation`: header first, then its own fields.
///
/// # Errors
///
/// Same as [`Operation::write_fields`].
pub fn assemble<O: Operation + ?Sized>(
    operation: &O,
    config: &IpcConfig,
) -> Result<RequestAssembler> {
    let mut request = RequestAssembler::new(config.signing().clone());
    write_header(operation.method(), config, &mut request)?;
    operation.write_fields(config, &mut request)?;
    Ok(request)
}

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Inputs not checked yet.
    Unvalidated,
    /// Inputs and configuration passed validation.
    Validated,
    /// Request signed and posted.
    Sent,
    /// Response signature verified.
    Verified,
    /// Response missing, unsigned or with a bad signature.
    VerificationFailed,
    /// Request never reached the gateway or got no usable reply.
    TransportError,
}

impl OperationState {
    /// Returns `true` for states that end the lifecycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Verified | Self::VerificationFailed | Self::TransportError)
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unvalidated => "unvalidated",
            Self::Validated => "validated",
            Self::Sent => "sent",
            Self::Verified => "verified",
            Self::VerificationFailed => "verification_failed",
            Self::TransportError => "transport_error",
        })
    }
}

/// Validates the configuration, reporting problems as input errors.
pub(crate) fn check_config(config: &IpcConfig) -> Result<()> {
    config.validate().map_err(|e| {
        let detail = match e {
            IpcError::Config(msg) => msg,
            other => other.to_string(),
        };
        IpcError::Validation(format!("Invalid Config details: {detail}"))
    })
}

/// JSON or XML only; the gateway never replies form-encoded to API calls.
pub(crate) fn check_output_format(format: ResponseFormat) -> Result<()> {
    match format {
        ResponseFormat::Json | ResponseFormat::Xml => Ok(()),
        ResponseFormat::Post => Err(IpcError::Validation("Invalid Output format".to_owned())),
    }
}

pub(crate) fn check_partner(config: &IpcConfig) -> Result<()> {
    if config.partner_id().is_none_or(str::is_empty) {
        return Err(IpcError::Validation("Required parameter: Partner ID".to_owned()));
    }
    if config.application_id().is_none_or(str::is_empty) {
        return Err(IpcError::Validation("Required parameter: Application ID".to_owned()));
    }
    Ok(())
}

pub(crate) fn check_required(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(IpcError::Validation(message.to_owned()));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::{test_support::config, *};

    #[test]
    fn test_header_order() {
        let config = config();
        let request = assemble(&GetTxnStatus::new("X1"), &config).unwrap();
        let params = request.params();
        let header: Vec<(&str, &str)> = params.iter().take(7).collect();
        assert_eq!(
            header,
            [
                ("IPCmethod", "IPCGetTxnStatus"),
                ("IPCVersion", "1.4"),
                ("IPCLanguage", "EN"),
                ("SID", "000000000000010"),
                ("WalletNumber", "61938166610"),
                ("KeyIndex", "1"),
                ("Source", config.source()),
            ]
        );
    }

    #[test]
    fn test_check_config_wraps_message() {
        let config = IpcConfig::new(
            "https://gateway.example.com",
            "abc",
            "1",
            test_support::config().signing().clone(),
        );
        let expected = "Invalid Config details: Invalid SID";
        let err = check_config(&config).unwrap_err();
        assert!(matches!(&err, IpcError::Validation(msg) if msg == expected));
    }

    #[test]
    fn test_post_output_format_rejected() {
        assert!(check_output_format(ResponseFormat::Json).is_ok());
        assert!(check_output_format(ResponseFormat::Xml).is_ok());
        assert!(matches!(check_output_format(ResponseFormat::Post), Err(IpcError::Validation(_))));
    }

    #[test]
    fn test_partner_required() {
        let err = check_partner(&config()).unwrap_err();
        assert!(matches!(err, IpcError::Validation(msg) if msg.contains("Partner ID")));
        assert!(check_partner(&config().with_partner("p1", "a1")).is_ok());
    }

    #[test]
    fn test_operation_state() {
        assert!(!OperationState::Sent.is_terminal());
        assert!(OperationState::Verified.is_terminal());
        assert_eq!(OperationState::VerificationFailed.to_string(), "verification_failed");
    }
}
