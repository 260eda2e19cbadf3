//! Direct debit mandates.

use super::{Operation, check_config, check_output_format, check_partner, check_required};
use crate::{
    config::IpcConfig,
    error::Result,
    request::RequestAssembler,
    response::ResponseFormat,
};

/// What to do with a mandate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MandateAction {
    /// Register a new mandate.
    Register = 1,
    /// Cancel an existing mandate.
    Cancel = 2,
}

impl MandateAction {
    /// Numeric code sent as `Action`.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// Registers or cancels a customer mandate (`IPCMandateManagement`).
///
/// Partner and application ids are required regardless of protocol version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MandateManagement {
    mandate_reference: String,
    customer_wallet: String,
    action: MandateAction,
    mandate_text: String,
    output_format: ResponseFormat,
}

impl MandateManagement {
    /// Creates a mandate request for `customer_wallet`.
    #[must_use]
    pub fn new(
        mandate_reference: impl Into<String>,
        customer_wallet: impl Into<String>,
        action: MandateAction,
        mandate_text: impl Into<String>,
    ) -> Self {
        Self {
            mandate_reference: mandate_reference.into(),
            customer_wallet: customer_wallet.into(),
            action,
            mandate_text: mandate_text.into(),
            output_format: ResponseFormat::Json,
        }
    }

    /// Asks for a different reply format.
    #[must_use]
    pub const fn with_output_format(mut self, format: ResponseFormat) -> Self {
        self.output_format = format;
        self
    }
}

impl Operation for MandateManagement {
    fn method(&self) -> &'static str {
        "IPCMandateManagement"
    }

    fn output_format(&self) -> ResponseFormat {
        self.output_format
    }

    fn validate(&self, config: &IpcConfig) -> Result<()> {
        check_config(config)?;
        check_required(&self.mandate_reference, "Invalid Mandate Reference")?;
        check_required(&self.customer_wallet, "Invalid Customer Wallet Number")?;
        check_output_format(self.output_format)?;
        check_partner(config)
    }

    fn write_fields(&self, config: &IpcConfig, request: &mut RequestAssembler) -> Result<()> {
        request
            .add_field("MandateReference", &self.mandate_reference, false)?
            .add_field("CustomerWalletNumber", &self.customer_wallet, false)?
            .add_field("Action", self.action.code(), false)?
            .add_field("MandateText", &self.mandate_text, false)?
            .add_field("OutputFormat", self.output_format.as_str(), false)?
            .add_field("ApplicationID", config.application_id().unwrap_or_default(), false)?
            .add_field("PartnerID", config.partner_id().unwrap_or_default(), false)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::IpcError,
        operations::{
            assemble,
            test_support::{config, names},
        },
    };

    fn mandate() -> MandateManagement {
        MandateManagement::new("MR-1", "40000000001", MandateAction::Cancel, "Gym & Spa")
    }

    #[test]
    fn test_fields_in_order() {
        let config = config().with_partner("P-1", "A-1");
        mandate().validate(&config).unwrap();

        let request = assemble(&mandate(), &config).unwrap();
        assert_eq!(
            &names(&request)[7..],
            [
                "MandateReference",
                "CustomerWalletNumber",
                "Action",
                "MandateText",
                "OutputFormat",
                "ApplicationID",
                "PartnerID",
            ]
        );
        assert_eq!(request.params().get("Action"), Some("2"));
        assert_eq!(request.params().get("MandateText"), Some("Gym &amp; Spa"));
    }

    #[test]
    fn test_partner_always_required() {
        let err = mandate().validate(&config()).unwrap_err();
        assert!(
            matches!(err, IpcError::Validation(msg) if msg == "Required parameter: Partner ID")
        );

        let config = config().with_partner("P-1", "");
        let err = mandate().validate(&config).unwrap_err();
        assert!(
            matches!(err, IpcError::Validation(msg) if msg == "Required parameter: Application ID")
        );
    }
}
