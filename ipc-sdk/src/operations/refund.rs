//! Refunds and reversals of earlier transactions.

use rust_decimal::Decimal;
use tracing::warn;

use super::{
    Operation, PARTNER_REQUIRED_VERSION, check_config, check_output_format, check_partner,
    check_required,
};
use crate::{
    config::IpcConfig,
    error::{IpcError, Result},
    request::RequestAssembler,
    response::{Response, ResponseFormat},
    validate::{is_valid_amount, is_valid_currency},
};

/// Refunds part or all of a transaction (`IPCRefund`).
///
/// The verified reply must echo the transaction reference, amount and currency with a success
/// status; anything else is reported as [`IpcError::InvalidResponse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refund {
    order_id: String,
    trn_ref: String,
    amount: Decimal,
    currency: String,
    output_format: ResponseFormat,
}

impl Refund {
    /// Refunds `amount` of `currency` from transaction `trn_ref` of order `order_id`.
    #[must_use]
    pub fn new(
        order_id: impl Into<String>,
        trn_ref: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            trn_ref: trn_ref.into(),
            amount,
            currency: currency.into(),
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

impl Operation for Refund {
    fn method(&self) -> &'static str {
        "IPCRefund"
    }

    fn output_format(&self) -> ResponseFormat {
        self.output_format
    }

    fn validate(&self, config: &IpcConfig) -> Result<()> {
        check_config(config)?;
        if self.amount.is_sign_negative() || !is_valid_amount(&self.amount.to_string()) {
            return Err(IpcError::Validation("Invalid Amount".to_owned()));
        }
        if !is_valid_currency(&self.currency) {
            return Err(IpcError::Validation("Invalid Currency".to_owned()));
        }
        check_required(&self.trn_ref, "Invalid TrnRef")?;
        check_required(&self.order_id, "Invalid OrderId")?;
        check_output_format(self.output_format)
    }

    fn write_fields(&self, _config: &IpcConfig, request: &mut RequestAssembler) -> Result<()> {
        request
            .add_field("Currency", &self.currency, false)?
            .add_field("Amount", self.amount, false)?
            .add_field("OrderID", &self.order_id, false)?
            .add_field("IPC_Trnref", &self.trn_ref, false)?
            .add_field("OutputFormat", self.output_format.as_str(), false)?;
        Ok(())
    }

    fn check_response(&self, response: &Response) -> Result<()> {
        let trn_ref_matches = response.get_str("ipc_trnref").is_some_and(|r| r == self.trn_ref);
        let amount_matches = response
            .get_str("amount")
            .and_then(|a| a.trim().parse::<Decimal>().ok())
            .is_some_and(|a| a == self.amount);
        let currency_matches = response.get_str("currency").is_some_and(|c| c == self.currency);

        if trn_ref_matches && amount_matches && currency_matches && response.is_success() {
            return Ok(());
        }
        warn!(
            trn_ref_matches,
            amount_matches,
            currency_matches,
            status = response.status(),
            "refund reply does not confirm the request"
        );
        Err(IpcError::InvalidResponse("refund was not confirmed by the gateway".to_owned()))
    }
}

/// Reverses an authorized transaction (`IPCReversal`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reversal {
    trn_ref: String,
    output_format: ResponseFormat,
}

impl Reversal {
    /// Reverses transaction `trn_ref`.
    #[must_use]
    pub fn new(trn_ref: impl Into<String>) -> Self {
        Self { trn_ref: trn_ref.into(), output_format: ResponseFormat::Json }
    }

    /// Asks for a different reply format.
    #[must_use]
    pub const fn with_output_format(mut self, format: ResponseFormat) -> Self {
        self.output_format = format;
        self
    }
}

impl Operation for Reversal {
    fn method(&self) -> &'static str {
        "IPCReversal"
    }

    fn output_format(&self) -> ResponseFormat {
        self.output_format
    }

    fn validate(&self, config: &IpcConfig) -> Result<()> {
        check_config(config)?;
        check_required(&self.trn_ref, "Invalid TrnRef")?;
        check_output_format(self.output_format)?;
        if config.version() == PARTNER_REQUIRED_VERSION {
            check_partner(config)?;
        }
        Ok(())
    }

    fn write_fields(&self, config: &IpcConfig, request: &mut RequestAssembler) -> Result<()> {
        request
            .add_field("IPC_Trnref", &self.trn_ref, false)?
            .add_field("OutputFormat", self.output_format.as_str(), false)?
            .add_field("ApplicationID", config.application_id().unwrap_or_default(), false)?
            .add_field("PartnerID", config.partner_id().unwrap_or_default(), false)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        operations::{
            assemble,
            test_support::{config, gateway, names},
        },
        response::ResponseEnvelope,
        signing::{codec, sign, verifier::flatten_values},
    };

    fn refund() -> Refund {
        Refund::new("ORDER-1", "TRN-9", Decimal::new(1000, 2), "EUR")
    }

    fn verified(fields: serde_json::Value) -> Response {
        let key = gateway();
        let mut map = fields.as_object().cloned().unwrap();
        let values = flatten_values(map.values());
        let canonical = codec::encode_joined(values.iter().map(String::as_str));
        map.insert("Signature".to_owned(), json!(sign(&canonical, &key).unwrap()));
        let envelope = ResponseEnvelope::from_fields(map, ResponseFormat::Json);
        crate::signing::verify_response(envelope, &key.public_key()).unwrap()
    }

    #[test]
    fn test_refund_field_order() {
        let request = assemble(&refund(), &config()).unwrap();
        assert_eq!(
            &names(&request)[7..],
            ["Currency", "Amount", "OrderID", "IPC_Trnref", "OutputFormat"]
        );
        assert_eq!(request.params().get("Amount"), Some("10.00"));
    }

    #[test]
    fn test_refund_validation_order() {
        let config = config();
        let bad_amount = Refund::new("", "", Decimal::new(1001, 3), "XXX");
        let bad_currency = Refund::new("", "", Decimal::ONE, "XXX");
        let bad_trn_ref = Refund::new("", "", Decimal::ONE, "EUR");
        let bad_order = Refund::new("", "T", Decimal::ONE, "EUR");

        for (op, expected) in [
            (bad_amount, "Invalid Amount"),
            (bad_currency, "Invalid Currency"),
            (bad_trn_ref, "Invalid TrnRef"),
            (bad_order, "Invalid OrderId"),
        ] {
            let err = op.validate(&config).unwrap_err();
            assert!(matches!(&err, IpcError::Validation(msg) if msg == expected), "{err}");
        }
        assert!(refund().validate(&config).is_ok());
    }

    #[test]
    fn test_refund_rejects_negative_amount() {
        let negative = Refund::new("ORDER-1", "TRN-9", Decimal::new(-1000, 2), "EUR");
        let err = negative.validate(&config()).unwrap_err();
        assert!(matches!(&err, IpcError::Validation(msg) if msg == "Invalid Amount"), "{err}");
        assert!(is_valid_amount("-10.00"));
    }

    #[test]
    fn test_refund_confirmed() {
        let response = verified(json!({
            "Status": 0,
            "IPC_Trnref": "TRN-9",
            "Amount": "10.00",
            "Currency": "EUR",
        }));
        assert!(refund().check_response(&response).is_ok());

        let numeric_amount = verified(json!({
            "Status": "0",
            "IPC_Trnref": "TRN-9",
            "Amount": 10,
            "Currency": "EUR",
        }));
        assert!(refund().check_response(&numeric_amount).is_ok());
    }

    #[test]
    fn test_refund_not_confirmed() {
        for fields in [
            json!({"Status": 0, "IPC_Trnref": "TRN-8", "Amount": "10.00", "Currency": "EUR"}),
            json!({"Status": 0, "IPC_Trnref": "TRN-9", "Amount": "9.99", "Currency": "EUR"}),
            json!({"Status": 0, "IPC_Trnref": "TRN-9", "Amount": "10.00", "Currency": "BGN"}),
            json!({"Status": 3, "IPC_Trnref": "TRN-9", "Amount": "10.00", "Currency": "EUR"}),
            json!({"Status": 0, "Amount": "10.00", "Currency": "EUR"}),
        ] {
            let result = refund().check_response(&verified(fields));
            assert!(matches!(result, Err(IpcError::InvalidResponse(_))));
        }
    }

    #[test]
    fn test_reversal_fields() {
        let config = config().with_partner("P-1", "A-1");
        let request = assemble(&Reversal::new("TRN-9"), &config).unwrap();
        assert_eq!(
            &names(&request)[7..],
            ["IPC_Trnref", "OutputFormat", "ApplicationID", "PartnerID"]
        );
        assert_eq!(request.params().get("PartnerID"), Some("P-1"));
    }

    #[test]
    fn test_reversal_partner_required_on_new_version() {
        assert!(Reversal::new("TRN-9").validate(&config()).is_ok());

        let config = config().with_version(PARTNER_REQUIRED_VERSION);
        let err = Reversal::new("TRN-9").validate(&config).unwrap_err();
        assert!(matches!(err, IpcError::Validation(msg) if msg.contains("Partner ID")));
    }
}
