//! In-app purchase with card details (`IPCIAPurchase`).

use super::{
    Card, Cart, Operation, PARTNER_REQUIRED_VERSION, check_config, check_output_format,
    check_partner, check_required,
};
use crate::{
    config::IpcConfig,
    error::{IpcError, Result},
    request::RequestAssembler,
    response::ResponseFormat,
    validate::is_valid_currency,
};

/// Charges a card for the contents of a cart.
///
/// PAN, expiry date and CVC are encrypted with the gateway key before signing. A tokenized
/// card sends only `CardToken`.
#[derive(Debug, Clone)]
pub struct IaPurchase {
    order_id: String,
    currency: String,
    card: Card,
    cart: Cart,
    account_settlement: Option<String>,
    note: Option<String>,
    output_format: ResponseFormat,
}

impl IaPurchase {
    /// Creates a purchase; the amount is the cart total.
    #[must_use]
    pub fn new(
        order_id: impl Into<String>,
        currency: impl Into<String>,
        card: Card,
        cart: Cart,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            currency: currency.into(),
            card,
            cart,
            account_settlement: None,
            note: None,
            output_format: ResponseFormat::Json,
        }
    }

    /// Settles into a specific merchant account.
    #[must_use]
    pub fn with_account_settlement(mut self, account: impl Into<String>) -> Self {
        self.account_settlement = Some(account.into());
        self
    }

    /// Free-text note shown to the merchant.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Asks for a different reply format.
    #[must_use]
    pub const fn with_output_format(mut self, format: ResponseFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Cart being paid.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }
}

impl Operation for IaPurchase {
    fn method(&self) -> &'static str {
        "IPCIAPurchase"
    }

    fn output_format(&self) -> ResponseFormat {
        self.output_format
    }

    fn validate(&self, config: &IpcConfig) -> Result<()> {
        check_required(&self.order_id, "Invalid OrderId")?;
        if !is_valid_currency(&self.currency) {
            return Err(IpcError::Validation("Invalid Currency".to_owned()));
        }
        check_config(config)?;
        if self.cart.is_empty() {
            return Err(IpcError::Validation("Missing Cart details".to_owned()));
        }
        self.cart.validate().map_err(|e| prefixed("Invalid Cart details", e))?;
        self.card.validate().map_err(|e| prefixed("Invalid Card details", e))?;
        check_output_format(self.output_format)?;
        if config.version() == PARTNER_REQUIRED_VERSION {
            check_partner(config)?;
        }
        Ok(())
    }

    fn write_fields(&self, config: &IpcConfig, request: &mut RequestAssembler) -> Result<()> {
        request
            .add_field("OrderID", &self.order_id, false)?
            .add_field("Amount", self.cart.total(), false)?
            .add_field("Currency", &self.currency, false)?;

        if let Some(token) = self.card.token() {
            request.add_field("CardToken", token, false)?;
        } else {
            let card_type =
                self.card.card_type().map_or_else(String::new, |t| t.code().to_string());
            request
                .add_field("CardType", card_type, false)?
                .add_field("PAN", self.card.number(), true)?
                .add_field("CardholderName", self.card.holder(), false)?
                .add_field("ExpDate", self.card.exp_date().as_str(), true)?
                .add_field("CVC", self.card.cvc(), true)?
                .add_field("ECI", self.card.eci().unwrap_or_default(), false)?
                .add_field("AVV", self.card.avv().unwrap_or_default(), false)?
                .add_field("XID", self.card.xid().unwrap_or_default(), false)?;
        }

        let settlement = self.account_settlement.as_deref().unwrap_or_default();
        request
            .add_field("AccountSettlement", settlement, false)?
            .add_field("Note", self.note.as_deref().unwrap_or_default(), false)?
            .add_field("OutputFormat", self.output_format.as_str(), false)?
            .add_field("CartItems", self.cart.len().to_string(), false)?;

        for (index, item) in self.cart.items().iter().enumerate() {
            let n = index + 1;
            request
                .add_field(&format!("Article_{n}"), &item.name, false)?
                .add_field(&format!("Quantity_{n}"), item.quantity, false)?
                .add_field(&format!("Price_{n}"), item.price, false)?
                .add_field(&format!("Amount_{n}"), item.amount(), false)?
                .add_field(&format!("Currency_{n}"), &self.currency, false)?;
        }

        request
            .add_field("ApplicationID", config.application_id().unwrap_or_default(), false)?
            .add_field("PartnerID", config.partner_id().unwrap_or_default(), false)?;
        Ok(())
    }
}

fn prefixed(prefix: &str, error: IpcError) -> IpcError {
    match error {
        IpcError::Validation(msg) => IpcError::Validation(format!("{prefix}: {msg}")),
        other => other,
    }
}
