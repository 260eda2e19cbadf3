//! Card details for purchases.

use std::fmt;

use zeroize::Zeroizing;

use crate::{
    error::{IpcError, Result},
    validate::{is_valid_card_number, is_valid_cvc, is_valid_exp_month, is_valid_exp_year},
};

/// Card scheme codes understood by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    /// Mastercard.
    Mastercard = 1,
    /// Maestro.
    Maestro = 2,
    /// Visa.
    Visa = 3,
    /// Visa Electron.
    VisaElectron = 4,
    /// V Pay.
    VPay = 5,
    /// JCB.
    Jcb = 6,
}

impl CardType {
    /// Numeric code sent as `CardType`.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// Card data, either a stored token or the full PAN with expiry and CVC.
///
/// PAN, expiry and CVC are wiped from memory on drop and never appear in `Debug` output.
#[derive(Clone, Default)]
pub struct Card {
    card_type: Option<CardType>,
    number: Zeroizing<String>,
    holder: String,
    exp_month: Zeroizing<String>,
    exp_year: Zeroizing<String>,
    cvc: Zeroizing<String>,
    eci: Option<String>,
    avv: Option<String>,
    xid: Option<String>,
    token: Option<String>,
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Card")
            .field("card_type", &self.card_type)
            .field("holder", &self.holder)
            .field("tokenized", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl Card {
    /// Card identified by a token from an earlier purchase.
    #[must_use]
    pub fn from_token(token: impl Into<String>) -> Self {
        Self { token: Some(token.into()), ..Self::default() }
    }

    /// Card given by its details. `exp_month` is `MM`, `exp_year` is `YY`.
    #[must_use]
    pub fn new(
        card_type: CardType,
        number: impl Into<String>,
        holder: impl Into<String>,
        exp_month: impl Into<String>,
        exp_year: impl Into<String>,
        cvc: impl Into<String>,
    ) -> Self {
        Self {
            card_type: Some(card_type),
            number: Zeroizing::new(number.into()),
            holder: holder.into(),
            exp_month: Zeroizing::new(exp_month.into()),
            exp_year: Zeroizing::new(exp_year.into()),
            cvc: Zeroizing::new(cvc.into()),
            ..Self::default()
        }
    }

    /// Adds 3-D Secure authentication values.
    #[must_use]
    pub fn with_three_d_secure(
        mut self,
        eci: impl Into<String>,
        avv: impl Into<String>,
        xid: impl Into<String>,
    ) -> Self {
        self.eci = Some(eci.into());
        self.avv = Some(avv.into());
        self.xid = Some(xid.into());
        self
    }

    /// Checks the card details. Tokenized cards are always accepted.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Validation`] for a bad number (Luhn), CVC, month or year.
    pub fn validate(&self) -> Result<()> {
        if self.token.is_some() {
            return Ok(());
        }
        if !is_valid_card_number(&self.number) {
            return Err(IpcError::Validation("Invalid card number".to_owned()));
        }
        if !is_valid_cvc(&self.cvc) {
            return Err(IpcError::Validation("Invalid card CVC".to_owned()));
        }
        if !is_valid_exp_month(&self.exp_month) {
            return Err(IpcError::Validation("Invalid card expire date (MM)".to_owned()));
        }
        if !is_valid_exp_year(&self.exp_year) {
            return Err(IpcError::Validation("Invalid card expire date (YY)".to_owned()));
        }
        Ok(())
    }

    /// Expiry as `YYMM`, zero-padded.
    #[must_use]
    pub fn exp_date(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("{:0>2}{:0>2}", self.exp_year.as_str(), self.exp_month.as_str()))
    }

    /// Scheme, if known.
    #[must_use]
    pub const fn card_type(&self) -> Option<CardType> {
        self.card_type
    }

    /// Card number.
    #[must_use]
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Cardholder name.
    #[must_use]
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Card verification code.
    #[must_use]
    pub fn cvc(&self) -> &str {
        &self.cvc
    }

    /// 3-D Secure ECI.
    #[must_use]
    pub fn eci(&self) -> Option<&str> {
        self.eci.as_deref()
    }

    /// 3-D Secure AVV.
    #[must_use]
    pub fn avv(&self) -> Option<&str> {
        self.avv.as_deref()
    }

    /// 3-D Secure XID.
    #[must_use]
    pub fn xid(&self) -> Option<&str> {
        self.xid.as_deref()
    }

    /// Stored card token.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visa(month: &str, year: &str) -> Card {
        Card::new(CardType::Visa, "4111111111111111", "JOHN DOE", month, year, "123")
    }

    #[test]
    fn test_valid_card() {
        assert!(visa("12", "99").validate().is_ok());
        assert_eq!(CardType::Jcb.code(), 6);
    }

    #[test]
    fn test_validation_messages() {
        let bad_number = Card::new(CardType::Visa, "4111111111111112", "", "12", "99", "123");
        let bad_cvc = Card::new(CardType::Visa, "4111111111111111", "", "12", "99", "12a");
        let cases = [
            (bad_number, "Invalid card number"),
            (bad_cvc, "Invalid card CVC"),
            (visa("13", "99"), "Invalid card expire date (MM)"),
            (visa("00", "99"), "Invalid card expire date (MM)"),
            (visa("12", "00"), "Invalid card expire date (YY)"),
        ];
        for (card, expected) in cases {
            let err = card.validate().unwrap_err();
            assert!(matches!(&err, IpcError::Validation(msg) if msg == expected), "{err}");
        }
    }

    #[test]
    fn test_token_skips_validation() {
        assert!(Card::from_token("tok_123").validate().is_ok());
    }

    #[test]
    fn test_exp_date_is_yymm() {
        assert_eq!(visa("3", "29").exp_date().as_str(), "2903");
        assert_eq!(visa("11", "30").exp_date().as_str(), "3011");
    }

    #[test]
    fn test_debug_hides_pan() {
        let debug = format!("{:?}", visa("12", "99"));
        assert!(!debug.contains("4111"));
        assert!(!debug.contains("123"));
    }
}
