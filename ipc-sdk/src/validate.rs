//! Field validators.
//!
//! Pure predicates applied by operation builders before any field is signed. None of them
//! perform network access.

use std::{net::IpAddr, sync::LazyLock};

use chrono::{Datelike, Utc};
use regex::Regex;
use url::Url;

#[allow(clippy::expect_used, reason = "static pattern")]
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[0-9]+(?:\.[0-9]{0,2})?$").expect("amount pattern is valid")
});

#[allow(clippy::expect_used, reason = "static pattern")]
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

#[allow(clippy::expect_used, reason = "static pattern")]
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z ]*$").expect("name pattern is valid")
});

/// Output format accepted by the gateway for JSON responses.
pub const OUTPUT_FORMAT_JSON: &str = "json";

/// Output format accepted by the gateway for XML responses.
pub const OUTPUT_FORMAT_XML: &str = "xml";

/// Currencies accepted by the gateway.
pub const ACCEPTED_CURRENCIES: &[&str] = &[
    "BGN", "CHF", "CZK", "DKK", "EUR", "GBP", "HRK", "HUF", "ISK", "JPY", "NOK", "PLN", "RON",
    "SEK", "USD",
];

/// Validates a monetary amount.
///
/// Accepts an optional leading minus, one or more digits and an optional `.` followed by at most
/// two digits. Scientific notation and multiple dots are rejected.
///
/// # Examples
///
/// ```
/// use ipc_sdk::validate::is_valid_amount;
///
/// assert!(is_valid_amount("12.3"));
/// assert!(is_valid_amount("-5.00"));
/// assert!(!is_valid_amount("12.345"));
/// assert!(!is_valid_amount("1e5"));
/// ```
#[must_use]
pub fn is_valid_amount(amount: &str) -> bool {
    AMOUNT_RE.is_match(amount)
}

/// Validates a card number with the Luhn checksum.
///
/// Surrounding whitespace and inner spaces are removed first. The remainder must be 13 to 19
/// ASCII digits.
///
/// # Examples
///
/// ```
/// use ipc_sdk::validate::is_valid_card_number;
///
/// assert!(is_valid_card_number("4111 1111 1111 1111"));
/// assert!(!is_valid_card_number("4111 1111 1111 1112"));
/// assert!(!is_valid_card_number("4111"));
/// ```
#[must_use]
pub fn is_valid_card_number(card_number: &str) -> bool {
    let digits: Vec<u32> = card_number
        .trim()
        .chars()
        .filter(|c| *c != ' ')
        .map(|c| c.to_digit(10))
        .collect::<Option<_>>()
        .unwrap_or_default();

    if !(13..=19).contains(&digits.len()) {
        return false;
    }

    luhn_sum(&digits) % 10 == 0
}

/// Luhn sum over digits, most significant first.
fn luhn_sum(digits: &[u32]) -> u32 {
    digits
        .iter()
        .rev()
        .enumerate()
        .map(|(index, &digit)| {
            if index % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum()
}

/// Validates a card verification code: exactly three ASCII digits.
#[must_use]
pub fn is_valid_cvc(cvc: &str) -> bool {
    cvc.len() == 3 && cvc.bytes().all(|b| b.is_ascii_digit())
}

/// Validates an email address format.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Validates an absolute `http`/`https` URL with a host.
///
/// # Examples
///
/// ```
/// use ipc_sdk::validate::is_valid_url;
///
/// assert!(is_valid_url("https://www.mypos.com/vmp/checkout-test"));
/// assert!(!is_valid_url("not a url"));
/// assert!(!is_valid_url("ftp://files.example.com"));
/// ```
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
}

/// Validates an IPv4 or IPv6 address.
#[must_use]
pub fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

/// Validates a customer name: latin letters and spaces only.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// Validates a response output format (`json` or `xml`, case-sensitive).
#[must_use]
pub fn is_valid_output_format(format: &str) -> bool {
    format == OUTPUT_FORMAT_JSON || format == OUTPUT_FORMAT_XML
}

/// Validates a currency against [`ACCEPTED_CURRENCIES`].
#[must_use]
pub fn is_valid_currency(currency: &str) -> bool {
    ACCEPTED_CURRENCIES.contains(&currency)
}

/// Validates a cart line quantity.
#[must_use]
pub const fn is_valid_cart_quantity(quantity: u32) -> bool {
    quantity > 0
}

/// Validates a card expiry month (`1`..=`12`, leading zero allowed).
#[must_use]
pub fn is_valid_exp_month(month: &str) -> bool {
    month.len() <= 2
        && month.bytes().all(|b| b.is_ascii_digit())
        && month.parse::<u32>().is_ok_and(|m| (1..=12).contains(&m))
}

/// Validates a two-digit card expiry year that is not in the past.
#[must_use]
pub fn is_valid_exp_year(year: &str) -> bool {
    let current = u32::try_from(Utc::now().year() % 100).unwrap_or_default();
    is_valid_exp_year_at(year, current)
}

fn is_valid_exp_year_at(year: &str, current_two_digit_year: u32) -> bool {
    year.len() == 2
        && year.bytes().all(|b| b.is_ascii_digit())
        && year.parse::<u32>().is_ok_and(|y| y >= current_two_digit_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_examples() {
        assert!(is_valid_amount("12.3"));
        assert!(!is_valid_amount("12.345"));
        assert!(is_valid_amount("-5.00"));
        assert!(!is_valid_amount("abc"));
    }

    #[test]
    fn test_amount_edge_cases() {
        assert!(is_valid_amount("0"));
        assert!(is_valid_amount("10."));
        assert!(!is_valid_amount("1.2.3"));
        assert!(!is_valid_amount("1e5"));
        assert!(!is_valid_amount(".5"));
        assert!(!is_valid_amount("+5"));
        assert!(!is_valid_amount(""));
    }

    #[test]
    fn test_card_number_luhn() {
        assert!(is_valid_card_number("4111111111111111"));
        assert!(is_valid_card_number("5555555555554444"));
        assert!(is_valid_card_number("378282246310005"));
        assert!(is_valid_card_number(" 4111 1111 1111 1111 "));
        assert!(!is_valid_card_number("4111111111111112"));
    }

    #[test]
    fn test_card_number_shape() {
        // 12 digits passing Luhn is still too short
        assert!(!is_valid_card_number("000000000000"));
        assert!(is_valid_card_number("0000000000000"));
        assert!(!is_valid_card_number("00000000000000000000"));
        assert!(!is_valid_card_number("4111-1111-1111-1111"));
        assert!(!is_valid_card_number("4111a11111111111"));
        assert!(!is_valid_card_number(""));
    }

    #[test]
    fn test_cvc() {
        assert!(is_valid_cvc("123"));
        assert!(is_valid_cvc("000"));
        assert!(!is_valid_cvc("12"));
        assert!(!is_valid_cvc("1234"));
        assert!(!is_valid_cvc("12a"));
    }

    #[test]
    fn test_email() {
        assert!(is_valid_email("buyer@example.com"));
        assert!(!is_valid_email("buyer@example"));
        assert!(!is_valid_email("buyer example.com"));
    }

    #[test]
    fn test_output_format_is_case_sensitive() {
        assert!(is_valid_output_format("json"));
        assert!(is_valid_output_format("xml"));
        assert!(!is_valid_output_format("JSON"));
        assert!(!is_valid_output_format("post"));
    }

    #[test]
    fn test_currency_and_name() {
        assert!(is_valid_currency("EUR"));
        assert!(!is_valid_currency("eur"));
        assert!(!is_valid_currency("XXX"));
        assert!(is_valid_name("John Doe"));
        assert!(!is_valid_name("John-Doe"));
    }

    #[test]
    fn test_ip_and_quantity() {
        assert!(is_valid_ip("192.168.1.100"));
        assert!(is_valid_ip("::1"));
        assert!(!is_valid_ip("300.1.1.1"));
        assert!(is_valid_cart_quantity(1));
        assert!(!is_valid_cart_quantity(0));
    }

    #[test]
    fn test_expiry() {
        assert!(is_valid_exp_month("01"));
        assert!(is_valid_exp_month("12"));
        assert!(!is_valid_exp_month("00"));
        assert!(!is_valid_exp_month("13"));
        assert!(is_valid_exp_year_at("30", 26));
        assert!(is_valid_exp_year_at("26", 26));
        assert!(!is_valid_exp_year_at("25", 26));
        assert!(!is_valid_exp_year_at("2030", 26));
    }
}
