//! Canonical signing string.
//!
//! The gateway signs neither field names nor a structured document. It signs the base64 encoding
//! of all field values joined with `-`, in the order the fields were added. Outbound values are
//! HTML-unescaped first so the signature covers what the merchant submitted rather than its
//! escaped transport form.
//!
//! Values that themselves contain `-` are joined as-is. The resulting string is therefore not
//! injective (`["a-b", "c"]` and `["a", "b-c"]` collide), but changing it would break
//! compatibility with the gateway.

use std::borrow::Cow;

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::params::ParameterSet;

/// Separator between values in the canonical string.
pub const SEPARATOR: &str = "-";

/// Builds the canonical bytes for an outbound parameter set.
///
/// The `Signature` field, if present, is excluded. Every value is HTML-unescaped before joining.
///
/// # Examples
///
/// ```
/// use ipc_sdk::{params::ParameterSet, signing::codec::canonicalize};
///
/// let params: ParameterSet =
///     [("OrderID", "X1"), ("Amount", "10.00"), ("Currency", "EUR")].into_iter().collect();
///
/// // base64("X1-10.00-EUR")
/// assert_eq!(canonicalize(&params), b"WDEtMTAuMDAtRVVS");
/// ```
#[must_use]
pub fn canonicalize(params: &ParameterSet) -> Vec<u8> {
    canonicalize_values(params.unsigned_values())
}

/// Builds the canonical bytes from bare values, unescaping each one.
#[must_use]
pub fn canonicalize_values<'a, I>(values: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a str>,
{
    let unescaped: Vec<Cow<'a, str>> = values.into_iter().map(unescape_html).collect();
    encode_joined(unescaped.iter().map(AsRef::as_ref))
}

/// Joins values with [`SEPARATOR`] and base64-encodes the result, without any unescaping.
///
/// Used directly for inbound responses, whose values are signed as received.
#[must_use]
pub fn encode_joined<'a, I>(values: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = values.into_iter().collect::<Vec<_>>().join(SEPARATOR);
    STANDARD.encode(joined).into_bytes()
}

/// Escapes `&`, `"`, `'`, `<` and `>` the way the gateway's web layer does.
///
/// # Examples
///
/// ```
/// use ipc_sdk::signing::codec::escape_html;
///
/// assert_eq!(escape_html("Tom & \"Jerry's\" <shop>"), "Tom &amp; &quot;Jerry&#039;s&quot; &lt;shop&gt;");
/// ```
#[must_use]
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '"', '\'', '<', '>']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Reverses [`escape_html`] in a single pass.
///
/// Decodes the named entities `&amp;`, `&quot;`, `&lt;` and `&gt;`, plus decimal or hex
/// references (`&#39;`, `&#x3C;`) that resolve to one of the five special characters. Other
/// entities are left untouched, and a decoded `&` never starts a new entity (`&amp;lt;` becomes
/// `&lt;`).
#[must_use]
pub fn unescape_html(text: &str) -> Cow<'_, str> {
    const NAMED: [(&str, char); 4] =
        [("&amp;", '&'), ("&quot;", '"'), ("&lt;", '<'), ("&gt;", '>')];

    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        decoded.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let entity = NAMED
            .iter()
            .find(|(entity, _)| rest.starts_with(entity))
            .map(|(entity, c)| (*c, entity.len()))
            .or_else(|| numeric_reference(rest));
        match entity {
            Some((c, len)) => {
                decoded.push(c);
                rest = &rest[len..];
            }
            None => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }
    decoded.push_str(rest);
    Cow::Owned(decoded)
}

/// Parses `&#NN;` or `&#xNN;` at the start of `text` when it names a special character.
fn numeric_reference(text: &str) -> Option<(char, usize)> {
    let body = text.strip_prefix("&#")?;
    let end = body.find(';')?;
    let digits = &body[..end];
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()?
        }
        None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.parse().ok()?
        }
        _ => return None,
    };
    let c = match code {
        34 => '"',
        38 => '&',
        39 => '\'',
        60 => '<',
        62 => '>',
        _ => return None,
    };
    Some((c, "&#".len() + end + 1))
}

/// Normalizes a value for transport: unescape, then escape.
///
/// Idempotent, so already-escaped input is never double-escaped.
///
/// # Examples
///
/// ```
/// use ipc_sdk::signing::codec::normalize;
///
/// assert_eq!(normalize("a & b"), "a &amp; b");
/// assert_eq!(normalize("a &amp; b"), "a &amp; b");
/// ```
#[must_use]
pub fn normalize(value: &str) -> String {
    escape_html(&unescape_html(value)).into_owned()
}
