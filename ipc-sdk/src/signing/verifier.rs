//! Signature verification for gateway responses.

use base64::{Engine, engine::general_purpose::STANDARD};
use rsa::{
    pkcs1v15::{Signature, VerifyingKey},
    signature::Verifier,
};
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, instrument, warn};

use crate::{
    error::{IpcError, Result},
    response::{Response, ResponseEnvelope},
    signing::{
        codec,
        keys::{KeyMaterial, PublicKey},
    },
};

/// Checks a base64 signature over canonical bytes.
///
/// Returns `false` for a signature that does not verify, is not valid base64, or has the wrong
/// length. Whitespace inside the signature (line-wrapped base64) is ignored.
///
/// # Examples
///
/// ```no_run
/// use ipc_sdk::signing::{codec, keys::PublicKey, verifier::verify};
///
/// # fn example(signature: &str) -> ipc_sdk::Result<()> {
/// let key = PublicKey::from_pem_file("gateway_cert.pem")?;
/// let canonical = codec::encode_joined(["IPCGetTxnStatus", "X1", "0"]);
/// if !verify(&canonical, signature, &key) {
///     // reject
/// }
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn verify(canonical: &[u8], signature_b64: &str, key: &PublicKey) -> bool {
    let compact: String = signature_b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let Ok(raw) = STANDARD.decode(compact) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(raw.as_slice()) else {
        return false;
    };
    VerifyingKey::<Sha256>::new(key.rsa().clone()).verify(canonical, &signature).is_ok()
}

/// Like [`verify`], taking the gateway key from configured key material.
///
/// # Errors
///
/// Returns [`IpcError::Key`] if no verification key is configured.
pub fn verify_with_keys(
    canonical: &[u8],
    signature_b64: &str,
    keys: &KeyMaterial,
) -> Result<bool> {
    Ok(verify(canonical, signature_b64, keys.verification_key()?))
}

/// Verifies a parsed response and returns it as a trusted [`Response`].
///
/// The signature field is found case-insensitively and removed. The remaining values are
/// flattened depth-first, joined with `-`, base64-encoded and checked against the gateway key.
///
/// # Errors
///
/// - [`IpcError::MissingSignature`] if no non-empty signature field exists
/// - [`IpcError::SignatureMismatch`] if the signature does not verify
#[instrument(skip_all, fields(format = %envelope.format(), field_count = envelope.len()))]
pub fn verify_response(mut envelope: ResponseEnvelope, key: &PublicKey) -> Result<Response> {
    let signature = match envelope.take_signature() {
        None => return Err(IpcError::MissingSignature),
        Some(Value::String(s)) if s.trim().is_empty() => return Err(IpcError::MissingSignature),
        Some(Value::String(s)) => s,
        Some(_) => {
            warn!("response signature is not a string");
            return Err(IpcError::SignatureMismatch);
        }
    };

    let values = flatten_values(envelope.fields().values());
    let canonical = codec::encode_joined(values.iter().map(String::as_str));

    if !verify(&canonical, &signature, key) {
        warn!("response signature check failed");
        return Err(IpcError::SignatureMismatch);
    }

    debug!(value_count = values.len(), "response signature verified");
    Ok(Response::new(envelope, signature))
}

/// Flattens nested values depth-first into their scalar renderings.
///
/// Strings are kept verbatim, `true` becomes `"1"` and both `false` and `null` become `""`.
/// Integers keep their JSON text; floats are rendered by [`render_float`].
#[must_use]
pub fn flatten_values<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut out = Vec::new();
    for value in values {
        flatten_into(value, &mut out);
    }
    out
}

fn flatten_into(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => map.values().for_each(|v| flatten_into(v, out)),
        Value::Array(items) => items.iter().for_each(|v| flatten_into(v, out)),
        Value::String(s) => out.push(s.clone()),
        Value::Number(n) => out.push(match n.as_f64() {
            Some(f) if n.is_f64() => render_float(f),
            _ => n.to_string(),
        }),
        Value::Bool(true) => out.push("1".to_owned()),
        Value::Bool(false) | Value::Null => out.push(String::new()),
    }
}

/// Renders a float the way the gateway stringifies it when joining values for a signature.
///
/// Whole numbers below `1e15` print without a fraction (`10.00` becomes `"10"`). Everything else
/// uses the shortest round-trip digits, switching to `1.0E+25` notation when the decimal
/// exponent is at least 15 or below -4.
#[must_use]
pub fn render_float(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "NAN".to_owned()
        } else if value.is_sign_negative() {
            "-INF".to_owned()
        } else {
            "INF".to_owned()
        };
    }

    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let exponent: i32 = exponent.parse().unwrap_or_default();
    if (-4..15).contains(&exponent) {
        return value.to_string();
    }

    let sign = if exponent < 0 { '-' } else { '+' };
    let mantissa =
        if mantissa.contains('.') { mantissa.to_owned() } else { format!("{mantissa}.0") };
    format!("{mantissa}E{sign}{}", exponent.unsigned_abs())
}
