//! Gateway responses.
//!
//! A raw body is first parsed into a [`ResponseEnvelope`]: an ordered, possibly nested mapping
//! of field names to values. The envelope is untrusted. Only
//! [`verify_response`](crate::signing::verify_response) turns it into a [`Response`], so holding
//! a `Response` means its signature has been checked against the gateway key.

mod xml;

use std::{fmt, str::FromStr};

use serde_json::{Map, Value};

use crate::{
    error::{IpcError, Result},
    validate::{OUTPUT_FORMAT_JSON, OUTPUT_FORMAT_XML},
};

/// Status code reported for a successful operation.
pub const STATUS_SUCCESS: i64 = 0;

/// Wire format of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseFormat {
    /// JSON object.
    Json,
    /// XML document; the root element's children are the fields.
    Xml,
    /// `application/x-www-form-urlencoded` body, as posted to notification URLs.
    Post,
}

impl ResponseFormat {
    /// Returns the `OutputFormat` value that asks the gateway for this format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => OUTPUT_FORMAT_JSON,
            Self::Xml => OUTPUT_FORMAT_XML,
            Self::Post => "post",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = IpcError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            OUTPUT_FORMAT_JSON => Ok(Self::Json),
            OUTPUT_FORMAT_XML => Ok(Self::Xml),
            "post" => Ok(Self::Post),
            other => Err(IpcError::Validation(format!("Invalid output format: {other}"))),
        }
    }
}

/// Parsed, not yet verified, response body.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    fields: Map<String, Value>,
    format: ResponseFormat,
    raw: String,
}

impl ResponseEnvelope {
    /// Parses a raw body in the given format.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::InvalidResponse`] if the body is empty, malformed, or carries no
    /// fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use ipc_sdk::response::{ResponseEnvelope, ResponseFormat};
    ///
    /// let envelope = ResponseEnvelope::parse(b"Status=0&Signature=c2ln", ResponseFormat::Post)?;
    /// assert_eq!(envelope.len(), 2);
    /// # Ok::<(), ipc_sdk::error::IpcError>(())
    /// ```
    pub fn parse(body: &[u8], format: ResponseFormat) -> Result<Self> {
        let body = body.trim_ascii();
        if body.is_empty() {
            return Err(IpcError::InvalidResponse("empty response body".to_owned()));
        }

        let fields = match format {
            ResponseFormat::Json => parse_json(body)?,
            ResponseFormat::Xml => xml::parse(body)?,
            ResponseFormat::Post => parse_post(body),
        };

        if fields.is_empty() {
            return Err(IpcError::InvalidResponse("response carries no fields".to_owned()));
        }

        Ok(Self { fields, format, raw: String::from_utf8_lossy(body).into_owned() })
    }

    /// Builds an envelope from already decoded fields, e.g. a notification handled by a web
    /// framework.
    #[must_use]
    pub fn from_fields(fields: Map<String, Value>, format: ResponseFormat) -> Self {
        let raw = Value::Object(fields.clone()).to_string();
        Self { fields, format, raw }
    }

    /// Removes and returns the signature, matching the field name case-insensitively.
    ///
    /// When several spellings are present all of them are removed and the last one wins.
    pub fn take_signature(&mut self) -> Option<Value> {
        let names: Vec<String> =
            self.fields.keys().filter(|k| k.eq_ignore_ascii_case("signature")).cloned().collect();
        names.into_iter().filter_map(|name| self.fields.shift_remove(&name)).last()
    }

    /// Top-level fields in document order.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Format the body was parsed from.
    #[must_use]
    pub const fn format(&self) -> ResponseFormat {
        self.format
    }

    /// Body as received.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Number of top-level fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when there are no top-level fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Map<String, Value>, ResponseFormat, String) {
        (self.fields, self.format, self.raw)
    }
}

fn parse_json(body: &[u8]) -> Result<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(IpcError::InvalidResponse("JSON response is not an object".to_owned())),
        Err(e) => Err(IpcError::InvalidResponse(format!("JSON parse error: {e}"))),
    }
}

fn parse_post(body: &[u8]) -> Map<String, Value> {
    url::form_urlencoded::parse(body)
        .map(|(name, value)| (name.into_owned(), Value::String(value.into_owned())))
        .collect()
}

/// A response whose signature has been verified.
///
/// Field lookups are case-insensitive, matching how the gateway treats names.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    fields: Map<String, Value>,
    signature: String,
    format: ResponseFormat,
    raw: String,
}

impl Response {
    pub(crate) fn new(envelope: ResponseEnvelope, signature: String) -> Self {
        let (fields, format, raw) = envelope.into_parts();
        Self { fields, signature, format, raw }
    }

    /// Looks up a top-level field by name, ignoring ASCII case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).or_else(|| {
            self.fields.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v)
        })
    }

    /// Looks up a top-level scalar field and renders it as text.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_owned()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Numeric `Status` field; `None` when absent or not an integer.
    #[must_use]
    pub fn status(&self) -> Option<i64> {
        match self.get("status")? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// `StatusMsg` field.
    #[must_use]
    pub fn status_msg(&self) -> Option<&str> {
        self.get("statusmsg").and_then(Value::as_str)
    }

    /// Returns `true` when `Status` is [`STATUS_SUCCESS`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status() == Some(STATUS_SUCCESS)
    }

    /// All fields except the signature, in document order.
    #[must_use]
    pub const fn data(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The verified signature as received.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Format the body was parsed from.
    #[must_use]
    pub const fn format(&self) -> ResponseFormat {
        self.format
    }

    /// Body as received.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}
