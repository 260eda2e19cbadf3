//! Request field values and the ordered parameter set.
//!
//! The gateway signs field *values* in the exact order the fields were added, so
//! [`ParameterSet`] preserves insertion order. [`FieldValue`] gives every supported value type
//! a single wire rendering.

use std::fmt;

use indexmap::IndexMap;
use rust_decimal::Decimal;

/// Name of the detached signature field.
pub const SIGNATURE_FIELD: &str = "Signature";

/// A typed request field value.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
///
/// use ipc_sdk::params::FieldValue;
/// use rust_decimal::Decimal;
///
/// assert_eq!(FieldValue::from(true).to_wire(), "1");
/// assert_eq!(FieldValue::from(false).to_wire(), "0");
/// assert_eq!(FieldValue::from(42_i64).to_wire(), "42");
/// assert_eq!(FieldValue::from(Decimal::from_str("10.50").unwrap()).to_wire(), "10.50");
/// assert_eq!(FieldValue::from("EUR").to_wire(), "EUR");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Free text, sent verbatim.
    Text(String),
    /// Integer in base 10.
    Integer(i64),
    /// Decimal rendered with its own scale (`10.50` stays `10.50`).
    Decimal(Decimal),
    /// Boolean rendered as `1` / `0`.
    Boolean(bool),
}

impl FieldValue {
    /// Returns the textual form sent to the gateway and covered by the signature.
    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Decimal(value) => value.to_string(),
            Self::Boolean(value) => if *value { "1" } else { "0" }.to_owned(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Text(value.to_string()), Self::Integer)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Ordered mapping of field name to wire value.
///
/// Inserting a name that already exists replaces its value and keeps its original position.
///
/// # Examples
///
/// ```
/// use ipc_sdk::params::ParameterSet;
///
/// let mut params = ParameterSet::new();
/// params.insert("OrderID", "X1");
/// params.insert("Amount", "10.00");
/// params.insert("OrderID", "X2");
///
/// let values: Vec<&str> = params.values().collect();
/// assert_eq!(values, ["X2", "10.00"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    fields: IndexMap<String, String>,
}

impl ParameterSet {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Removes a field, preserving the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.shift_remove(name)
    }

    /// Returns the detached signature, if the set has been finalized.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.get(SIGNATURE_FIELD)
    }

    /// Returns `true` when the set carries a `Signature` field.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.fields.contains_key(SIGNATURE_FIELD)
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates over values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.values().map(String::as_str)
    }

    /// Iterates over values in insertion order, skipping the `Signature` field.
    pub fn unsigned_values(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(name, _)| *name != SIGNATURE_FIELD).map(|(_, value)| value)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serializes the set as an `application/x-www-form-urlencoded` body, keeping field order.
    #[must_use]
    pub fn to_form_body(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new()).extend_pairs(self.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_field_value_wire_forms() {
        assert_eq!(FieldValue::Boolean(true).to_wire(), "1");
        assert_eq!(FieldValue::Boolean(false).to_wire(), "0");
        assert_eq!(FieldValue::Integer(-7).to_wire(), "-7");
        assert_eq!(FieldValue::from(Decimal::from_str("10.00").unwrap()).to_wire(), "10.00");
        assert_eq!(FieldValue::from(Decimal::new(1234, 2)).to_string(), "12.34");
        assert_eq!(FieldValue::from(u64::MAX).to_wire(), u64::MAX.to_string());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let params: ParameterSet =
            [("OrderID", "X1"), ("Amount", "10.00"), ("Currency", "EUR")].into_iter().collect();

        let names: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["OrderID", "Amount", "Currency"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut params = ParameterSet::new();
        params.insert("A", "1");
        params.insert("B", "2");
        params.insert("A", "3");

        assert_eq!(params.iter().collect::<Vec<_>>(), [("A", "3"), ("B", "2")]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut params: ParameterSet =
            [("A", "1"), ("B", "2"), ("C", "3")].into_iter().collect();
        assert_eq!(params.remove("B").as_deref(), Some("2"));
        assert_eq!(params.values().collect::<Vec<_>>(), ["1", "3"]);
    }

    #[test]
    fn test_unsigned_values_skip_signature() {
        let mut params: ParameterSet = [("A", "1"), ("B", "2")].into_iter().collect();
        params.insert(SIGNATURE_FIELD, "c2ln");

        assert!(params.is_signed());
        assert_eq!(params.signature(), Some("c2ln"));
        assert_eq!(params.unsigned_values().collect::<Vec<_>>(), ["1", "2"]);
    }

    #[test]
    fn test_form_body_encoding() {
        let params: ParameterSet =
            [("Note", "a b&c"), ("Amount", "10.00")].into_iter().collect();
        assert_eq!(params.to_form_body(), "Note=a+b%26c&Amount=10.00");
    }
}
