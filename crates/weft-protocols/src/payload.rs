//! Opaque transport value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque value in transport form.
///
/// Channels and activities move payloads around without knowing the type
/// behind them; a [`Converter`](crate::Converter) turns them back into
/// concrete values at the edges.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(serde_json::Value);

impl Payload {
    /// Wrap a raw JSON value.
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The null payload.
    pub fn null() -> Self {
        Self(serde_json::Value::Null)
    }

    /// Borrow the transport representation.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Unwrap into the transport representation.
    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_is_transparent() {
        let payload = Payload::new(json!({"a": 1}));
        let encoded = serde_json::to_string(&payload).unwrap();
        assert_eq!(encoded, r#"{"a":1}"#);
    }

    #[test]
    fn test_default_is_null() {
        assert!(Payload::default().is_null());
        assert_eq!(Payload::null(), Payload::default());
    }

    #[test]
    fn test_display() {
        assert_eq!(Payload::from(json!([1, 2])).to_string(), "[1,2]");
    }
}
