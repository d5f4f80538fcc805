//! Conversion between payloads and concrete values.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ConversionError;
use crate::payload::Payload;

/// Adapts opaque payloads to and from caller-requested types.
///
/// Methods are generic, so converters are used through static dispatch
/// (`Channel<C>`, `ActivityFn`) rather than as trait objects.
pub trait Converter: Send + Sync + 'static {
    /// Encode a value into its transport form.
    fn to_payload<T: Serialize + ?Sized>(&self, value: &T) -> Result<Payload, ConversionError>;

    /// Decode a payload into the requested destination type.
    fn from_payload<T: DeserializeOwned>(&self, payload: &Payload) -> Result<T, ConversionError>;
}

/// Default converter backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConverter;

impl Converter for JsonConverter {
    fn to_payload<T: Serialize + ?Sized>(&self, value: &T) -> Result<Payload, ConversionError> {
        serde_json::to_value(value)
            .map(Payload::new)
            .map_err(|e| ConversionError::Encode {
                type_name: std::any::type_name::<T>(),
                message: e.to_string(),
            })
    }

    fn from_payload<T: DeserializeOwned>(&self, payload: &Payload) -> Result<T, ConversionError> {
        T::deserialize(payload.as_value()).map_err(|e| ConversionError::Decode {
            type_name: std::any::type_name::<T>(),
            message: e.to_string(),
        })
    }
}
