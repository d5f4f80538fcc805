//! Payload conversion errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Cannot encode {type_name} into a payload: {message}")]
    Encode {
        type_name: &'static str,
        message: String,
    },

    #[error("Cannot decode payload into {type_name}: {message}")]
    Decode {
        type_name: &'static str,
        message: String,
    },
}

impl ConversionError {
    /// Name of the Rust type on the failing side of the conversion.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConversionError::Encode { type_name, .. } | ConversionError::Decode { type_name, .. } => {
                type_name
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = ConversionError::Decode {
            type_name: "i32",
            message: "invalid type: string".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("decode"));
        assert!(display.contains("i32"));
        assert!(display.contains("invalid type"));
    }

    #[test]
    fn test_type_name() {
        let err = ConversionError::Encode {
            type_name: "MyStruct",
            message: "key must be a string".to_string(),
        };
        assert_eq!(err.type_name(), "MyStruct");
    }
}
