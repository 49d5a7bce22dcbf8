use thiserror::Error;

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Unrecognized type shape: {type_ref} ({reason})")]
    UnrecognizedTypeShape { type_ref: String, reason: String },

    #[error("Unresolved type reference: {0}")]
    UnresolvedTypeReference(String),

    #[error("Type '{0}' is registered more than once")]
    DuplicateType(String),

    #[error("Message type '{message}' has no field '{field}'")]
    UnknownField { message: String, field: String },

    #[error("Enum '{enum_name}' has no variant {variant}")]
    UnknownEnumVariant { enum_name: String, variant: String },

    #[error("Invalid type syntax '{input}': {message}")]
    InvalidTypeSyntax { input: String, message: String },

    #[error("Value does not match type {expected}: {found}")]
    ValueMismatch { expected: String, found: String },

    #[error("Corrupt binary value: {0}")]
    CorruptBinary(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl SchemaError {
    pub fn unrecognized(type_ref: impl ToString, reason: impl Into<String>) -> Self {
        Self::UnrecognizedTypeShape {
            type_ref: type_ref.to_string(),
            reason: reason.into(),
        }
    }

    pub fn mismatch(expected: impl ToString, found: impl Into<String>) -> Self {
        Self::ValueMismatch {
            expected: expected.to_string(),
            found: found.into(),
        }
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(e: serde_json::Error) -> Self {
        SchemaError::Json(e.to_string())
    }
}
