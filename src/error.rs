//! Error types.
//!
//! Construction-time failures are errors; mutations (`set`, sequence
//! insert/remove) are infallible once a blueprint and schema are in place.

use thiserror::Error;

use crate::types::FieldKind;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, BindError>;

/// A raw value that could not be coerced to its declared kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot coerce {raw:?} to {kind}{}", field_suffix(.field))]
pub struct CoercionError {
    pub field: Option<String>,
    pub kind: FieldKind,
    pub raw: String,
}

fn field_suffix(field: &Option<String>) -> String {
    field
        .as_ref()
        .map(|f| format!(" (field `{f}`)"))
        .unwrap_or_default()
}

impl CoercionError {
    pub fn new(kind: FieldKind, raw: impl Into<String>) -> Self {
        Self { field: None, kind, raw: raw.into() }
    }

    /// Attach the field name the value was destined for.
    pub fn for_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }
}

#[derive(Debug, Error)]
pub enum BindError {
    /// No blueprint registered for any type in the chain.
    #[error("no template registered for any of {chain:?}")]
    TemplateNotFound { chain: Vec<String> },

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// The entity factory could not classify a record.
    #[error("record in collection `{collection}` could not be classified")]
    Classification { collection: String },

    /// A `sequence` field whose blueprint has no container slot.
    #[error("sequence field `{field}` has no container slot in its template")]
    MissingContainer { field: String },

    #[error("unknown field `{field}`")]
    UnknownField { field: String },

    /// The transport rejected the connection's credentials.
    #[error("transport authorization failed: {0}")]
    TransportAuth(String),

    #[error("invalid configuration: {0}")]
    Config(#[source] serde_json::Error),

    /// A transport frame that is not a known event.
    #[error("malformed transport frame: {0}")]
    Decode(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercion_error_message() {
        let err = CoercionError::new(FieldKind::Integer, "abc");
        assert_eq!(err.to_string(), "cannot coerce \"abc\" to integer");

        let err = err.for_field("count");
        assert_eq!(err.to_string(), "cannot coerce \"abc\" to integer (field `count`)");
    }

    #[test]
    fn test_template_not_found_message() {
        let err = BindError::TemplateNotFound {
            chain: vec!["MyMessage".into(), "Message".into()],
        };
        assert!(err.to_string().contains("MyMessage"));
    }
}
