//! Error types for perspective schema handling.
//!
//! Uses `thiserror` for ergonomic error definitions. Only document decoding
//! can fail; rendering an already-decoded document always succeeds.

use thiserror::Error;

/// The top-level error type for core operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Document shape ---
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Structural problems with the outer document envelope.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    #[error("expected a JSON object at the top level, found {found}")]
    NotAnObject { found: &'static str },

    #[error("'schema' must be an object, found {found}")]
    SchemaNotAnObject { found: &'static str },
}

/// Malformed record inside a recognized list. Reported and skipped, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordIssue {
    #[error("{kind} entry #{index} has no ref_id")]
    MissingRefId { kind: &'static str, index: usize },

    #[error("{kind} entry #{index} is not an object")]
    NotAnObject { kind: &'static str, index: usize },
}

/// Name of a JSON value's type, for error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_error_displays_found_type() {
        let err = Error::Document(DocumentError::NotAnObject { found: "array" });
        assert!(err.to_string().contains("array"));
        assert!(err.to_string().contains("top level"));
    }

    #[test]
    fn record_issue_names_kind_and_index() {
        let issue = RecordIssue::MissingRefId {
            kind: "Static Group",
            index: 3,
        };
        assert_eq!(issue.to_string(), "Static Group entry #3 has no ref_id");
    }

    #[test]
    fn json_type_names() {
        assert_eq!(json_type_name(&serde_json::json!([])), "array");
        assert_eq!(json_type_name(&serde_json::json!(null)), "null");
        assert_eq!(json_type_name(&serde_json::json!({})), "object");
    }
}
