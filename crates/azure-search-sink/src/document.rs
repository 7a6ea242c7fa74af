//! Record validation and document body construction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::schema::{value_matches, FieldKind, IndexSchema};

/// A record as pushed by the upstream dataflow step: field name to value.
pub type Record = Map<String, Value>;

/// Per-document action carried in the `@search.action` property of the
/// documents-index request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchAction {
    /// Insert or fully replace the document.
    #[default]
    #[serde(rename = "upload")]
    Upload,
    /// Update fields of an existing document; fails if the key is unknown.
    #[serde(rename = "merge")]
    Merge,
    /// Update if present, insert otherwise.
    #[serde(rename = "mergeOrUpload")]
    MergeOrUpload,
    /// Remove the document with this key.
    #[serde(rename = "delete")]
    Delete,
}

impl SearchAction {
    /// Wire form of the action tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SearchAction::Upload => "upload",
            SearchAction::Merge => "merge",
            SearchAction::MergeOrUpload => "mergeOrUpload",
            SearchAction::Delete => "delete",
        }
    }
}

/// Validate `record` against `schema`, producing the normalized record that
/// gets buffered.
///
/// Fields are projected in schema order: supplied values are checked against
/// the declared kind (and dimensionality, for vector fields that declare
/// one), missing optional fields are filled from their defaults, and keys the
/// schema does not declare are dropped. A declared dimensionality applies to
/// supplied values only; defaults pass through verbatim.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a missing required field, a value of
/// the wrong kind, or a vector of the wrong length. The caller's buffer is
/// never touched on failure.
pub(crate) fn validate_record(schema: &IndexSchema, record: &Record) -> Result<Record> {
    let mut normalized = Record::new();
    for field in schema.fields() {
        match record.get(&field.name) {
            Some(value) => {
                if !value_matches(field.spec.kind, value) {
                    return Err(Error::validation(format!(
                        "field `{}` should be {}, got {}",
                        field.name,
                        field.spec.kind.describe(),
                        value_kind(value)
                    )));
                }
                if field.spec.kind == FieldKind::NumberCollection {
                    if let Some(dimensions) = field.spec.dimensions {
                        let len = value.as_array().map_or(0, Vec::len);
                        if len != dimensions as usize {
                            return Err(Error::validation(format!(
                                "field `{}` expects {} dimensions, got {}",
                                field.name, dimensions, len
                            )));
                        }
                    }
                }
                normalized.insert(field.name.clone(), value.clone());
            }
            None => match &field.spec.default {
                Some(default) => {
                    normalized.insert(field.name.clone(), default.clone());
                }
                None => {
                    return Err(Error::validation(format!(
                        "record is missing required field `{}` and no default is declared",
                        field.name
                    )));
                }
            },
        }
    }
    Ok(normalized)
}

/// Build the wire document for one normalized record: the record's fields
/// plus the `@search.action` tag.
pub(crate) fn document_body(record: &Record, action: SearchAction) -> Value {
    let mut body = Map::with_capacity(record.len() + 1);
    body.insert(
        "@search.action".to_string(),
        Value::String(action.as_str().to_string()),
    );
    body.extend(record.iter().map(|(k, v)| (k.clone(), v.clone())));
    Value::Object(body)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> IndexSchema {
        IndexSchema::builder()
            .field("id", FieldKind::String)
            .field_with_default("content", FieldKind::String, json!(""))
            .field_with_default("vector", FieldKind::NumberCollection, json!([]))
            .build()
            .unwrap()
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    // ==================== SearchAction ====================

    #[test]
    fn test_action_wire_forms() {
        assert_eq!(SearchAction::Upload.as_str(), "upload");
        assert_eq!(SearchAction::Merge.as_str(), "merge");
        assert_eq!(SearchAction::MergeOrUpload.as_str(), "mergeOrUpload");
        assert_eq!(SearchAction::Delete.as_str(), "delete");
    }

    #[test]
    fn test_action_default_is_upload() {
        assert_eq!(SearchAction::default(), SearchAction::Upload);
    }

    #[test]
    fn test_action_serialization_matches_wire_form() {
        for action in [
            SearchAction::Upload,
            SearchAction::Merge,
            SearchAction::MergeOrUpload,
            SearchAction::Delete,
        ] {
            let serialized = serde_json::to_string(&action).unwrap();
            assert_eq!(serialized, format!("\"{}\"", action.as_str()));
        }
    }

    // ==================== validate_record ====================

    #[test]
    fn test_valid_record_passes_through() {
        let normalized = validate_record(
            &schema(),
            &record(json!({"id": "a", "content": "hello", "vector": [0.5, 0.25]})),
        )
        .unwrap();
        assert_eq!(normalized.get("id"), Some(&json!("a")));
        assert_eq!(normalized.get("content"), Some(&json!("hello")));
        assert_eq!(normalized.get("vector"), Some(&json!([0.5, 0.25])));
    }

    #[test]
    fn test_missing_optional_fields_filled_from_defaults() {
        let normalized = validate_record(&schema(), &record(json!({"id": "a"}))).unwrap();
        assert_eq!(normalized.get("content"), Some(&json!("")));
        assert_eq!(normalized.get("vector"), Some(&json!([])));
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let err = validate_record(&schema(), &record(json!({"content": "x"}))).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("missing required field `id`"));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let err = validate_record(&schema(), &record(json!({"id": 42}))).unwrap_err();
        assert!(err.is_validation());
        assert!(err
            .to_string()
            .contains("field `id` should be a string, got a number"));
    }

    #[test]
    fn test_collection_of_wrong_elements_rejected() {
        let err = validate_record(
            &schema(),
            &record(json!({"id": "a", "vector": [0.1, "oops"]})),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_declared_dimensions_enforced_on_supplied_vectors() {
        let schema = IndexSchema::builder()
            .field("id", FieldKind::String)
            .vector_field("vector", 3)
            .build()
            .unwrap();
        let err = validate_record(&schema, &record(json!({"id": "a", "vector": [0.1, 0.2]})))
            .unwrap_err();
        assert!(err.to_string().contains("expects 3 dimensions, got 2"));

        let ok = validate_record(
            &schema,
            &record(json!({"id": "a", "vector": [0.1, 0.2, 0.3]})),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_dimensions_not_enforced_on_defaults() {
        // A declared dimensionality constrains what callers supply; the
        // schema's own default fills verbatim.
        let schema: IndexSchema = serde_json::from_str(
            r#"{"vector": {"type": "collection", "default": [], "dimensions": 3}}"#,
        )
        .unwrap();
        let normalized = validate_record(&schema, &Record::new()).unwrap();
        assert_eq!(normalized.get("vector"), Some(&json!([])));
    }

    #[test]
    fn test_undeclared_keys_dropped() {
        let normalized = validate_record(
            &schema(),
            &record(json!({"id": "a", "extra": "ignored"})),
        )
        .unwrap();
        assert!(!normalized.contains_key("extra"));
        assert_eq!(normalized.len(), 3);
    }

    #[test]
    fn test_vector_round_trip_unchanged() {
        let supplied = json!([0.5, 0.25, 0.125, 0.0625]);
        let normalized = validate_record(
            &schema(),
            &record(json!({"id": "a", "vector": supplied.clone()})),
        )
        .unwrap();
        assert_eq!(normalized.get("vector"), Some(&supplied));
    }

    // ==================== document_body ====================

    #[test]
    fn test_document_body_carries_action_and_fields() {
        let normalized = validate_record(&schema(), &record(json!({"id": "a"}))).unwrap();
        let body = document_body(&normalized, SearchAction::Upload);
        assert_eq!(body.get("@search.action"), Some(&json!("upload")));
        assert_eq!(body.get("id"), Some(&json!("a")));
        assert_eq!(body.get("content"), Some(&json!("")));
        assert_eq!(body.get("vector"), Some(&json!([])));
    }

    #[test]
    fn test_document_body_merge_action() {
        let normalized = validate_record(&schema(), &record(json!({"id": "a"}))).unwrap();
        let body = document_body(&normalized, SearchAction::MergeOrUpload);
        assert_eq!(body.get("@search.action"), Some(&json!("mergeOrUpload")));
    }
}
